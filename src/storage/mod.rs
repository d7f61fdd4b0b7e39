//! Byte-addressed persistent storage for the key map and macros.
//!
//! The engine sees an EEPROM-like address space ([`Eeprom`]). On target the
//! space is a RAM image ([`RamEeprom`]) that is loaded from and flushed to
//! internal flash by [`flash`]; tests use the same image directly.

#[cfg(feature = "embedded")]
pub mod flash;
pub mod layout;

use crate::error::Error;

/// Value of a cell that was never written.
pub const ERASED: u8 = 0xFF;

/// Byte-addressed non-volatile memory.
pub trait Eeprom {
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), Error>;

    /// Write `data` at `addr`, skipping cells that already hold the value.
    fn update(&mut self, addr: usize, data: &[u8]) -> Result<(), Error>;

    fn read_byte(&mut self, addr: usize) -> Result<u8, Error> {
        let mut byte = [0u8];
        self.read(addr, &mut byte)?;
        Ok(byte[0])
    }

    fn update_byte(&mut self, addr: usize, value: u8) -> Result<(), Error> {
        self.update(addr, &[value])
    }
}

impl<T: Eeprom + ?Sized> Eeprom for &mut T {
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), Error> {
        (**self).read(addr, buf)
    }

    fn update(&mut self, addr: usize, data: &[u8]) -> Result<(), Error> {
        (**self).update(addr, data)
    }
}

/// EEPROM image held in RAM, with a flag recording unsaved changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RamEeprom<const N: usize> {
    cells: [u8; N],
    dirty: bool,
}

/// The image that backs the persisted configuration.
pub type ConfigImage = RamEeprom<{ layout::IMAGE_SIZE }>;

impl<const N: usize> RamEeprom<N> {
    /// A blank (erased) image.
    pub const fn new() -> Self {
        Self {
            cells: [ERASED; N],
            dirty: false,
        }
    }

    /// Image initialised from previously persisted bytes. Missing trailing
    /// bytes read as erased; extra bytes are ignored.
    pub fn from_image(bytes: &[u8]) -> Self {
        let mut image = Self::new();
        let len = bytes.len().min(N);
        image.cells[..len].copy_from_slice(&bytes[..len]);
        image
    }

    pub fn image(&self) -> &[u8; N] {
        &self.cells
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return whether the image changed since the last call and reset the flag.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    fn range(addr: usize, len: usize) -> Result<core::ops::Range<usize>, Error> {
        let end = addr.checked_add(len).ok_or(Error::Storage)?;
        if end > N {
            return Err(Error::Storage);
        }
        Ok(addr..end)
    }
}

impl<const N: usize> Default for RamEeprom<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Eeprom for RamEeprom<N> {
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), Error> {
        let range = Self::range(addr, buf.len())?;
        buf.copy_from_slice(&self.cells[range]);
        Ok(())
    }

    fn update(&mut self, addr: usize, data: &[u8]) -> Result<(), Error> {
        let range = Self::range(addr, data.len())?;
        let cells = &mut self.cells[range];
        if cells != data {
            cells.copy_from_slice(data);
            self.dirty = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_reads_erased() {
        let mut rom = RamEeprom::<16>::new();
        let mut buf = [0u8; 4];
        rom.read(12, &mut buf).unwrap();
        assert_eq!(buf, [ERASED; 4]);
        assert!(!rom.is_dirty());
    }

    #[test]
    fn update_marks_dirty_only_on_change() {
        let mut rom = RamEeprom::<16>::new();
        rom.update(0, &[ERASED, ERASED]).unwrap();
        assert!(!rom.take_dirty());

        rom.update_byte(3, 7).unwrap();
        assert_eq!(rom.read_byte(3).unwrap(), 7);
        assert!(rom.take_dirty());
        assert!(!rom.take_dirty());
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let mut rom = RamEeprom::<16>::new();
        assert_eq!(rom.update(15, &[1, 2]), Err(Error::Storage));
        assert_eq!(rom.read_byte(16), Err(Error::Storage));
        assert_eq!(rom.read(usize::MAX, &mut [0u8; 2]), Err(Error::Storage));
        assert_eq!(rom, RamEeprom::<16>::new());
    }

    #[test]
    fn from_image_pads_with_erased() {
        let rom = RamEeprom::<4>::from_image(&[1, 2]);
        assert_eq!(rom.image(), &[1, 2, ERASED, ERASED]);
        assert!(!rom.is_dirty());
    }
}
