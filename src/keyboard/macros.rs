//! Persisted macro slots.
//!
//! A macro is the raw scanner byte sequence (scancode plus break bit) that
//! was typed while recording. Slots 1 and 2 hold up to 127 bytes, slots 3
//! and 4 up to 63.

use heapless::Vec;

use crate::config::{MACRO_LARGE, MACRO_RECORD_CAPACITY, MACRO_SMALL};
use crate::error::Error;
use crate::storage::layout::{MACRO1_ADDR, MACRO2_ADDR, MACRO3_ADDR, MACRO4_ADDR};
use crate::storage::Eeprom;

use super::scancode;

/// Recording / playback buffer.
pub type MacroBuffer = Vec<u8, MACRO_RECORD_CAPACITY>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroSlot {
    Slot1,
    Slot2,
    Slot3,
    Slot4,
}

impl MacroSlot {
    pub const ALL: [MacroSlot; 4] = [
        MacroSlot::Slot1,
        MacroSlot::Slot2,
        MacroSlot::Slot3,
        MacroSlot::Slot4,
    ];

    /// Slot selected by a key: digits 1-4 or F9-F12.
    pub fn from_scancode(scancode: u8) -> Option<Self> {
        match scancode {
            scancode::N1 | scancode::F9 => Some(MacroSlot::Slot1),
            scancode::N2 | scancode::F10 => Some(MacroSlot::Slot2),
            scancode::N3 | scancode::F11 => Some(MacroSlot::Slot3),
            scancode::N4 | scancode::F12 => Some(MacroSlot::Slot4),
            _ => None,
        }
    }

    pub const fn capacity(self) -> usize {
        match self {
            MacroSlot::Slot1 | MacroSlot::Slot2 => MACRO_LARGE,
            MacroSlot::Slot3 | MacroSlot::Slot4 => MACRO_SMALL,
        }
    }

    /// Address of the size byte; the data follows it.
    const fn size_addr(self) -> usize {
        match self {
            MacroSlot::Slot1 => MACRO1_ADDR,
            MacroSlot::Slot2 => MACRO2_ADDR,
            MacroSlot::Slot3 => MACRO3_ADDR,
            MacroSlot::Slot4 => MACRO4_ADDR,
        }
    }

    const fn data_addr(self) -> usize {
        self.size_addr() + 1
    }

    /// Persist `data`, then its size. Nothing is written if it does not fit.
    pub fn save(self, rom: &mut impl Eeprom, data: &[u8]) -> Result<(), Error> {
        let capacity = self.capacity();
        if data.len() > capacity {
            return Err(Error::MacroTooLarge {
                size: data.len(),
                capacity,
            });
        }
        rom.update(self.data_addr(), data)?;
        rom.update_byte(self.size_addr(), data.len() as u8)?;
        info!("Saved {} byte macro to {}", data.len(), self);
        Ok(())
    }

    /// Read the slot into `buf`. A stored size larger than the slot is
    /// treated as the slot's capacity.
    pub fn load(self, rom: &mut impl Eeprom, buf: &mut MacroBuffer) -> Result<(), Error> {
        let size = usize::from(rom.read_byte(self.size_addr())?).min(self.capacity());
        buf.clear();
        // Capacity of every slot is within the buffer's.
        let _ = buf.resize(size, 0);
        rom.read(self.data_addr(), buf)?;
        debug!("Loaded {} byte macro from {}", size, self);
        Ok(())
    }

    /// Empty every slot. Data bytes are left in place.
    pub fn clear_all(rom: &mut impl Eeprom) -> Result<(), Error> {
        for slot in Self::ALL {
            rom.update_byte(slot.size_addr(), 0)?;
        }
        Ok(())
    }
}
