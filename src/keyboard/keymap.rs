//! Scancode to usage translation with persisted user overrides.

use crate::config::{KEYMAP_LEN, KEYMAP_VERSION};
use crate::error::Error;
use crate::hid::usage::KeyUsage as K;
use crate::storage::layout::{KEYMAP_ADDR, VERSION_ADDR};
use crate::storage::Eeprom;

use super::macros::MacroSlot;

/// Factory layout of the Sun-style keyboard, indexed by scancode.
#[rustfmt::skip]
pub const DEFAULT_KEYMAP: [K; KEYMAP_LEN] = [
    // 0x00
    K::Reserved, K::Stop, K::VolumeDown, K::Again, K::VolumeUp, K::F1, K::F2, K::F10,
    K::F3, K::F11, K::F4, K::F12, K::F5, K::RightAlt, K::F6, K::Escape,
    // 0x10
    K::F7, K::F8, K::F9, K::LeftAlt, K::Up, K::Pause, K::PrintScreen, K::ScrollLock,
    K::Left, K::Reserved, K::Undo, K::Down, K::Right, K::Grave, K::Num1, K::Num2,
    // 0x20
    K::Num3, K::Num4, K::Num5, K::Num6, K::Num7, K::Num8, K::Num9, K::Num0,
    K::Minus, K::Equal, K::Reserved, K::Backspace, K::Insert, K::Mute, K::KeypadSlash, K::KeypadAsterisk,
    // 0x30
    K::Power, K::Reserved, K::KeypadPeriod, K::Copy, K::Home, K::Tab, K::Q, K::W,
    K::E, K::R, K::T, K::Y, K::U, K::I, K::O, K::P,
    // 0x40
    K::LeftBracket, K::RightBracket, K::Delete, K::Compose, K::Keypad7, K::Keypad8, K::Keypad9, K::KeypadMinus,
    K::Reserved, K::Paste, K::End, K::Reserved, K::LeftCtrl, K::A, K::S, K::D,
    // 0x50
    K::F, K::G, K::H, K::J, K::K, K::L, K::Semicolon, K::Quote,
    K::Backslash, K::Enter, K::Left, K::Keypad4, K::Keypad5, K::Keypad6, K::Keypad0, K::Find,
    // 0x60
    K::PageUp, K::Cut, K::NumLock, K::LeftShift, K::Z, K::X, K::C, K::V,
    K::B, K::N, K::M, K::Comma, K::Period, K::Slash, K::RightShift, K::KeypadEnter,
    // 0x70
    K::Keypad1, K::Keypad2, K::Keypad3, K::Reserved, K::Reserved, K::Reserved, K::Help, K::CapsLock,
    K::LeftGui, K::Space, K::RightGui, K::PageDown, K::Reserved, K::KeypadPlus, K::Reserved,
];

/// Factory usage of `scancode`, ignoring overrides.
pub fn default_usage(scancode: u8) -> K {
    DEFAULT_KEYMAP
        .get(usize::from(scancode))
        .copied()
        .unwrap_or(K::Reserved)
}

/// In-RAM mirror of the persisted override table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMap {
    entries: [K; KEYMAP_LEN],
}

impl KeyMap {
    pub const fn new() -> Self {
        Self {
            entries: DEFAULT_KEYMAP,
        }
    }

    /// Usage assigned to `scancode`; `Reserved` for anything out of range.
    pub fn lookup(&self, scancode: u8) -> K {
        self.entries
            .get(usize::from(scancode))
            .copied()
            .unwrap_or(K::Reserved)
    }

    /// Load the overrides, resetting everything to defaults when the stored
    /// version does not match. Returns `true` if a reset happened.
    pub fn check_and_load(&mut self, rom: &mut impl Eeprom) -> Result<bool, Error> {
        let version = rom.read_byte(VERSION_ADDR)?;
        if version != KEYMAP_VERSION {
            warn!("Key map version {} != {}, restoring defaults", version, KEYMAP_VERSION);
            self.reset_to_default(rom)?;
            return Ok(true);
        }

        let mut raw = [0u8; KEYMAP_LEN];
        rom.read(KEYMAP_ADDR, &mut raw)?;
        for (entry, byte) in self.entries.iter_mut().zip(raw) {
            *entry = K::from_byte(byte).unwrap_or(K::Reserved);
        }
        debug!("Key map loaded");
        Ok(false)
    }

    /// Restore the factory table and erase all macros.
    ///
    /// The version byte is invalidated first and written back last, so an
    /// interrupted reset is redone on the next boot.
    pub fn reset_to_default(&mut self, rom: &mut impl Eeprom) -> Result<(), Error> {
        rom.update_byte(VERSION_ADDR, !KEYMAP_VERSION)?;

        let mut raw = [0u8; KEYMAP_LEN];
        for (byte, usage) in raw.iter_mut().zip(DEFAULT_KEYMAP) {
            *byte = usage.as_byte();
        }
        rom.update(KEYMAP_ADDR, &raw)?;
        self.entries = DEFAULT_KEYMAP;

        rom.update_byte(VERSION_ADDR, KEYMAP_VERSION)?;
        MacroSlot::clear_all(rom)?;
        info!("Key map and macros reset to defaults");
        Ok(())
    }

    /// Assign `usage` to `scancode` and persist it.
    pub fn remap(&mut self, rom: &mut impl Eeprom, scancode: u8, usage: K) -> Result<(), Error> {
        let index = usize::from(scancode);
        let Some(entry) = self.entries.get_mut(index) else {
            return Ok(());
        };
        rom.update_byte(KEYMAP_ADDR + index, usage.as_byte())?;
        *entry = usage;
        info!("Remapped scancode {=u8:#x} to {}", scancode, usage);
        Ok(())
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::scancode;
    use crate::storage::layout::MACRO3_ADDR;
    use crate::storage::ConfigImage;

    #[test]
    fn default_table_spot_checks() {
        assert_eq!(default_usage(0x4D), K::A);
        assert_eq!(default_usage(0x79), K::Space);
        assert_eq!(default_usage(scancode::FN), K::Reserved);
        assert_eq!(default_usage(scancode::HELP), K::Help);
        assert_eq!(default_usage(0x7F), K::Reserved);
        assert_eq!(default_usage(0xFF), K::Reserved);
    }

    #[test]
    fn blank_image_is_reset_and_macros_cleared() {
        let mut rom = ConfigImage::new();
        let mut map = KeyMap::new();
        assert!(map.check_and_load(&mut rom).unwrap());

        assert_eq!(rom.read_byte(VERSION_ADDR).unwrap(), KEYMAP_VERSION);
        assert_eq!(rom.read_byte(KEYMAP_ADDR + 0x4D).unwrap(), K::A.as_byte());
        assert_eq!(rom.read_byte(MACRO3_ADDR).unwrap(), 0);
        assert!(!map.check_and_load(&mut rom).unwrap());
    }

    #[test]
    fn remap_survives_reload() {
        let mut rom = ConfigImage::new();
        let mut map = KeyMap::new();
        map.check_and_load(&mut rom).unwrap();
        map.remap(&mut rom, 0x4D, K::Z).unwrap();
        assert_eq!(map.lookup(0x4D), K::Z);

        let mut fresh = KeyMap::new();
        assert!(!fresh.check_and_load(&mut rom).unwrap());
        assert_eq!(fresh.lookup(0x4D), K::Z);
        assert_eq!(fresh.lookup(0x4E), K::S);
    }

    #[test]
    fn garbage_override_reads_as_reserved() {
        let mut rom = ConfigImage::new();
        let mut map = KeyMap::new();
        map.check_and_load(&mut rom).unwrap();
        rom.update_byte(KEYMAP_ADDR + 5, 0xD0).unwrap();

        map.check_and_load(&mut rom).unwrap();
        assert_eq!(map.lookup(5), K::Reserved);
    }

    #[test]
    fn out_of_range_lookup_and_remap_are_inert() {
        let mut rom = ConfigImage::new();
        let mut map = KeyMap::new();
        assert_eq!(map.lookup(0x7F), K::Reserved);
        map.remap(&mut rom, 0x90, K::A).unwrap();
        assert!(!rom.is_dirty());
    }
}
