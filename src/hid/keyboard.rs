//! USB HID keyboard reports - report-protocol and boot-protocol layouts.
//!
//! Report protocol (8 bytes, report id 1):
//! ```text
//! Byte 0: Report ID (0x01)
//! Byte 1: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 2-7: Up to 6 simultaneous key usages
//! ```
//!
//! Boot protocol (8 bytes, no report id):
//! ```text
//! Byte 0: Modifier keys
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key usages
//! ```

use super::usage::KeyUsage;

/// Keyboard report size in bytes (both layouts).
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Number of key slots in a keyboard report.
pub const KEY_SLOTS: usize = 6;

/// Report id of the keyboard report in report protocol.
pub const KEY_REPORT_ID: u8 = 1;

/// Live keyboard state as sent in report protocol.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Up to 6 simultaneously pressed keys, `Reserved` when unused.
    pub keys: [KeyUsage; KEY_SLOTS],
}

impl KeyReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            keys: [KeyUsage::Reserved; KEY_SLOTS],
        }
    }

    /// Returns `true` if no modifier is held and every slot is free.
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keys.iter().all(|&k| k == KeyUsage::Reserved)
    }

    /// Release everything.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Overwrite all six slots with the same usage (error reporting).
    pub fn fill(&mut self, usage: KeyUsage) {
        self.keys = [usage; KEY_SLOTS];
    }

    pub fn contains(&self, usage: KeyUsage) -> bool {
        self.keys.contains(&usage)
    }

    /// Put `usage` into the first free slot. Returns `false` if all six
    /// slots are taken.
    pub fn insert(&mut self, usage: KeyUsage) -> bool {
        match self.keys.iter_mut().find(|k| **k == KeyUsage::Reserved) {
            Some(slot) => {
                *slot = usage;
                true
            }
            None => false,
        }
    }

    /// Free the slot holding `usage`. Returns `false` if it was not held.
    pub fn remove(&mut self, usage: KeyUsage) -> bool {
        match self.keys.iter_mut().find(|k| **k == usage) {
            Some(slot) => {
                *slot = KeyUsage::Reserved;
                true
            }
            None => false,
        }
    }

    /// Serialise into a byte slice for USB HID transmission.
    /// Returns the number of bytes written (always 8).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = KEY_REPORT_ID;
        buf[1] = self.modifier;
        for (dst, key) in buf[2..8].iter_mut().zip(self.keys.iter()) {
            *dst = key.as_byte();
        }
        KEYBOARD_REPORT_SIZE
    }
}

/// Standard USB HID boot-protocol keyboard report.
///
/// Kept as a mirror of [`KeyReport`] and refreshed right before it is
/// transmitted in boot protocol.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte, always 0x00.
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; KEY_SLOTS],
}

impl BootReport {
    /// Copy modifier byte and slot table from the live report.
    pub fn mirror(&mut self, live: &KeyReport) {
        self.modifier = live.modifier;
        self.reserved = 0;
        for (dst, key) in self.keycodes.iter_mut().zip(live.keys.iter()) {
            *dst = key.as_byte();
        }
    }

    /// Serialise into a byte slice for USB HID transmission.
    /// Returns the number of bytes written (always 8).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }
}
