//! HID report model: the four report layouts plus the press/release logic
//! that keeps them in sync with the keys the scanner reports.

pub mod idle;
pub mod keyboard;
pub mod media;
pub mod usage;


use crate::config::POWER_SHIFT_MASK;
use keyboard::{BootReport, KeyReport, KEYBOARD_REPORT_SIZE, KEY_REPORT_ID};
use media::{MediaReport, SystemReport, SYSTEM_POWER, SYSTEM_SLEEP};
use usage::KeyUsage;

/// Largest report on the wire.
pub const MAX_REPORT_SIZE: usize = KEYBOARD_REPORT_SIZE;

/// Which report a change affects. The discriminant is the HID report id
/// (boot protocol has none, and uses 0 here).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReportKind {
    Boot = 0,
    Key = 1,
    Media = 2,
    System = 3,
}

impl ReportKind {
    pub fn from_report_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(ReportKind::Boot),
            1 => Some(ReportKind::Key),
            2 => Some(ReportKind::Media),
            3 => Some(ReportKind::System),
            _ => None,
        }
    }

    pub const fn report_id(self) -> u8 {
        self as u8
    }

    /// Bytes on the wire for this report kind.
    pub const fn wire_len(self) -> usize {
        match self {
            ReportKind::Boot | ReportKind::Key => KEYBOARD_REPORT_SIZE,
            ReportKind::Media | ReportKind::System => media::MASK_REPORT_SIZE,
        }
    }
}

/// HID protocol selected by the host (GET/SET_PROTOCOL values).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Protocol {
    Boot = 0,
    #[default]
    Report = 1,
}

impl Protocol {
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Protocol::Boot),
            1 => Some(Protocol::Report),
            _ => None,
        }
    }
}

/// Whether any key is held and whether the slot table overflowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyState {
    #[default]
    Clear,
    InUse,
    Rollover,
}

/// A report snapshot queued for transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutboundReport {
    pub kind: ReportKind,
    len: u8,
    bytes: [u8; MAX_REPORT_SIZE],
}

impl OutboundReport {
    pub fn new(kind: ReportKind, data: &[u8]) -> Self {
        let len = data.len().min(MAX_REPORT_SIZE);
        let mut bytes = [0u8; MAX_REPORT_SIZE];
        bytes[..len].copy_from_slice(&data[..len]);
        Self {
            kind,
            len: len as u8,
            bytes,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// Extract the host LED bitmask from a SET_REPORT(Output) payload.
///
/// Boot protocol sends the bare bitmask; report protocol prefixes the
/// keyboard report id.
pub fn parse_led_output(data: &[u8]) -> Option<u8> {
    match data {
        [leds] => Some(*leds),
        [KEY_REPORT_ID, leds] => Some(*leds),
        _ => None,
    }
}

/// The four live reports plus the key-slot state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reports {
    key: KeyReport,
    boot: BootReport,
    media: MediaReport,
    system: SystemReport,
    state: KeyState,
}

impl Reports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a key press. Returns the report that changed, or `None` when
    /// the key is inert (reserved, an error id, already held, or ignored
    /// during rollover).
    pub fn press(&mut self, key: KeyUsage) -> Option<ReportKind> {
        if let Some(bit) = key.modifier_bit() {
            self.key.modifier |= bit;
            if self.state == KeyState::Clear {
                self.state = KeyState::InUse;
            }
            return Some(ReportKind::Key);
        }
        if let Some(bit) = key.media_bit() {
            self.media.mask |= bit;
            return Some(ReportKind::Media);
        }
        if key == KeyUsage::Power {
            // One keycap, two functions: overwrite rather than OR.
            self.system.mask = if self.key.modifier & POWER_SHIFT_MASK != 0 {
                SYSTEM_POWER
            } else {
                SYSTEM_SLEEP
            };
            return Some(ReportKind::System);
        }
        if !key.is_slot_key() || self.state == KeyState::Rollover || self.key.contains(key) {
            return None;
        }

        if self.key.insert(key) {
            self.state = KeyState::InUse;
        } else {
            self.state = KeyState::Rollover;
            self.key.fill(KeyUsage::ErrorRollOver);
        }
        Some(ReportKind::Key)
    }

    /// Apply a key release. Returns the report that changed, or `None`.
    /// Releases never stop the click; only the IDLE that ends a rollover does.
    pub fn release(&mut self, key: KeyUsage) -> Option<ReportKind> {
        if let Some(bit) = key.modifier_bit() {
            self.key.modifier &= !bit;
            self.settle();
            return Some(ReportKind::Key);
        }
        if let Some(bit) = key.media_bit() {
            self.media.mask &= !bit;
            return Some(ReportKind::Media);
        }
        if key == KeyUsage::Power {
            // Shift may already be up, so drop both functions.
            self.system.mask = 0;
            return Some(ReportKind::System);
        }
        if !key.is_slot_key() || self.state == KeyState::Rollover {
            return None;
        }

        if self.key.remove(key) {
            self.settle();
            Some(ReportKind::Key)
        } else {
            None
        }
    }

    fn settle(&mut self) {
        if self.state == KeyState::InUse && self.key.is_empty() {
            self.state = KeyState::Clear;
        }
    }

    /// Zero the modifier byte and every slot, and forget rollover.
    pub fn clear(&mut self) {
        self.key.clear();
        self.state = KeyState::Clear;
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// Fill every slot with an error usage (scanner self-test failure).
    pub fn fill_error(&mut self, usage: KeyUsage) {
        self.key.fill(usage);
        self.state = KeyState::InUse;
    }

    /// Overwrite the modifier byte (diagnostic reports).
    pub fn set_modifier(&mut self, modifier: u8) {
        self.key.modifier = modifier;
    }

    /// Refresh the boot-protocol mirror from the live key report.
    pub fn mirror_to_boot(&mut self) {
        self.boot.mirror(&self.key);
    }

    pub fn state(&self) -> KeyState {
        self.state
    }

    pub fn key(&self) -> &KeyReport {
        &self.key
    }

    pub fn boot(&self) -> &BootReport {
        &self.boot
    }

    pub fn media(&self) -> &MediaReport {
        &self.media
    }

    pub fn system(&self) -> &SystemReport {
        &self.system
    }

    /// Serialise the report of `kind` as the host expects it under
    /// `protocol`. Boot protocol only exposes the keyboard, always in the
    /// boot layout.
    pub fn serialize(&mut self, kind: ReportKind, protocol: Protocol, buf: &mut [u8]) -> usize {
        match (protocol, kind) {
            (Protocol::Boot, _) | (_, ReportKind::Boot) => {
                self.mirror_to_boot();
                self.boot.serialize(buf)
            }
            (_, ReportKind::Key) => self.key.serialize(buf),
            (_, ReportKind::Media) => self.media.serialize(buf),
            (_, ReportKind::System) => self.system.serialize(buf),
        }
    }
}
