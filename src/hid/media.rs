//! Media and system-control reports.
//!
//! Both are 2 bytes on the wire: the report id followed by a bit mask.
//!
//! Media mask: bit 0 = Mute, bit 1 = Volume Up, bit 2 = Volume Down.
//! System mask: bit 0 = Power, bit 1 = Sleep.

/// Media / system report size in bytes (report id + mask).
pub const MASK_REPORT_SIZE: usize = 2;

/// Report id of the media report.
pub const MEDIA_REPORT_ID: u8 = 2;

/// Report id of the system-control report.
pub const SYSTEM_REPORT_ID: u8 = 3;

/// System mask bit for "power".
pub const SYSTEM_POWER: u8 = 0b01;

/// System mask bit for "sleep".
pub const SYSTEM_SLEEP: u8 = 0b10;

/// Media keys report, one bit per key in `Mute..=VolumeDown`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MediaReport {
    pub mask: u8,
}

impl MediaReport {
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        serialize_mask(MEDIA_REPORT_ID, self.mask, buf)
    }
}

/// System-control report. Power and sleep share one physical key, so at
/// most one bit is ever set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemReport {
    pub mask: u8,
}

impl SystemReport {
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        serialize_mask(SYSTEM_REPORT_ID, self.mask, buf)
    }
}

fn serialize_mask(report_id: u8, mask: u8, buf: &mut [u8]) -> usize {
    if buf.len() < MASK_REPORT_SIZE {
        return 0;
    }
    buf[0] = report_id;
    buf[1] = mask;
    MASK_REPORT_SIZE
}
