//! Unified error type for scan2usb.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for on-target logging.

use core::fmt;

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Macro store
    /// A recorded macro does not fit the selected slot; nothing was written.
    MacroTooLarge { size: usize, capacity: usize },

    // Scanner link
    /// Transmit ring has no room for the command.
    LinkBusy,

    // Storage
    /// Flash read/write/erase failed.
    Storage,

    // USB
    /// USB stack returned an error.
    Usb,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MacroTooLarge { size, capacity } => {
                write!(f, "macro of {size} bytes exceeds slot capacity {capacity}")
            }
            Error::LinkBusy => f.write_str("scanner link transmit buffer full"),
            Error::Storage => f.write_str("persistent storage failure"),
            Error::Usb => f.write_str("usb failure"),
        }
    }
}
