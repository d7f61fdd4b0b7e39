//! USB Device subsystem - presents the keyboard to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. One HID interface carries every report; the report id
//! byte tells key (1), media (2) and system (3) reports apart.
//!
//! `embassy-usb` answers GET/SET_PROTOCOL itself and only accepts the
//! report protocol, so a bus reset is what brings the engine back to it.

pub mod descriptor;
pub mod hid_device;
