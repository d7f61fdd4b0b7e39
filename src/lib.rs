//! scan2usb: USB HID host controller for a keyboard whose matrix is scanned
//! by a separate MCU on a serial link.
//!
//! The library holds everything that does not touch hardware (report model,
//! keyboard engine, key map and macro stores, link rings) so it can be
//! tested on the host:
//!
//! ```text
//! cargo test --lib
//! ```
//!
//! The nRF52840 glue (`usb`, `serial`, `board`, `storage::flash`) and the
//! firmware binary are only built with the `embedded` feature.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

// Host critical-section implementation for the shared rings.
#[cfg(test)]
use critical_section as _;

pub mod config;
pub mod error;
pub mod hid;
pub mod keyboard;
pub mod link;
pub mod storage;

#[cfg(feature = "embedded")]
pub mod board;
#[cfg(feature = "embedded")]
pub mod serial;
#[cfg(feature = "embedded")]
pub mod usb;

pub use error::Error;
