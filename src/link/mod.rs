//! Serial link to the scanner MCU.
//!
//! The scanner reports one byte per key transition (`scancode | 0x80` on
//! release) plus a handful of reserved control bytes, and accepts single
//! byte commands, one of which (`LedStatus`) carries a payload byte.

pub mod ring;

use crate::config::LINK_RING_CAPACITY;
use crate::error::Error;
use ring::SharedRing;

/// Commands sent to the scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Reset = 0x01,
    BellOn = 0x02,
    BellOff = 0x03,
    ClickOn = 0x0A,
    ClickOff = 0x0B,
    /// Followed by the device LED mask.
    LedStatus = 0x0E,
    Layout = 0x0F,
}

/// Reserved bytes received from the scanner.
pub mod response {
    /// No keys down.
    pub const IDLE: u8 = 0x7F;
    /// Followed by one layout byte.
    pub const LAYOUT: u8 = 0xFE;
    /// Scanner restarted; followed by `RESET_OK` or `RESET_FAIL1 RESET_FAIL2`.
    pub const RESET: u8 = 0xFF;
    pub const RESET_OK: u8 = 0x04;
    pub const RESET_FAIL1: u8 = 0x7E;
    pub const RESET_FAIL2: u8 = 0x01;
}

/// Release flag on a scancode byte.
pub const BREAK_BIT: u8 = 0x80;

/// Scancode bits of a make/break byte.
pub const SCANCODE_MASK: u8 = 0x7F;

/// Byte-level access to the scanner transport.
pub trait ScannerLink {
    /// A received byte is waiting.
    fn byte_available(&self) -> bool;

    /// Take the oldest received byte.
    fn recv_byte(&mut self) -> Option<u8>;

    /// Queue one byte for transmission.
    fn send_byte(&mut self, byte: u8) -> Result<(), Error>;

    /// Queue two bytes so nothing else can be interleaved between them.
    fn send_pair(&mut self, first: u8, second: u8) -> Result<(), Error>;

    fn command(&mut self, command: Command) -> Result<(), Error> {
        self.send_byte(command as u8)
    }

    fn command_with(&mut self, command: Command, payload: u8) -> Result<(), Error> {
        self.send_pair(command as u8, payload)
    }
}

/// Ring pair shared with the UART interrupt side.
pub type LinkRing = SharedRing<LINK_RING_CAPACITY>;

/// [`ScannerLink`] over two interrupt-fed rings: `rx` is filled by the
/// receive interrupt, `tx` is drained by the transmit side.
pub struct IsrLink<'a> {
    rx: &'a LinkRing,
    tx: &'a LinkRing,
}

impl<'a> IsrLink<'a> {
    pub const fn new(rx: &'a LinkRing, tx: &'a LinkRing) -> Self {
        Self { rx, tx }
    }

    /// Transmit ring, for the side that moves bytes onto the wire.
    pub fn tx(&self) -> &'a LinkRing {
        self.tx
    }
}

impl ScannerLink for IsrLink<'_> {
    fn byte_available(&self) -> bool {
        !self.rx.is_empty()
    }

    fn recv_byte(&mut self) -> Option<u8> {
        self.rx.pop()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), Error> {
        if self.tx.push(byte) {
            Ok(())
        } else {
            Err(Error::LinkBusy)
        }
    }

    fn send_pair(&mut self, first: u8, second: u8) -> Result<(), Error> {
        if self.tx.push_pair(first, second) {
            Ok(())
        } else {
            Err(Error::LinkBusy)
        }
    }
}
