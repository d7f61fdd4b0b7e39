//! Scanner positions of the keys with a firmware function.
//!
//! These are physical positions, so they keep their meaning whatever the
//! key map says.

pub const STOP: u8 = 0x01;
pub const AGAIN: u8 = 0x03;
pub const F10: u8 = 0x07;
pub const F11: u8 = 0x09;
pub const F12: u8 = 0x0B;
pub const ESCAPE: u8 = 0x0F;
pub const F9: u8 = 0x12;
pub const N1: u8 = 0x1E;
pub const N2: u8 = 0x1F;
pub const N3: u8 = 0x20;
pub const N4: u8 = 0x21;
pub const FN: u8 = 0x2A;
pub const INSERT: u8 = 0x2C;
pub const COPY: u8 = 0x33;
pub const PASTE: u8 = 0x49;
pub const CUT: u8 = 0x61;
pub const HELP: u8 = 0x76;

/// Last scancode position. Its break byte is the LAYOUT control code, so a
/// key at this position can be pressed but never released.
pub const LAYOUT_ALIAS: u8 = 0x7E;
