//! Byte layout of the persisted configuration image.
//!
//! ```text
//! 0x000        version
//! 0x001..0x080 key map overrides (one usage byte per scancode)
//! 0x080        macro 1 size, 0x081..0x100 data (127)
//! 0x100        macro 2 size, 0x101..0x180 data (127)
//! 0x180        macro 3 size, 0x181..0x1C0 data (63)
//! 0x1C0        macro 4 size, 0x1C1..0x200 data (63)
//! ```

use crate::config::{KEYMAP_LEN, MACRO_LARGE, MACRO_SMALL};

pub const VERSION_ADDR: usize = 0;
pub const KEYMAP_ADDR: usize = VERSION_ADDR + 1;

pub const MACRO1_ADDR: usize = KEYMAP_ADDR + KEYMAP_LEN;
pub const MACRO2_ADDR: usize = MACRO1_ADDR + 1 + MACRO_LARGE;
pub const MACRO3_ADDR: usize = MACRO2_ADDR + 1 + MACRO_LARGE;
pub const MACRO4_ADDR: usize = MACRO3_ADDR + 1 + MACRO_SMALL;

/// Total size of the image.
pub const IMAGE_SIZE: usize = MACRO4_ADDR + 1 + MACRO_SMALL;

const _: () = assert!(IMAGE_SIZE == 512);
