//! Application-wide constants and compile-time configuration.
//!
//! Protocol timings, store capacities, USB identity and hardware pin
//! assignments live here so they can be tuned in one place.

// Scanner link

/// Baud rate of the serial link to the scanner MCU.
pub const SCANNER_BAUD: u32 = 1200;

/// Capacity of each transport ring buffer (power of two, one slot stays
/// empty so the usable depth is `LINK_RING_CAPACITY - 1`).
pub const LINK_RING_CAPACITY: usize = 8;

/// UARTE receive buffer, filled by the interrupt while the engine is busy
/// (a morse letter blocks for over a second; 1200 baud is 120 bytes/s).
pub const UART_RX_BUFFER: usize = 256;

/// UARTE transmit buffer, drained by the interrupt.
pub const UART_TX_BUFFER: usize = 32;

// Persisted configuration

/// Version marker of the persisted key map. Bump when the default table
/// or the storage layout changes; a mismatch resets everything to defaults.
pub const KEYMAP_VERSION: u8 = 2;

/// Number of remappable scancodes (0x00..=0x7E, 0x7F is IDLE).
pub const KEYMAP_LEN: usize = 0x7F;

/// Capacity of macro slots 1 and 2.
pub const MACRO_LARGE: usize = 127;

/// Capacity of macro slots 3 and 4.
pub const MACRO_SMALL: usize = 63;

/// Capacity of the in-RAM recording buffer (the largest slot).
pub const MACRO_RECORD_CAPACITY: usize = MACRO_LARGE;

// Feedback timings (ms)

/// Confirmation beep (remap done, macro saved).
pub const BEEP_SHORT_MS: u32 = 50;

/// Mode-entry / warning beep.
pub const BEEP_LONG_MS: u32 = 150;

/// Pause between the two beeps of a failed macro save.
pub const BEEP_FAIL_PAUSE_MS: u32 = 50;

pub const MORSE_DIT_MS: u32 = 75;
pub const MORSE_DAH_MS: u32 = 150;
pub const MORSE_SYMBOL_GAP_MS: u32 = 75;
pub const MORSE_LETTER_GAP_MS: u32 = 150;

// Report model

/// Modifier bits that turn the shared POWER keycap into "power" instead of
/// "sleep": Left Shift (bit 1) and Right Shift (bit 5).
pub const POWER_SHIFT_MASK: u8 = 0b0010_0010;

/// Depth of the outbound report FIFO. Sized for a full-length macro
/// playback plus its trailing all-clear report.
pub const OUTBOX_DEPTH: usize = MACRO_LARGE + 9;

/// Period of the HID idle-rate tick (ms). HID idle rates count in 4 ms units.
pub const IDLE_TICK_MS: u64 = 4;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "scan2usb";
pub const USB_PRODUCT: &str = "Serial Keyboard to USB HID";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 10;

// Watchdog

/// Watchdog timeout (ms). The main loop and every busy-wait pet it.
pub const WATCHDOG_TIMEOUT_MS: u32 = 500;

// GPIO pin assignments (nRF52840-DK defaults)
//
// Logical names only; the concrete `embassy_nrf::peripherals::*` are picked
// in `main.rs`. Adjust for your custom PCB.
//
//   Scanner RXD        → P0.08
//   Scanner TXD        → P0.06
//   Scanner power gate → P0.13

// Flash-backed persisted image

/// Flash page index where the persisted image starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for the persisted image.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;
