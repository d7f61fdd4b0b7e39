//! Keyboard engine: turns scanner bytes into HID reports and drives the
//! firmware's function modes (macros, remapping, morse, diagnostics).

pub mod engine;
pub mod keymap;
pub mod macros;
pub mod morse;
pub mod scancode;

#[cfg(test)]
mod tests;

pub use engine::Keyboard;

/// Engine operating mode. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Waiting for the scanner's self-test result.
    Reset,
    Normal,
    /// FN is held; the next make selects a function.
    Fn,
    /// Scanner self-test failed. Terminal until the device restarts.
    Error,
    /// Next byte is a layout id.
    Layout,
    /// Waiting for the key whose factory usage will be copied.
    KeySwapCapture1,
    /// Waiting for the key that receives it.
    KeySwapCapture2,
    MacroRecord,
    /// Waiting for the slot key to store the recording in.
    MacroSave,
    Morse,
}

/// Stack usage figures reported by the diagnostic probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackProbe {
    /// Bytes of stack never touched since boot.
    pub unused: u16,
    /// Low 16 bits of the current stack pointer.
    pub stack_pointer: u16,
}

/// Hardware services the engine needs besides the link and storage.
pub trait Board {
    /// Busy-wait. Must keep the watchdog fed and the scanner transmit
    /// path moving while it waits.
    fn delay_ms(&mut self, ms: u32);

    /// Switch the scanner's supply.
    fn scanner_power(&mut self, _on: bool) {}

    fn stack_probe(&mut self) -> StackProbe;
}

/// Scanner LED bits.
pub mod led {
    pub const NUM_LOCK: u8 = 0x01;
    pub const COMPOSE: u8 = 0x02;
    pub const SCROLL_LOCK: u8 = 0x04;
    pub const CAPS_LOCK: u8 = 0x08;

    /// Translate the host's HID LED byte (bit 0 num lock, bit 1 caps lock,
    /// bit 2 scroll lock, bit 3 compose) into scanner LED bits.
    pub fn from_host(host: u8) -> u8 {
        const MAP: [(u8, u8); 4] = [
            (0x01, NUM_LOCK),
            (0x02, CAPS_LOCK),
            (0x04, SCROLL_LOCK),
            (0x08, COMPOSE),
        ];
        MAP.iter()
            .filter(|(host_bit, _)| host & host_bit != 0)
            .fold(0, |leds, (_, bit)| leds | bit)
    }
}
