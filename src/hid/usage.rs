//! Keyboard/Keypad usage page (0x07) ids the firmware can emit.
//!
//! Ordering matters: `LeftCtrl..=RightGui` is the contiguous modifier
//! range, `Mute..=VolumeDown` the contiguous media range, and `Power` is the
//! one system-control key.

/// HID keyboard usage id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum KeyUsage {
    #[default]
    Reserved = 0x00,
    ErrorRollOver = 0x01,
    PostFail = 0x02,
    ErrorUndefined = 0x03,
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,
    Num1 = 0x1E,
    Num2 = 0x1F,
    Num3 = 0x20,
    Num4 = 0x21,
    Num5 = 0x22,
    Num6 = 0x23,
    Num7 = 0x24,
    Num8 = 0x25,
    Num9 = 0x26,
    Num0 = 0x27,
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    LeftBracket = 0x2F,
    RightBracket = 0x30,
    Backslash = 0x31,
    NonUsHash = 0x32,
    Semicolon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,
    NumLock = 0x53,
    KeypadSlash = 0x54,
    KeypadAsterisk = 0x55,
    KeypadMinus = 0x56,
    KeypadPlus = 0x57,
    KeypadEnter = 0x58,
    Keypad1 = 0x59,
    Keypad2 = 0x5A,
    Keypad3 = 0x5B,
    Keypad4 = 0x5C,
    Keypad5 = 0x5D,
    Keypad6 = 0x5E,
    Keypad7 = 0x5F,
    Keypad8 = 0x60,
    Keypad9 = 0x61,
    Keypad0 = 0x62,
    KeypadPeriod = 0x63,
    NonUsBackslash = 0x64,
    Compose = 0x65,
    Power = 0x66,
    KeypadEqual = 0x67,
    F13 = 0x68,
    F14 = 0x69,
    F15 = 0x6A,
    F16 = 0x6B,
    F17 = 0x6C,
    F18 = 0x6D,
    F19 = 0x6E,
    F20 = 0x6F,
    F21 = 0x70,
    F22 = 0x71,
    F23 = 0x72,
    F24 = 0x73,
    Execute = 0x74,
    Help = 0x75,
    Menu = 0x76,
    Select = 0x77,
    Stop = 0x78,
    Again = 0x79,
    Undo = 0x7A,
    Cut = 0x7B,
    Copy = 0x7C,
    Paste = 0x7D,
    Find = 0x7E,
    Mute = 0x7F,
    VolumeUp = 0x80,
    VolumeDown = 0x81,
    LeftCtrl = 0xE0,
    LeftShift = 0xE1,
    LeftAlt = 0xE2,
    LeftGui = 0xE3,
    RightCtrl = 0xE4,
    RightShift = 0xE5,
    RightAlt = 0xE6,
    RightGui = 0xE7,
}

impl KeyUsage {
    /// Decode a persisted or table byte. Ids the firmware never emits
    /// decode as `None`.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        let usage = match byte {
            0x00 => KeyUsage::Reserved,
            0x01 => KeyUsage::ErrorRollOver,
            0x02 => KeyUsage::PostFail,
            0x03 => KeyUsage::ErrorUndefined,
            0x04 => KeyUsage::A,
            0x05 => KeyUsage::B,
            0x06 => KeyUsage::C,
            0x07 => KeyUsage::D,
            0x08 => KeyUsage::E,
            0x09 => KeyUsage::F,
            0x0A => KeyUsage::G,
            0x0B => KeyUsage::H,
            0x0C => KeyUsage::I,
            0x0D => KeyUsage::J,
            0x0E => KeyUsage::K,
            0x0F => KeyUsage::L,
            0x10 => KeyUsage::M,
            0x11 => KeyUsage::N,
            0x12 => KeyUsage::O,
            0x13 => KeyUsage::P,
            0x14 => KeyUsage::Q,
            0x15 => KeyUsage::R,
            0x16 => KeyUsage::S,
            0x17 => KeyUsage::T,
            0x18 => KeyUsage::U,
            0x19 => KeyUsage::V,
            0x1A => KeyUsage::W,
            0x1B => KeyUsage::X,
            0x1C => KeyUsage::Y,
            0x1D => KeyUsage::Z,
            0x1E => KeyUsage::Num1,
            0x1F => KeyUsage::Num2,
            0x20 => KeyUsage::Num3,
            0x21 => KeyUsage::Num4,
            0x22 => KeyUsage::Num5,
            0x23 => KeyUsage::Num6,
            0x24 => KeyUsage::Num7,
            0x25 => KeyUsage::Num8,
            0x26 => KeyUsage::Num9,
            0x27 => KeyUsage::Num0,
            0x28 => KeyUsage::Enter,
            0x29 => KeyUsage::Escape,
            0x2A => KeyUsage::Backspace,
            0x2B => KeyUsage::Tab,
            0x2C => KeyUsage::Space,
            0x2D => KeyUsage::Minus,
            0x2E => KeyUsage::Equal,
            0x2F => KeyUsage::LeftBracket,
            0x30 => KeyUsage::RightBracket,
            0x31 => KeyUsage::Backslash,
            0x32 => KeyUsage::NonUsHash,
            0x33 => KeyUsage::Semicolon,
            0x34 => KeyUsage::Quote,
            0x35 => KeyUsage::Grave,
            0x36 => KeyUsage::Comma,
            0x37 => KeyUsage::Period,
            0x38 => KeyUsage::Slash,
            0x39 => KeyUsage::CapsLock,
            0x3A => KeyUsage::F1,
            0x3B => KeyUsage::F2,
            0x3C => KeyUsage::F3,
            0x3D => KeyUsage::F4,
            0x3E => KeyUsage::F5,
            0x3F => KeyUsage::F6,
            0x40 => KeyUsage::F7,
            0x41 => KeyUsage::F8,
            0x42 => KeyUsage::F9,
            0x43 => KeyUsage::F10,
            0x44 => KeyUsage::F11,
            0x45 => KeyUsage::F12,
            0x46 => KeyUsage::PrintScreen,
            0x47 => KeyUsage::ScrollLock,
            0x48 => KeyUsage::Pause,
            0x49 => KeyUsage::Insert,
            0x4A => KeyUsage::Home,
            0x4B => KeyUsage::PageUp,
            0x4C => KeyUsage::Delete,
            0x4D => KeyUsage::End,
            0x4E => KeyUsage::PageDown,
            0x4F => KeyUsage::Right,
            0x50 => KeyUsage::Left,
            0x51 => KeyUsage::Down,
            0x52 => KeyUsage::Up,
            0x53 => KeyUsage::NumLock,
            0x54 => KeyUsage::KeypadSlash,
            0x55 => KeyUsage::KeypadAsterisk,
            0x56 => KeyUsage::KeypadMinus,
            0x57 => KeyUsage::KeypadPlus,
            0x58 => KeyUsage::KeypadEnter,
            0x59 => KeyUsage::Keypad1,
            0x5A => KeyUsage::Keypad2,
            0x5B => KeyUsage::Keypad3,
            0x5C => KeyUsage::Keypad4,
            0x5D => KeyUsage::Keypad5,
            0x5E => KeyUsage::Keypad6,
            0x5F => KeyUsage::Keypad7,
            0x60 => KeyUsage::Keypad8,
            0x61 => KeyUsage::Keypad9,
            0x62 => KeyUsage::Keypad0,
            0x63 => KeyUsage::KeypadPeriod,
            0x64 => KeyUsage::NonUsBackslash,
            0x65 => KeyUsage::Compose,
            0x66 => KeyUsage::Power,
            0x67 => KeyUsage::KeypadEqual,
            0x68 => KeyUsage::F13,
            0x69 => KeyUsage::F14,
            0x6A => KeyUsage::F15,
            0x6B => KeyUsage::F16,
            0x6C => KeyUsage::F17,
            0x6D => KeyUsage::F18,
            0x6E => KeyUsage::F19,
            0x6F => KeyUsage::F20,
            0x70 => KeyUsage::F21,
            0x71 => KeyUsage::F22,
            0x72 => KeyUsage::F23,
            0x73 => KeyUsage::F24,
            0x74 => KeyUsage::Execute,
            0x75 => KeyUsage::Help,
            0x76 => KeyUsage::Menu,
            0x77 => KeyUsage::Select,
            0x78 => KeyUsage::Stop,
            0x79 => KeyUsage::Again,
            0x7A => KeyUsage::Undo,
            0x7B => KeyUsage::Cut,
            0x7C => KeyUsage::Copy,
            0x7D => KeyUsage::Paste,
            0x7E => KeyUsage::Find,
            0x7F => KeyUsage::Mute,
            0x80 => KeyUsage::VolumeUp,
            0x81 => KeyUsage::VolumeDown,
            0xE0 => KeyUsage::LeftCtrl,
            0xE1 => KeyUsage::LeftShift,
            0xE2 => KeyUsage::LeftAlt,
            0xE3 => KeyUsage::LeftGui,
            0xE4 => KeyUsage::RightCtrl,
            0xE5 => KeyUsage::RightShift,
            0xE6 => KeyUsage::RightAlt,
            0xE7 => KeyUsage::RightGui,
            _ => return None,
        };
        Some(usage)
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Bit of this key in the modifier byte, for `LeftCtrl..=RightGui`.
    pub fn modifier_bit(self) -> Option<u8> {
        if (KeyUsage::LeftCtrl..=KeyUsage::RightGui).contains(&self) {
            Some(1 << (self as u8 - KeyUsage::LeftCtrl as u8))
        } else {
            None
        }
    }

    /// Bit of this key in the media mask, for `Mute..=VolumeDown`.
    pub fn media_bit(self) -> Option<u8> {
        if (KeyUsage::Mute..=KeyUsage::VolumeDown).contains(&self) {
            Some(1 << (self as u8 - KeyUsage::Mute as u8))
        } else {
            None
        }
    }

    /// Keys that occupy one of the six slots of the key report.
    pub fn is_slot_key(self) -> bool {
        self >= KeyUsage::A && self < KeyUsage::Mute && self != KeyUsage::Power
    }
}
