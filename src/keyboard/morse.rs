//! Morse code for letters and digits, played on the scanner's bell.

use crate::hid::usage::KeyUsage;

/// Packed codes for `A..=Z` then `1..=9, 0` (usage order). The top three
/// bits are the symbol count, the low five the symbols from the left, with
/// a set bit for a dah.
const CODES: [u8; 36] = [
    0b010_01000, // a
    0b100_10000, // b
    0b100_10100, // c
    0b011_10000, // d
    0b001_00000, // e
    0b100_00100, // f
    0b011_11000, // g
    0b100_00000, // h
    0b010_00000, // i
    0b100_01110, // j
    0b011_10100, // k
    0b100_01000, // l
    0b010_11000, // m
    0b010_10000, // n
    0b011_11100, // o
    0b100_01100, // p
    0b100_11010, // q
    0b011_01000, // r
    0b011_00000, // s
    0b001_10000, // t
    0b011_00100, // u
    0b100_00010, // v
    0b011_01100, // w
    0b100_10010, // x
    0b100_10110, // y
    0b100_11000, // z
    0b101_01111, // 1
    0b101_00111, // 2
    0b101_00011, // 3
    0b101_00001, // 4
    0b101_00000, // 5
    0b101_10000, // 6
    0b101_11000, // 7
    0b101_11100, // 8
    0b101_11110, // 9
    0b101_11111, // 0
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Symbol {
    Dit,
    Dah,
}

/// One letter's code; iterate it for the symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MorseCode(u8);

impl MorseCode {
    pub fn for_usage(usage: KeyUsage) -> Option<Self> {
        if !(KeyUsage::A..=KeyUsage::Num0).contains(&usage) {
            return None;
        }
        let index = usize::from(usage.as_byte() - KeyUsage::A.as_byte());
        CODES.get(index).copied().map(MorseCode)
    }

    pub fn len(self) -> usize {
        usize::from(self.0 >> 5)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for MorseCode {
    type Item = Symbol;
    type IntoIter = Symbols;

    fn into_iter(self) -> Symbols {
        Symbols {
            bits: self.0 << 3,
            remaining: self.0 >> 5,
        }
    }
}

pub struct Symbols {
    bits: u8,
    remaining: u8,
}

impl Iterator for Symbols {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let symbol = if self.bits & 0x80 != 0 {
            Symbol::Dah
        } else {
            Symbol::Dit
        };
        self.bits <<= 1;
        Some(symbol)
    }
}
