//! Control bindings and their binary encoding
//!
//! Layout: `b"TRB1"`, version `u8`, slot count `u8` (1..=4), then per slot
//! eight little-endian `u16` key codes in the order up, down, left, right,
//! a, b, c, start.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAGIC: &[u8; 4] = b"TRB1";
const VERSION: u8 = 1;
pub const MAX_SLOTS: usize = 4;
const KEYS_PER_SLOT: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("not a bindings file (bad magic)")]
    BadMagic,
    #[error("unsupported bindings version {0}")]
    UnsupportedVersion(u8),
    #[error("bindings data truncated: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },
    #[error("invalid slot count {0}")]
    SlotCount(u8),
}

/// Key codes for one controller slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBindings {
    pub up: u16,
    pub down: u16,
    pub left: u16,
    pub right: u16,
    pub a: u16,
    pub b: u16,
    pub c: u16,
    pub start: u16,
}

impl SlotBindings {
    fn to_array(self) -> [u16; KEYS_PER_SLOT] {
        [
            self.up, self.down, self.left, self.right, self.a, self.b, self.c, self.start,
        ]
    }

    fn from_array(k: [u16; KEYS_PER_SLOT]) -> Self {
        Self {
            up: k[0],
            down: k[1],
            left: k[2],
            right: k[3],
            a: k[4],
            b: k[5],
            c: k[6],
            start: k[7],
        }
    }
}

impl Default for SlotBindings {
    /// Arrow keys plus A/S/D and Enter (USB HID usage codes)
    fn default() -> Self {
        Self {
            up: 0x52,
            down: 0x51,
            left: 0x50,
            right: 0x4F,
            a: 0x04,
            b: 0x16,
            c: 0x07,
            start: 0x28,
        }
    }
}

/// Bindings for every configured slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlBindings {
    pub slots: Vec<SlotBindings>,
}

impl Default for ControlBindings {
    fn default() -> Self {
        Self {
            slots: vec![SlotBindings::default()],
        }
    }
}

impl ControlBindings {
    pub fn encode(&self) -> Vec<u8> {
        let slots = &self.slots[..self.slots.len().min(MAX_SLOTS)];
        let mut out = Vec::with_capacity(6 + slots.len() * KEYS_PER_SLOT * 2);
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.push(slots.len() as u8);
        for slot in slots {
            for key in slot.to_array() {
                out.extend_from_slice(&key.to_le_bytes());
            }
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, BindingError> {
        if bytes.len() < 6 {
            return Err(BindingError::Truncated {
                needed: 6,
                have: bytes.len(),
            });
        }
        if &bytes[..4] != MAGIC {
            return Err(BindingError::BadMagic);
        }
        if bytes[4] != VERSION {
            return Err(BindingError::UnsupportedVersion(bytes[4]));
        }
        let count = bytes[5];
        if count == 0 || count as usize > MAX_SLOTS {
            return Err(BindingError::SlotCount(count));
        }
        let needed = 6 + count as usize * KEYS_PER_SLOT * 2;
        if bytes.len() < needed {
            return Err(BindingError::Truncated {
                needed,
                have: bytes.len(),
            });
        }

        let slots = bytes[6..needed]
            .chunks_exact(KEYS_PER_SLOT * 2)
            .map(|slot| {
                let mut keys = [0u16; KEYS_PER_SLOT];
                for (key, pair) in keys.iter_mut().zip(slot.chunks_exact(2)) {
                    *key = u16::from_le_bytes([pair[0], pair[1]]);
                }
                SlotBindings::from_array(keys)
            })
            .collect();
        Ok(Self { slots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = ControlBindings::default().encode();
        assert_eq!(&bytes[..4], b"TRB1");
        assert_eq!(bytes[4], 1);
        assert_eq!(bytes[5], 1);
        assert_eq!(bytes.len(), 6 + 16);
        // up = 0x52, little endian
        assert_eq!(&bytes[6..8], &[0x52, 0x00]);
    }

    #[test]
    fn test_decode_two_slots() {
        let mut second = SlotBindings::default();
        second.start = 0x1234;
        let b = ControlBindings {
            slots: vec![SlotBindings::default(), second],
        };
        let decoded = ControlBindings::decode(&b.encode()).expect("decodes");
        assert_eq!(decoded.slots[1].start, 0x1234);
        assert_eq!(decoded, b);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            ControlBindings::decode(b"TRB"),
            Err(BindingError::Truncated { needed: 6, have: 3 })
        );
        assert_eq!(
            ControlBindings::decode(b"XXXX\x01\x01"),
            Err(BindingError::BadMagic)
        );
        assert_eq!(
            ControlBindings::decode(b"TRB1\x02\x01"),
            Err(BindingError::UnsupportedVersion(2))
        );
        assert_eq!(
            ControlBindings::decode(b"TRB1\x01\x05"),
            Err(BindingError::SlotCount(5))
        );
        assert_eq!(
            ControlBindings::decode(b"TRB1\x01\x01\x00"),
            Err(BindingError::Truncated { needed: 22, have: 7 })
        );
    }
}
