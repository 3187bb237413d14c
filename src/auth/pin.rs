//! PIN fallback: configured code and the entry buffer

use std::fmt;

use thiserror::Error;

pub const PIN_LENGTH: usize = 6;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("PIN must be exactly 6 digits")]
pub struct InvalidPin;

fn is_pin_shaped(s: &str) -> bool {
    s.len() == PIN_LENGTH && s.chars().all(|c| c.is_ascii_digit())
}

/// The configured 6-digit code
#[derive(Clone, PartialEq, Eq)]
pub struct PinCode(String);

impl PinCode {
    pub fn parse(code: &str) -> Result<Self, InvalidPin> {
        if !is_pin_shaped(code) {
            return Err(InvalidPin);
        }
        Ok(Self(code.to_string()))
    }

    /// Compares every byte regardless of where the first mismatch is
    pub fn verify(&self, candidate: &str) -> bool {
        if candidate.len() != self.0.len() {
            return false;
        }
        self.0
            .bytes()
            .zip(candidate.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

// Never print the code
impl fmt::Debug for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinCode(******)")
    }
}

/// Digits typed so far, at most [`PIN_LENGTH`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinEntry {
    digits: String,
}

impl PinEntry {
    /// Returns false (and ignores the key) for non-digits or a full buffer
    pub fn push_digit(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() || self.is_complete() {
            return false;
        }
        self.digits.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.digits.pop();
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Replace the buffer with `text`. Anything but at most [`PIN_LENGTH`]
    /// ASCII digits is refused and leaves the buffer empty.
    pub fn set(&mut self, text: &str) -> bool {
        if text.len() > PIN_LENGTH || !text.chars().all(|c| c.is_ascii_digit()) {
            self.digits.clear();
            return false;
        }
        self.digits = text.to_string();
        true
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.digits.len() == PIN_LENGTH
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }
}
