//! Bit-level packing of AIS fields.

use super::AisError;

/// Append-only bit buffer, most significant bit first
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self { bits: Vec::with_capacity(424) }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn write_bool(&mut self, value: bool) {
        self.bits.push(value);
    }

    /// Write an unsigned field, failing if it does not fit in `width` bits
    pub fn write_uint(&mut self, field: &'static str, value: u64, width: usize) -> Result<(), AisError> {
        if width < 64 && value >> width != 0 {
            return Err(AisError::FieldOutOfRange { field, value: value as i64, width });
        }
        self.push_bits(value, width);
        Ok(())
    }

    /// Write a signed field in two's complement, failing if it does not fit in `width` bits
    pub fn write_int(&mut self, field: &'static str, value: i64, width: usize) -> Result<(), AisError> {
        let min = -(1i64 << (width - 1));
        let max = (1i64 << (width - 1)) - 1;
        if value < min || value > max {
            return Err(AisError::FieldOutOfRange { field, value, width });
        }
        let mask = (1u64 << width) - 1;
        self.push_bits(value as u64 & mask, width);
        Ok(())
    }

    /// Write `chars` characters of 6-bit text, truncating longer input and padding with '@'
    pub fn write_text(&mut self, field: &'static str, text: &str, chars: usize) -> Result<(), AisError> {
        let values = text
            .chars()
            .take(chars)
            .map(|c| text_value(c).ok_or(AisError::InvalidText { field, character: c }))
            .collect::<Result<Vec<u8>, _>>()?;
        for value in values.iter().copied().chain(std::iter::repeat(0)).take(chars) {
            self.push_bits(value as u64, 6);
        }
        Ok(())
    }

    /// Zero bits, for spare and reserved fields
    pub fn write_spare(&mut self, width: usize) {
        self.push_bits(0, width);
    }

    fn push_bits(&mut self, value: u64, width: usize) {
        for i in (0..width).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }
}

/// Sequential reader over a decoded bit buffer
pub struct BitReader<'a> {
    bits: &'a [bool],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bits: &'a [bool]) -> Self {
        Self { bits, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bits.len() - self.position
    }

    pub fn read_uint(&mut self, width: usize) -> Result<u64, AisError> {
        if self.remaining() < width {
            return Err(AisError::NotEnoughBits { needed: self.position + width, available: self.bits.len() });
        }
        let value = self.bits[self.position..self.position + width]
            .iter()
            .fold(0u64, |acc, &bit| (acc << 1) | bit as u64);
        self.position += width;
        Ok(value)
    }

    pub fn read_int(&mut self, width: usize) -> Result<i64, AisError> {
        let raw = self.read_uint(width)?;
        let sign_bit = 1u64 << (width - 1);
        if raw & sign_bit != 0 {
            Ok(raw as i64 - (1i64 << width))
        } else {
            Ok(raw as i64)
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, AisError> {
        Ok(self.read_uint(1)? == 1)
    }

    /// Read 6-bit text, dropping trailing '@' padding and spaces
    pub fn read_text(&mut self, chars: usize) -> Result<String, AisError> {
        let mut text = String::with_capacity(chars);
        for _ in 0..chars {
            text.push(text_char(self.read_uint(6)? as u8));
        }
        Ok(text.trim_end_matches(|c| c == '@' || c == ' ').to_string())
    }

    pub fn skip(&mut self, width: usize) -> Result<(), AisError> {
        self.read_uint(width).map(|_| ())
    }
}

/// Map a character onto the AIS 6-bit text alphabet ('@'=0 .. '_'=31, ' '=32 .. '?'=63)
fn text_value(c: char) -> Option<u8> {
    let c = c.to_ascii_uppercase();
    match c as u32 {
        64..=95 => Some(c as u8 - 64),
        32..=63 => Some(c as u8),
        _ => None,
    }
}

fn text_char(value: u8) -> char {
    if value < 32 {
        (value + 64) as char
    } else {
        value as char
    }
}
