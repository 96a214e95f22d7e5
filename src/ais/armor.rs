//! Six-bit ASCII armoring of AIS payloads.

use super::AisError;

/// Map a 6-bit value (0..=63) onto its payload character
pub fn armor_char(value: u8) -> char {
    debug_assert!(value < 64);
    if value < 40 {
        (value + 48) as char
    } else {
        (value + 56) as char
    }
}

/// Map a payload character back onto its 6-bit value
pub fn dearmor_char(c: char) -> Result<u8, AisError> {
    match c as u32 {
        48..=87 => Ok(c as u8 - 48),
        96..=119 => Ok(c as u8 - 56),
        _ => Err(AisError::InvalidPayloadChar(c)),
    }
}

/// Number of zero bits appended to make `bit_len` a multiple of six
pub fn fill_bits(bit_len: usize) -> u8 {
    ((6 - bit_len % 6) % 6) as u8
}

/// Armor a bit buffer, returning the payload and its fill bit count
pub fn armor(bits: &[bool]) -> (String, u8) {
    let payload = bits
        .chunks(6)
        .map(|chunk| {
            let value = chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8);
            // A short final chunk is left-aligned, the remainder being fill
            armor_char(value << (6 - chunk.len()))
        })
        .collect();
    (payload, fill_bits(bits.len()))
}

/// Recover the message bits from an armored payload, discarding fill bits
pub fn dearmor(payload: &str, fill_bits: u8) -> Result<Vec<bool>, AisError> {
    if fill_bits > 5 {
        return Err(AisError::InvalidFillBits(fill_bits));
    }
    let mut bits = Vec::with_capacity(payload.len() * 6);
    for c in payload.chars() {
        let value = dearmor_char(c)?;
        for i in (0..6).rev() {
            bits.push((value >> i) & 1 == 1);
        }
    }
    let fill = fill_bits as usize;
    if fill > bits.len() {
        return Err(AisError::InvalidFillBits(fill_bits));
    }
    bits.truncate(bits.len() - fill);
    Ok(bits)
}
