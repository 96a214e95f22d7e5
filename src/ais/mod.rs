pub mod armor;
pub mod bits;
pub mod messages;
pub mod reports;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::codec::{self, CodecError};
use crate::types::constants::{AIS_FRAGMENT_THRESHOLD, AIS_MAX_SEQUENTIAL_ID};
use crate::types::AisMessage;
use bits::{BitReader, BitWriter};

#[cfg(test)]
mod tests;

/// Errors raised while encoding or decoding AIS messages
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AisError {
    #[error("Field {field} value {value} does not fit in {width} bits")]
    FieldOutOfRange { field: &'static str, value: i64, width: usize },
    #[error("Invalid MMSI: {0}")]
    InvalidMmsi(u32),
    #[error("Field {field} contains a character outside the AIS text alphabet: {character:?}")]
    InvalidText { field: &'static str, character: char },
    #[error("Unsupported message type: {0}")]
    UnsupportedMessageType(u8),
    #[error("Message contents do not match the type {0} layout")]
    VariantMismatch(u8),
    #[error("Payload of {chars} characters needs {fragments} fragments, at most {max} allowed")]
    TooManyFragments { chars: usize, fragments: usize, max: usize },
    #[error("Invalid payload character: {0:?}")]
    InvalidPayloadChar(char),
    #[error("Invalid fill bit count: {0}")]
    InvalidFillBits(u8),
    #[error("Payload too short: needed {needed} bits, {available} available")]
    NotEnoughBits { needed: usize, available: usize },
    #[error("Invalid value {value} for field {field}")]
    InvalidFieldValue { field: &'static str, value: u64 },
    #[error("Fragment error: {0}")]
    Fragment(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// VHF channel an AIS message is reported on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// The other channel, used to alternate between successive emissions
    pub fn alternate(self) -> Self {
        match self {
            Channel::A => Channel::B,
            Channel::B => Channel::A,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "A"),
            Channel::B => write!(f, "B"),
        }
    }
}

/// Packs AIS messages and frames them as AIVDM sentences.
///
/// The encoder owns the sequential message id counter shared by all multi-fragment messages.
#[derive(Debug)]
pub struct AisEncoder {
    talker: String,
    fragment_threshold: usize,
    next_sequential_id: u8,
}

impl Default for AisEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AisEncoder {
    pub fn new() -> Self {
        Self {
            talker: "AI".to_string(),
            fragment_threshold: AIS_FRAGMENT_THRESHOLD,
            next_sequential_id: 1,
        }
    }

    /// Override the number of payload characters carried per fragment
    pub fn with_fragment_threshold(mut self, threshold: usize) -> Self {
        self.fragment_threshold = threshold.max(1);
        self
    }

    /// Encode a message into one or more complete AIVDM sentences
    pub fn encode(&mut self, message: &AisMessage, channel: Channel) -> Result<Vec<String>, AisError> {
        let (payload, fill_bits) = encode_payload(message)?;
        self.frame(&payload, fill_bits, channel)
    }

    /// Split an armored payload into AIVDM fragments
    pub fn frame(&mut self, payload: &str, fill_bits: u8, channel: Channel) -> Result<Vec<String>, AisError> {
        let chunks: Vec<&str> = payload
            .as_bytes()
            .chunks(self.fragment_threshold)
            .map(|c| std::str::from_utf8(c).map_err(|_| CodecError::NonAscii))
            .collect::<Result<_, _>>()?;
        let count = chunks.len().max(1);
        if count > AIS_MAX_SEQUENTIAL_ID as usize {
            return Err(AisError::TooManyFragments {
                chars: payload.len(),
                fragments: count,
                max: AIS_MAX_SEQUENTIAL_ID as usize,
            });
        }

        let sequential_id = if count > 1 { self.take_sequential_id().to_string() } else { String::new() };
        let channel = channel.to_string();
        let count_field = count.to_string();

        let mut sentences = Vec::with_capacity(count);
        for (index, chunk) in chunks.iter().enumerate() {
            let number = (index + 1).to_string();
            let fill = (if index + 1 == count { fill_bits } else { 0 }).to_string();
            let fields = [count_field.as_str(), number.as_str(), sequential_id.as_str(), channel.as_str(), *chunk, fill.as_str()];
            sentences.push(codec::build_encapsulated(&self.talker, "VDM", &fields)?);
        }
        Ok(sentences)
    }

    fn take_sequential_id(&mut self) -> u8 {
        let id = self.next_sequential_id;
        self.next_sequential_id = id % AIS_MAX_SEQUENTIAL_ID + 1;
        id
    }
}

/// Pack and armor a message, returning the payload and its fill bit count
pub fn encode_payload(message: &AisMessage) -> Result<(String, u8), AisError> {
    let message_type = message.message_type();
    let codec = messages::codec_for(message_type).ok_or(AisError::UnsupportedMessageType(message_type))?;
    let mut writer = BitWriter::new();
    (codec.encode)(message, &mut writer)?;
    debug_assert_eq!(writer.len(), codec.bit_length, "type {} layout length", message_type);
    Ok(armor::armor(writer.bits()))
}

/// Unpack an armored payload
pub fn decode_payload(payload: &str, fill_bits: u8) -> Result<AisMessage, AisError> {
    let bits = armor::dearmor(payload, fill_bits)?;
    let mut reader = BitReader::new(&bits);
    let message_type = reader.read_uint(6)? as u8;
    let codec = messages::codec_for(message_type).ok_or(AisError::UnsupportedMessageType(message_type))?;
    (codec.decode)(message_type, &mut reader)
}

/// Reassemble the fragments of one logical message and decode it
pub fn decode<S: AsRef<str>>(sentences: &[S]) -> Result<AisMessage, AisError> {
    if sentences.is_empty() {
        return Err(AisError::Fragment("no sentences".to_string()));
    }

    let mut payload = String::new();
    let mut fill_bits = 0u8;
    let mut sequential_id: Option<String> = None;
    for (index, raw) in sentences.iter().enumerate() {
        let sentence = codec::parse(raw.as_ref())?;
        if sentence.sentence_id != "VDM" && sentence.sentence_id != "VDO" {
            return Err(AisError::Fragment(format!("unexpected sentence {}", sentence.sentence_id)));
        }
        let field = |i: usize| sentence.field(i).ok_or(CodecError::MissingField { index: i });
        let count: usize = parse_number(field(0)?, 0)?;
        let number: usize = parse_number(field(1)?, 1)?;
        if count != sentences.len() || number != index + 1 {
            return Err(AisError::Fragment(format!(
                "fragment {}/{} at position {} of {}",
                number,
                count,
                index + 1,
                sentences.len()
            )));
        }
        let id = field(2)?.to_string();
        if let Some(expected) = &sequential_id {
            if *expected != id {
                return Err(AisError::Fragment(format!("sequential id {} does not match {}", id, expected)));
            }
        }
        sequential_id = Some(id);
        payload.push_str(field(4)?);
        fill_bits = parse_number(field(5)?, 5)?;
    }

    decode_payload(&payload, fill_bits)
}

fn parse_number<T: std::str::FromStr>(value: &str, index: usize) -> Result<T, CodecError> {
    value.parse().map_err(|_| CodecError::MalformedField { index, value: value.to_string() })
}
