//! NMEA 0183 sentence framing: checksums, building and validation.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::types::constants::MAX_SENTENCE_LENGTH;
use crate::types::{NmeaSentence, StartDelimiter};

pub mod gps;
pub use gps::{gga, rmc, GpsFix};


#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Sentence is {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },
    #[error("Sentence does not start with '$' or '!'")]
    MissingStartDelimiter,
    #[error("Sentence has no checksum delimiter")]
    MissingChecksum,
    #[error("Sentence has more than one checksum delimiter")]
    MultipleChecksumDelimiters,
    #[error("Invalid checksum field: {0:?}")]
    InvalidChecksumField(String),
    #[error("Checksum mismatch: computed {computed:02X}, sentence carries {found:02X}")]
    ChecksumMismatch { computed: u8, found: u8 },
    #[error("Invalid address field: {0:?}")]
    InvalidAddress(String),
    #[error("Field {index} contains a reserved character: {value:?}")]
    InvalidField { index: usize, value: String },
    #[error("Field {index} is not numeric: {value:?}")]
    MalformedField { index: usize, value: String },
    #[error("Field {index} is missing")]
    MissingField { index: usize },
    #[error("Invalid line terminator")]
    InvalidTerminator,
    #[error("Sentence contains non-ASCII characters")]
    NonAscii,
}

lazy_static! {
    // Two character talker followed by a three character formatter, e.g. GPGGA, AIVDM
    static ref ADDRESS_PATTERN: Regex = Regex::new(r"^[A-Z][A-Z0-9][A-Z0-9]{3}$").unwrap();
    static ref CHECKSUM_PATTERN: Regex = Regex::new(r"^[0-9A-F]{2}$").unwrap();
}

/// XOR of every byte of the sentence body (between the delimiter and `*`)
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Build a `$`-delimited sentence with checksum and `\r\n`
pub fn build<S: AsRef<str>>(talker: &str, sentence_id: &str, fields: &[S]) -> Result<String, CodecError> {
    let fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
    to_wire(&NmeaSentence::new(talker, sentence_id, fields))
}

/// Build a `!`-delimited (encapsulated) sentence with checksum and `\r\n`
pub fn build_encapsulated<S: AsRef<str>>(talker: &str, sentence_id: &str, fields: &[S]) -> Result<String, CodecError> {
    let fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
    to_wire(&NmeaSentence::encapsulated(talker, sentence_id, fields))
}

/// Serialize a structured sentence to its wire form
pub fn to_wire(sentence: &NmeaSentence) -> Result<String, CodecError> {
    let address = format!("{}{}", sentence.talker, sentence.sentence_id);
    if !ADDRESS_PATTERN.is_match(&address) {
        return Err(CodecError::InvalidAddress(address));
    }
    for (index, field) in sentence.fields.iter().enumerate() {
        if field.chars().any(is_reserved) {
            return Err(CodecError::InvalidField { index, value: field.clone() });
        }
    }

    let body = sentence.body();
    let wire = format!("{}{}*{:02X}\r\n", sentence.start.as_char(), body, checksum(&body));
    if wire.len() > MAX_SENTENCE_LENGTH {
        return Err(CodecError::TooLong { len: wire.len(), max: MAX_SENTENCE_LENGTH });
    }
    debug_assert!(validate(&wire), "generated sentence failed validation: {:?}", wire);
    Ok(wire)
}

fn is_reserved(c: char) -> bool {
    matches!(c, ',' | '*' | '$' | '!' | '\r' | '\n') || !c.is_ascii() || c.is_ascii_control()
}

/// Check structure and checksum of a raw sentence
pub fn validate(raw: &str) -> bool {
    parse(raw).is_ok()
}

/// Parse a raw sentence, verifying its structure and checksum.
///
/// The trailing `\r\n` is optional; any other stray line terminator is an error.
pub fn parse(raw: &str) -> Result<NmeaSentence, CodecError> {
    if !raw.is_ascii() {
        return Err(CodecError::NonAscii);
    }
    let line = raw.strip_suffix("\r\n").unwrap_or(raw);
    if line.contains(|c: char| c == '\r' || c == '\n') {
        return Err(CodecError::InvalidTerminator);
    }
    if line.len() + 2 > MAX_SENTENCE_LENGTH {
        return Err(CodecError::TooLong { len: line.len() + 2, max: MAX_SENTENCE_LENGTH });
    }

    let mut chars = line.chars();
    let start = chars
        .next()
        .and_then(StartDelimiter::from_char)
        .ok_or(CodecError::MissingStartDelimiter)?;
    let rest = chars.as_str();

    let (body, checksum_field) = match rest.matches('*').count() {
        0 => return Err(CodecError::MissingChecksum),
        1 => rest.split_once('*').ok_or(CodecError::MissingChecksum)?,
        _ => return Err(CodecError::MultipleChecksumDelimiters),
    };
    if !CHECKSUM_PATTERN.is_match(checksum_field) {
        return Err(CodecError::InvalidChecksumField(checksum_field.to_string()));
    }
    let found = u8::from_str_radix(checksum_field, 16)
        .map_err(|_| CodecError::InvalidChecksumField(checksum_field.to_string()))?;
    let computed = checksum(body);
    if computed != found {
        return Err(CodecError::ChecksumMismatch { computed, found });
    }

    let mut parts = body.split(',');
    let address = parts.next().unwrap_or_default();
    if !ADDRESS_PATTERN.is_match(address) {
        return Err(CodecError::InvalidAddress(address.to_string()));
    }
    let (talker, sentence_id) = address.split_at(2);

    Ok(NmeaSentence {
        start,
        talker: talker.to_string(),
        sentence_id: sentence_id.to_string(),
        fields: parts.map(str::to_string).collect(),
    })
}

/// Read a numeric field. Empty fields are `None`, non-numeric content is an error.
pub fn numeric_field(sentence: &NmeaSentence, index: usize) -> Result<Option<f64>, CodecError> {
    let value = sentence.field(index).ok_or(CodecError::MissingField { index })?;
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| CodecError::MalformedField { index, value: value.to_string() })
}

/// Incremental sentence construction with typed fields
pub struct SentenceBuilder {
    sentence: NmeaSentence,
}

impl SentenceBuilder {
    pub fn new(talker: &str, sentence_id: &str) -> Self {
        Self { sentence: NmeaSentence::new(talker, sentence_id, Vec::new()) }
    }

    pub fn encapsulated(talker: &str, sentence_id: &str) -> Self {
        Self { sentence: NmeaSentence::encapsulated(talker, sentence_id, Vec::new()) }
    }

    pub fn field(mut self, value: impl Into<String>) -> Self {
        self.sentence.fields.push(value.into());
        self
    }

    pub fn empty(self) -> Self {
        self.field(String::new())
    }

    pub fn float(self, value: f64, decimals: usize) -> Self {
        self.field(format!("{:.*}", decimals, value))
    }

    pub fn opt_float(self, value: Option<f64>, decimals: usize) -> Self {
        match value {
            Some(v) => self.float(v, decimals),
            None => self.empty(),
        }
    }

    pub fn int(self, value: i64) -> Self {
        self.field(value.to_string())
    }

    /// Append a pre-formatted numeric field, rejecting anything that is not a number
    pub fn numeric(self, value: &str) -> Result<Self, CodecError> {
        if !value.is_empty() && value.parse::<f64>().is_err() {
            return Err(CodecError::MalformedField {
                index: self.sentence.fields.len(),
                value: value.to_string(),
            });
        }
        Ok(self.field(value))
    }

    pub fn sentence(self) -> NmeaSentence {
        self.sentence
    }

    pub fn build(self) -> Result<String, CodecError> {
        to_wire(&self.sentence)
    }
}
