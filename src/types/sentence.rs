use serde::{Deserialize, Serialize};
use std::fmt;

/// Leading character of an NMEA sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartDelimiter {
    /// `$`, conventional parametric sentences
    Parametric,
    /// `!`, encapsulated sentences such as AIVDM
    Encapsulated,
}

impl StartDelimiter {
    pub fn as_char(&self) -> char {
        match self {
            StartDelimiter::Parametric => '$',
            StartDelimiter::Encapsulated => '!',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '$' => Some(StartDelimiter::Parametric),
            '!' => Some(StartDelimiter::Encapsulated),
            _ => None,
        }
    }
}

/// An NMEA sentence in structured form. The checksum is derived from the fields,
/// see `codec::checksum`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NmeaSentence {
    pub start: StartDelimiter,
    /// Two character source designator, e.g. `GP` or `AI`
    pub talker: String,
    /// Three character sentence formatter, e.g. `GGA` or `VDM`
    pub sentence_id: String,
    pub fields: Vec<String>,
}

impl NmeaSentence {
    pub fn new(talker: impl Into<String>, sentence_id: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            start: StartDelimiter::Parametric,
            talker: talker.into(),
            sentence_id: sentence_id.into(),
            fields,
        }
    }

    pub fn encapsulated(talker: impl Into<String>, sentence_id: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            start: StartDelimiter::Encapsulated,
            ..Self::new(talker, sentence_id, fields)
        }
    }

    /// The text between the start delimiter and `*`
    pub fn body(&self) -> String {
        let mut body = format!("{}{}", self.talker, self.sentence_id);
        for field in &self.fields {
            body.push(',');
            body.push_str(field);
        }
        body
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

impl fmt::Display for NmeaSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start.as_char(), self.body())
    }
}
