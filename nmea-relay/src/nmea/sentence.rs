//! NMEA sentence framing and checksum
//!
//! # Wire Format
//!
//! ```text
//! $GPRMC,123519,A,4807.038,N,...,W*61\r\n
//! │└─────────── payload ───────────┘│└┴── checksum (hex)
//! start                             checksum delimiter
//! ```
//!
//! The checksum is the XOR of every payload byte, commas included, rendered
//! as two uppercase hex digits. Anything after the checksum token and its
//! trailing whitespace is ignored when parsing.

use crate::error::{Error, Result};

/// Sentence start marker
pub const START_DELIMITER: char = '$';

/// Separates the payload from the checksum
pub const CHECKSUM_DELIMITER: char = '*';

/// Field separator
pub const FIELD_SEPARATOR: char = ',';

/// Line terminator appended on serialization
pub const LINE_TERMINATOR: &str = "\r\n";

// ============================================================================
// Checksum
// ============================================================================

/// NMEA checksum: XOR fold over all bytes
///
/// # Example
/// ```
/// use nmea_relay::nmea::checksum;
///
/// assert_eq!(checksum(b"GPRMC"), 0x4B);
/// assert_eq!(checksum(b""), 0x00);
/// ```
#[inline]
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Checksum of `data` formatted as it appears on the wire
#[inline]
fn checksum_hex(data: &str) -> String {
    format!("{:02X}", checksum(data.as_bytes()))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// ============================================================================
// Sentence
// ============================================================================

/// A parsed NMEA sentence
///
/// `fields[0]` is the record identifier (e.g. `GPRMC`); the remaining fields
/// follow in wire order. The list is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    fields: Vec<String>,
}

impl Sentence {
    /// Build a sentence from its fields, `None` if the list is empty
    pub fn new(fields: Vec<String>) -> Option<Self> {
        if fields.is_empty() {
            None
        } else {
            Some(Self { fields })
        }
    }

    /// Parse a raw frame, validating its checksum
    ///
    /// # Errors
    /// - `Error::Format` if the text is not `$<payload>*<checksum>`
    /// - `Error::ChecksumError` if the declared checksum does not match
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.is_ascii() {
            return Err(Error::Format(format!(
                "Non-ASCII data in message '{}'",
                raw.escape_debug()
            )));
        }

        let malformed =
            || Error::Format(format!("Could not parse message '{}'", raw.escape_debug()));

        let body = raw.strip_prefix(START_DELIMITER).ok_or_else(malformed)?;
        let (payload, tail) = body.split_once(CHECKSUM_DELIMITER).ok_or_else(malformed)?;
        if payload.is_empty() || payload.contains(START_DELIMITER) {
            return Err(malformed());
        }

        let declared_len = tail.bytes().take_while(|&b| is_word_byte(b)).count();
        if declared_len == 0 {
            return Err(malformed());
        }
        let declared = &tail[..declared_len];

        let expected = checksum_hex(payload);
        if expected != declared {
            return Err(Error::ChecksumError {
                expected,
                actual: declared.to_string(),
            });
        }

        Ok(Self {
            fields: payload.split(FIELD_SEPARATOR).map(str::to_owned).collect(),
        })
    }

    /// Serialize to `$<fields>*<checksum>\r\n`
    pub fn serialize(&self) -> String {
        let payload = self.payload();
        let crc = checksum_hex(&payload);
        format!("{START_DELIMITER}{payload}{CHECKSUM_DELIMITER}{crc}{LINE_TERMINATOR}")
    }

    /// Record identifier (first field)
    #[inline]
    pub fn record_id(&self) -> &str {
        &self.fields[0]
    }

    /// All fields, record identifier included
    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields, record identifier included
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Checksum over the comma-joined fields
    pub fn checksum(&self) -> u8 {
        checksum(self.payload().as_bytes())
    }

    /// Insert a field at `index`, shifting the following fields right
    ///
    /// Index 0 is refused (the record identifier stays first); an index
    /// past the end appends.
    pub(crate) fn insert_field(&mut self, index: usize, value: String) {
        let index = index.clamp(1, self.fields.len());
        self.fields.insert(index, value);
    }

    /// Append empty fields until the sentence has `len` fields
    pub(crate) fn pad_to(&mut self, len: usize) {
        if self.fields.len() < len {
            self.fields.resize(len, String::new());
        }
    }

    fn payload(&self) -> String {
        self.fields.join(",")
    }
}
