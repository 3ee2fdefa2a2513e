//! Per-line processing: pass-through or rewrite
//!
//! Only lines starting with the target marker (`$GPRMC,`) are decoded. Every
//! other line is handed back untouched, whatever its content or checksum.

use super::sentence::Sentence;
use super::transform::DateFieldFix;
use crate::error::{Error, Result};
use chrono::{NaiveDate, Utc};
use std::borrow::Cow;

/// Source of the current UTC date
pub trait Clock {
    /// Today's date in UTC
    fn today(&self) -> NaiveDate;
}

/// Wall-clock UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Result of processing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed<'a> {
    /// Line did not carry the target marker and is forwarded as read
    PassThrough(&'a [u8]),
    /// Line was parsed and re-encoded
    Rewritten(Vec<u8>),
}

impl Processed<'_> {
    /// Bytes to forward
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Processed::PassThrough(raw) => raw,
            Processed::Rewritten(bytes) => bytes,
        }
    }

    /// Whether the line was parsed and re-encoded
    pub fn is_rewritten(&self) -> bool {
        matches!(self, Processed::Rewritten(_))
    }
}

/// Applies the date fix to target sentences, passes everything else through
pub struct FrameProcessor<C: Clock> {
    fix: DateFieldFix,
    marker: Vec<u8>,
    clock: C,
}

impl<C: Clock> FrameProcessor<C> {
    /// Processor applying `fix` with dates from `clock`
    pub fn new(fix: DateFieldFix, clock: C) -> Self {
        let marker = fix.marker();
        Self { fix, marker, clock }
    }

    /// Process one raw line
    ///
    /// # Errors
    /// Propagates `Error::Format` / `Error::ChecksumError` for marked lines
    /// that fail to parse. Unmarked lines never fail.
    pub fn process<'a>(&self, raw_line: &'a [u8]) -> Result<Processed<'a>> {
        if !raw_line.starts_with(&self.marker) {
            return Ok(Processed::PassThrough(raw_line));
        }

        let text = decode_ascii(raw_line)?;
        let mut sentence = Sentence::parse(&text)?;
        if self.fix.matches(&sentence) {
            self.fix.apply(&mut sentence, self.clock.today());
            log::debug!("Inserted date field into {}", sentence.record_id());
        }

        Ok(Processed::Rewritten(sentence.serialize().into_bytes()))
    }
}

fn decode_ascii(raw: &[u8]) -> Result<Cow<'_, str>> {
    if !raw.is_ascii() {
        return Err(Error::Format(format!(
            "Non-ASCII data in message '{}'",
            String::from_utf8_lossy(raw).escape_debug()
        )));
    }
    Ok(String::from_utf8_lossy(raw))
}
