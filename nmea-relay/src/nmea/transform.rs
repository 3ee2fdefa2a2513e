//! RMC date-field repair
//!
//! Condor2 emits RMC sentences without the date field, which makes strict
//! consumers such as XCTrack drop them. The fix inserts the current UTC date
//! (`ddmmyy`) at field 9, right after the course over ground.

use super::sentence::Sentence;
use chrono::NaiveDate;

/// Record identifier of the sentence that gets the date field
pub const RMC_RECORD_ID: &str = "GPRMC";

/// Position of the date field in an RMC sentence (record identifier is 0)
pub const RMC_DATE_FIELD_INDEX: usize = 9;

/// Highest accepted date field position
///
/// An NMEA sentence is at most 82 characters, so no real sentence has more
/// fields than this.
pub const MAX_DATE_FIELD_INDEX: usize = 80;

/// Wire format of the inserted date
pub const DATE_FORMAT: &str = "%d%m%y";

/// Inserts a date field into sentences of one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFieldFix {
    /// Record identifier the fix applies to
    pub record_id: String,
    /// Field position the date is inserted at
    pub field_index: usize,
}

impl Default for DateFieldFix {
    fn default() -> Self {
        Self {
            record_id: RMC_RECORD_ID.to_string(),
            field_index: RMC_DATE_FIELD_INDEX,
        }
    }
}

impl DateFieldFix {
    /// Whether `sentence` is of the target record type
    #[inline]
    pub fn matches(&self, sentence: &Sentence) -> bool {
        sentence.record_id() == self.record_id
    }

    /// Raw line prefix that marks a candidate for rewriting (`$GPRMC,`)
    pub fn marker(&self) -> Vec<u8> {
        format!("${},", self.record_id).into_bytes()
    }

    /// Insert `today` as `ddmmyy` at `field_index`
    ///
    /// A sentence shorter than `field_index` is padded with empty fields
    /// first, so the date always ends up at the same wire position.
    pub fn apply(&self, sentence: &mut Sentence, today: NaiveDate) {
        sentence.pad_to(self.field_index);
        sentence.insert_field(self.field_index, today.format(DATE_FORMAT).to_string());
    }
}
