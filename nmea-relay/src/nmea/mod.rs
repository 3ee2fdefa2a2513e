//! NMEA 0183 sentence handling
//!
//! - `sentence`: framing, checksum and field parsing
//! - `transform`: RMC date-field repair
//! - `processor`: per-line decision between pass-through and rewrite

pub mod processor;
pub mod sentence;
pub mod transform;

pub use processor::{Clock, FixedClock, FrameProcessor, Processed, SystemClock};
pub use sentence::{Sentence, checksum};
pub use transform::DateFieldFix;
