//! nmea-relay - NMEA sentence relay with RMC date repair
//!
//! Forwards NMEA 0183 sentences from a serial port to a UDP endpoint or a
//! second serial port. RMC sentences without a date field (as emitted by the
//! Condor2 simulator) get the current UTC date inserted on the way, so that
//! consumers such as XCTrack accept them. Every other line passes through
//! byte for byte.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use nmea_relay::nmea::{DateFieldFix, FixedClock, FrameProcessor};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
//! let processor = FrameProcessor::new(DateFieldFix::default(), FixedClock(date));
//!
//! let out = processor.process(b"$GPRMC,123519,A,4807.038,N*57\r\n")?;
//! assert_eq!(out.as_bytes(), b"$GPRMC,123519,A,4807.038,N,,,,,010424*78\r\n");
//! # Ok::<(), nmea_relay::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod nmea;
pub mod relay;
pub mod transport;

// Re-export commonly used types
pub use config::{Destination, RelayConfig};
pub use error::{Error, Result};
pub use relay::{InvalidFramePolicy, Relay, RelayState, RelayStats};
