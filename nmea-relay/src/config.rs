//! Configuration for the NMEA relay
//!
//! Two layers are merged into one validated [`RelayConfig`]:
//!
//! 1. an optional TOML file ([`FileConfig`]),
//! 2. command-line overrides ([`Overrides`]).
//!
//! Exactly one destination must come out of the merge. A destination given
//! on the command line replaces the one from the file.

use crate::error::{Error, Result};
use crate::nmea::DateFieldFix;
use crate::nmea::transform::{MAX_DATE_FIELD_INDEX, RMC_DATE_FIELD_INDEX, RMC_RECORD_ID};
use crate::relay::InvalidFramePolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default baud rate for both serial ports
pub const DEFAULT_BAUD_RATE: u32 = 4800;

/// Default UDP port (XCTrack NMEA listener)
pub const DEFAULT_UDP_PORT: u16 = 10110;

/// Default input read timeout
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// File layer
// ============================================================================

/// Contents of the TOML configuration file; every section is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub input: InputSection,
    /// Presence selects the UDP sink
    pub udp: Option<UdpSection>,
    /// Presence selects the serial sink
    pub output: Option<OutputSection>,
    #[serde(default)]
    pub rewrite: RewriteSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Input serial port
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub read_timeout_ms: Option<u64>,
}

/// UDP destination
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UdpSection {
    pub host: String,
    pub port: Option<u16>,
}

/// Secondary serial destination
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub port: String,
    pub baud_rate: Option<u32>,
}

/// Sentence rewrite settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteSection {
    /// Record identifier that receives the date field
    #[serde(default = "default_record_id")]
    pub record_id: String,
    /// Position of the inserted date field
    #[serde(default = "default_date_field_index")]
    pub date_field_index: usize,
    /// Handling of target sentences that fail to parse
    #[serde(default)]
    pub on_invalid: InvalidFramePolicy,
}

/// Logging settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

fn default_record_id() -> String {
    RMC_RECORD_ID.to_string()
}

fn default_date_field_index() -> usize {
    RMC_DATE_FIELD_INDEX
}

impl Default for RewriteSection {
    fn default() -> Self {
        Self {
            record_id: default_record_id(),
            date_field_index: default_date_field_index(),
            on_invalid: InvalidFramePolicy::default(),
        }
    }
}

impl FileConfig {
    /// Load configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use nmea_relay::config::FileConfig;
    ///
    /// let config = FileConfig::load("nmea-relay.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

// ============================================================================
// Command-line layer
// ============================================================================

/// Values given on the command line; `None` leaves the file value in place
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_port: Option<String>,
    pub input_baud: Option<u32>,
    pub udp_host: Option<String>,
    pub udp_port: Option<u16>,
    pub output_port: Option<String>,
    pub output_baud: Option<u32>,
    pub skip_invalid: bool,
    pub log_level: Option<String>,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Where processed frames go; exactly one per relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// One datagram per frame to `host:port`
    Udp { host: String, port: u16 },
    /// One write per frame to a second serial port
    Serial { port: String, baud_rate: u32 },
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Udp { host, port } => write!(f, "udp://{}:{}", host, port),
            Destination::Serial { port, baud_rate } => write!(f, "{} @ {} baud", port, baud_rate),
        }
    }
}

/// Input serial port settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

/// Fully merged and validated relay configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub input: InputConfig,
    pub destination: Destination,
    pub rewrite: DateFieldFix,
    pub on_invalid: InvalidFramePolicy,
    pub log_level: String,
}

impl RelayConfig {
    /// Merge the file and command-line layers and validate the result
    ///
    /// # Errors
    /// `Error::Config` when the input port is missing, when no destination
    /// or two destinations are selected, or when a value is out of range.
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let input_port = overrides
            .input_port
            .or(file.input.port)
            .ok_or_else(|| Error::Config("No input port given".to_string()))?;

        let input = InputConfig {
            port: input_port,
            baud_rate: overrides
                .input_baud
                .or(file.input.baud_rate)
                .unwrap_or(DEFAULT_BAUD_RATE),
            read_timeout: Duration::from_millis(
                file.input.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS),
            ),
        };

        let cli_selects_destination =
            overrides.udp_host.is_some() || overrides.output_port.is_some();
        let (udp_host, output_port) = if cli_selects_destination {
            (overrides.udp_host, overrides.output_port)
        } else {
            (
                file.udp.as_ref().map(|u| u.host.clone()),
                file.output.as_ref().map(|o| o.port.clone()),
            )
        };

        let destination = match (udp_host, output_port) {
            (Some(host), None) => Destination::Udp {
                host,
                port: overrides
                    .udp_port
                    .or(file.udp.and_then(|u| u.port))
                    .unwrap_or(DEFAULT_UDP_PORT),
            },
            (None, Some(port)) => Destination::Serial {
                port,
                baud_rate: overrides
                    .output_baud
                    .or(file.output.and_then(|o| o.baud_rate))
                    .unwrap_or(DEFAULT_BAUD_RATE),
            },
            (None, None) => {
                return Err(Error::Config(
                    "No destination given: set a UDP host or an output port".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(Error::Config(
                    "Both a UDP host and an output port given: choose one destination".to_string(),
                ));
            }
        };

        let on_invalid = if overrides.skip_invalid {
            InvalidFramePolicy::Skip
        } else {
            file.rewrite.on_invalid
        };

        let log_level = overrides
            .log_level
            .or(file.logging.level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let config = Self {
            input,
            destination,
            rewrite: DateFieldFix {
                record_id: file.rewrite.record_id,
                field_index: file.rewrite.date_field_index,
            },
            on_invalid,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.input.port.trim().is_empty() {
            return Err(Error::Config("Input port must not be empty".to_string()));
        }
        if self.input.baud_rate == 0 {
            return Err(Error::Config("Input baud rate must be positive".to_string()));
        }
        if self.input.read_timeout.is_zero() {
            return Err(Error::Config("Read timeout must be positive".to_string()));
        }

        match &self.destination {
            Destination::Udp { host, port } => {
                if host.trim().is_empty() {
                    return Err(Error::Config("UDP host must not be empty".to_string()));
                }
                if *port == 0 {
                    return Err(Error::Config("UDP port must be positive".to_string()));
                }
            }
            Destination::Serial { port, baud_rate } => {
                if port.trim().is_empty() {
                    return Err(Error::Config("Output port must not be empty".to_string()));
                }
                if *port == self.input.port {
                    return Err(Error::Config(format!(
                        "Output port {} is also the input port",
                        port
                    )));
                }
                if *baud_rate == 0 {
                    return Err(Error::Config("Output baud rate must be positive".to_string()));
                }
            }
        }

        let id = &self.rewrite.record_id;
        if id.is_empty() || id.contains([',', '$', '*']) || !id.is_ascii() {
            return Err(Error::Config(format!("Invalid record id '{}'", id)));
        }
        if self.rewrite.field_index == 0 {
            return Err(Error::Config(
                "Date field index must be at least 1 (0 is the record id)".to_string(),
            ));
        }
        if self.rewrite.field_index > MAX_DATE_FIELD_INDEX {
            return Err(Error::Config(format!(
                "Date field index {} exceeds the maximum of {}",
                self.rewrite.field_index, MAX_DATE_FIELD_INDEX
            )));
        }

        Ok(())
    }
}
