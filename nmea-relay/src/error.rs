//! Error types for the NMEA relay

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Relay error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Line carries the target prefix but is not a `$<payload>*<checksum>` frame
    #[error("Format error: {0}")]
    Format(String),

    /// Frame is well-formed but its declared checksum is wrong
    #[error("Checksum error: expected {expected}, got {actual}")]
    ChecksumError {
        /// Checksum computed over the payload
        expected: String,
        /// Checksum declared in the frame
        actual: String,
    },

    /// Missing, conflicting or invalid options
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file syntax error
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for errors caused by the content of a single frame.
    ///
    /// These are the only errors the relay may skip; everything else
    /// concerns the endpoints or the setup and always stops the loop.
    pub fn is_frame_error(&self) -> bool {
        matches!(self, Error::Format(_) | Error::ChecksumError { .. })
    }
}
