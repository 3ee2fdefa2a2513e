//! nmea-relay - forward NMEA sentences from a serial port
//!
//! Reads NMEA 0183 sentences from a serial port (e.g. the Condor2 NMEA
//! output through a com0com virtual port) and forwards them to either a UDP
//! endpoint (XCTrack) or a second serial port. RMC sentences get the missing
//! date field inserted on the way.
//!
//! ```text
//! nmea-relay /dev/ttyUSB0 --udp-host 192.168.1.123
//! nmea-relay COM3 --output-port COM5 --output-baud 9600
//! nmea-relay --config nmea-relay.toml
//! ```

use clap::Parser;
use nmea_relay::config::{DEFAULT_LOG_LEVEL, FileConfig, Overrides};
use nmea_relay::nmea::{FrameProcessor, SystemClock};
use nmea_relay::transport::{SerialTransport, Sink};
use nmea_relay::{Error, Relay, RelayConfig, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Forward NMEA sentences from a serial port to UDP or a second serial port
#[derive(Parser, Debug)]
#[command(name = "nmea-relay", version)]
struct Cli {
    /// Serial port receiving NMEA data (e.g. /dev/ttyUSB0, COM3)
    input_port: Option<String>,

    /// Input baud rate [default: 4800]
    #[arg(short = 'b', long)]
    input_baud: Option<u32>,

    /// Forward to this UDP host (IP or name)
    #[arg(long, conflicts_with = "output_port")]
    udp_host: Option<String>,

    /// UDP destination port [default: 10110]
    #[arg(long)]
    udp_port: Option<u16>,

    /// Forward to this serial port instead of UDP
    #[arg(long)]
    output_port: Option<String>,

    /// Output baud rate [default: 4800]
    #[arg(long)]
    output_baud: Option<u32>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drop RMC sentences that fail validation instead of stopping
    #[arg(long)]
    skip_invalid: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            input_port: self.input_port.clone(),
            input_baud: self.input_baud,
            udp_host: self.udp_host.clone(),
            udp_port: self.udp_port,
            output_port: self.output_port.clone(),
            output_baud: self.output_baud,
            skip_invalid: self.skip_invalid,
            log_level: self.log_level.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    // Initialize logger (RUST_LOG still takes precedence)
    let level = cli
        .log_level
        .clone()
        .or_else(|| file.logging.level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::info!("nmea-relay v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &cli.config {
        log::info!("Using config: {}", path.display());
    }

    // Fail before touching any port if the setup is incomplete
    let config =
        RelayConfig::resolve(file, cli.overrides()).inspect_err(|e| log::error!("{}", e))?;

    log::info!(
        "Input: {} @ {} baud, output: {}",
        config.input.port,
        config.input.baud_rate,
        config.destination
    );
    log::info!(
        "Rewriting {} (date at field {}), invalid frames: {:?}",
        config.rewrite.record_id,
        config.rewrite.field_index,
        config.on_invalid
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let result = run(&config, &running);
    log::info!("NMEA relay stopped");
    result
}

/// Open both endpoints and relay until stopped; endpoints close on return
fn run(config: &RelayConfig, running: &AtomicBool) -> Result<()> {
    let input = SerialTransport::open_input(
        &config.input.port,
        config.input.baud_rate,
        config.input.read_timeout,
    )?;
    let sink = Sink::open(&config.destination)?;
    let processor = FrameProcessor::new(config.rewrite.clone(), SystemClock);
    let mut relay = Relay::new(input, sink, processor, config.on_invalid);

    log::info!("NMEA relay started (press Ctrl-C to stop)...");
    match relay.run(running) {
        Ok(stats) => {
            log::info!(
                "Forwarded {} frames ({} rewritten, {} dropped, {} bytes), {} oversized lines",
                stats.frames_forwarded,
                stats.frames_rewritten,
                stats.frames_skipped,
                stats.bytes_sent,
                stats.lines_discarded
            );
            Ok(())
        }
        Err(e) => {
            let stats = relay.stats();
            log::error!(
                "Relay failed after {} frames: {}",
                stats.frames_forwarded,
                e
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_udp_arguments() {
        let cli = Cli::parse_from([
            "nmea-relay",
            "/dev/ttyUSB0",
            "--udp-host",
            "192.168.1.123",
            "--udp-port",
            "4353",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.input_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(overrides.udp_host.as_deref(), Some("192.168.1.123"));
        assert_eq!(overrides.udp_port, Some(4353));
        assert!(!overrides.skip_invalid);
    }

    #[test]
    fn test_cli_rejects_two_destinations() {
        let result = Cli::try_parse_from([
            "nmea-relay",
            "COM3",
            "--udp-host",
            "10.0.0.2",
            "--output-port",
            "COM5",
        ]);
        assert!(result.is_err());
    }
}
