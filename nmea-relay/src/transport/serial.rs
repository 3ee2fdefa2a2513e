//! Serial transport implementation

use crate::error::Result;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Write timeout for the output port; writes block until the whole frame is out
const OUTPUT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Serial transport for NMEA input and output ports (8N1, no flow control)
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port for reading lines
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0", "COM3")
    /// * `baud_rate` - Baud rate (e.g., 4800)
    /// * `read_timeout` - How long a read may block before reporting a timeout
    pub fn open_input(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let transport = Self::open(path, baud_rate, read_timeout)?;
        log::info!("Opened input port: {} at {} baud", path, baud_rate);
        Ok(transport)
    }

    /// Open a serial port for writing frames
    pub fn open_output(path: &str, baud_rate: u32) -> Result<Self> {
        let transport = Self::open(path, baud_rate, OUTPUT_TIMEOUT)?;
        log::info!("Opened output port: {} at {} baud", path, baud_rate);
        Ok(transport)
    }

    fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;
        Ok(SerialTransport { port })
    }

    /// Port name as reported by the driver
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        log::debug!(
            "Closing serial port {}",
            self.name().unwrap_or_else(|| "<unnamed>".to_string())
        );
    }
}
