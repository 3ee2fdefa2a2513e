//! Transport layer: line input and frame sinks
//!
//! The relay reads lines from any `Read` (a serial port in production, a
//! `MockTransport` in tests) and forwards each processed frame to exactly
//! one `Sink`, selected once from the configured `Destination`.

use crate::config::Destination;
use crate::error::Result;
use std::io::Write;

mod line_reader;
pub mod mock;
mod serial;
mod udp;

pub use line_reader::{LineReader, ReadOutcome};
pub use mock::MockTransport;
pub use serial::SerialTransport;
pub use udp::UdpSink;

/// Destination for processed frames
pub trait FrameSink {
    /// Deliver one complete frame
    ///
    /// A frame is never split: one datagram, or one contiguous write.
    fn send_frame(&mut self, frame: &[u8]) -> Result<()>;
}

/// Byte-stream sink (second serial port)
pub struct StreamSink<W: Write> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    /// Sink writing frames to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> FrameSink for StreamSink<W> {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.write_all(frame)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// The one sink the relay writes to
pub enum Sink {
    /// One datagram per frame
    Udp(UdpSink),
    /// One write per frame
    Stream(StreamSink<Box<dyn Write + Send>>),
}

impl Sink {
    /// Open the endpoint described by `destination`
    pub fn open(destination: &Destination) -> Result<Self> {
        match destination {
            Destination::Udp { host, port } => Ok(Sink::Udp(UdpSink::connect(host, *port)?)),
            Destination::Serial { port, baud_rate } => {
                let transport = SerialTransport::open_output(port, *baud_rate)?;
                Ok(Sink::Stream(StreamSink::new(Box::new(transport))))
            }
        }
    }

    /// Wrap an arbitrary writer as a stream sink
    pub fn stream<W: Write + Send + 'static>(writer: W) -> Self {
        Sink::Stream(StreamSink::new(Box::new(writer)))
    }
}

impl FrameSink for Sink {
    #[inline]
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        match self {
            Sink::Udp(udp) => udp.send_frame(frame),
            Sink::Stream(stream) => stream.send_frame(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_sink_one_write_per_frame() {
        let mock = MockTransport::new();
        let mut sink = Sink::stream(mock.clone());

        sink.send_frame(b"$GPGGA,1*00\r\n").unwrap();
        sink.send_frame(b"$GPRMC,2*00\r\n").unwrap();

        assert_eq!(
            mock.get_writes(),
            vec![b"$GPGGA,1*00\r\n".to_vec(), b"$GPRMC,2*00\r\n".to_vec()]
        );
        assert_eq!(mock.flush_count(), 2);
    }
}
