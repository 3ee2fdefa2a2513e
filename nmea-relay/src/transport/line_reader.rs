//! Line-delimited reads over a timeout-capable byte stream

use crate::error::Result;
use std::io::{BufRead, BufReader, ErrorKind, Read};

/// Line terminator on the input side (`\r\n` lines end with it too)
const LINE_DELIMITER: u8 = b'\n';

/// Longest line kept, terminator included
///
/// NMEA sentences are at most 82 characters. Anything longer is noise such
/// as a baud rate mismatch.
pub const MAX_LINE_LEN: usize = 1024;

/// Outcome of one read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One complete line, terminator included
    Line(Vec<u8>),
    /// Line grew past `MAX_LINE_LEN` and was dropped; carries the bytes
    /// discarded so far
    Overflow(usize),
    /// Read timed out without completing a line
    Timeout,
    /// Source closed and nothing is buffered
    EndOfStream,
}

/// Reads whole lines, keeping partial data across read timeouts
///
/// A timeout in the middle of a line does not lose or emit the fragment; the
/// next call continues where the previous one stopped. An unterminated
/// fragment left when the source closes is returned as a final line.
///
/// A line longer than `MAX_LINE_LEN` is reported once as an overflow and
/// the rest of it is skipped up to the next terminator, so memory use stays
/// bounded whatever the source sends.
pub struct LineReader<R: Read> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    discarding: bool,
}

impl<R: Read> LineReader<R> {
    /// Wrap `inner` with an empty line buffer
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::with_capacity(128),
            discarding: false,
        }
    }

    /// Block for at most one source timeout waiting for a line
    pub fn read_line(&mut self) -> Result<ReadOutcome> {
        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    if !self.pending.is_empty() {
                        log::trace!("Read timeout with {} bytes pending", self.pending.len());
                    }
                    return Ok(ReadOutcome::Timeout);
                }
                Err(e) => return Err(e.into()),
            };

            if available.is_empty() {
                self.discarding = false;
                if self.pending.is_empty() {
                    return Ok(ReadOutcome::EndOfStream);
                }
                // Tail of the stream without terminator
                return Ok(ReadOutcome::Line(std::mem::take(&mut self.pending)));
            }

            let (used, complete) = match available.iter().position(|&b| b == LINE_DELIMITER) {
                Some(end) => (end + 1, true),
                None => (available.len(), false),
            };

            if self.discarding {
                self.reader.consume(used);
                if complete {
                    log::debug!("Resynchronized after oversized line");
                    self.discarding = false;
                }
                continue;
            }

            if self.pending.len() + used > MAX_LINE_LEN {
                let dropped = self.pending.len() + used;
                self.pending.clear();
                self.reader.consume(used);
                self.discarding = !complete;
                log::warn!(
                    "Dropping {} bytes without line terminator (limit {})",
                    dropped,
                    MAX_LINE_LEN
                );
                return Ok(ReadOutcome::Overflow(dropped));
            }

            self.pending.extend_from_slice(&available[..used]);
            self.reader.consume(used);
            if complete {
                return Ok(ReadOutcome::Line(std::mem::take(&mut self.pending)));
            }
        }
    }

    /// Bytes of an incomplete line waiting for its terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_splits_lines() {
        let mock = MockTransport::new();
        mock.inject_read(b"$GPGGA,1*00\r\n$GPRMC,2*00\r\n");
        let mut reader = LineReader::new(mock);

        assert_eq!(
            reader.read_line().unwrap(),
            ReadOutcome::Line(b"$GPGGA,1*00\r\n".to_vec())
        );
        assert_eq!(
            reader.read_line().unwrap(),
            ReadOutcome::Line(b"$GPRMC,2*00\r\n".to_vec())
        );
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::EndOfStream);
    }

    #[test]
    fn test_timeout_keeps_partial_line() {
        let mock = MockTransport::new();
        mock.inject_read(b"$GPRMC,12");
        mock.inject_timeout();
        mock.inject_read(b"3*00\r\n");
        let mut reader = LineReader::new(mock);

        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Timeout);
        assert_eq!(reader.pending_len(), 9);
        assert_eq!(
            reader.read_line().unwrap(),
            ReadOutcome::Line(b"$GPRMC,123*00\r\n".to_vec())
        );
        assert_eq!(reader.pending_len(), 0);
    }

    #[test]
    fn test_timeout_with_no_data() {
        let mock = MockTransport::new();
        mock.inject_timeout();
        let mut reader = LineReader::new(mock);
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Timeout);
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::EndOfStream);
    }

    #[test]
    fn test_unterminated_tail_at_end_of_stream() {
        let mock = MockTransport::new();
        mock.inject_read(b"$GPGGA,1*00\r\n$GPVTG");
        let mut reader = LineReader::new(mock);

        assert_eq!(
            reader.read_line().unwrap(),
            ReadOutcome::Line(b"$GPGGA,1*00\r\n".to_vec())
        );
        assert_eq!(
            reader.read_line().unwrap(),
            ReadOutcome::Line(b"$GPVTG".to_vec())
        );
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::EndOfStream);
    }

    #[test]
    fn test_io_error_propagates() {
        let mock = MockTransport::new();
        mock.inject_error(ErrorKind::BrokenPipe);
        let mut reader = LineReader::new(mock);
        assert!(reader.read_line().is_err());
    }

    #[test]
    fn test_endless_line_stays_bounded() {
        let mock = MockTransport::new();
        let noise = vec![b'x'; 4096];
        for _ in 0..64 {
            mock.inject_read(&noise);
            mock.inject_timeout();
        }
        let mut reader = LineReader::new(mock);

        let mut overflows = 0;
        loop {
            match reader.read_line().unwrap() {
                ReadOutcome::Overflow(_) => overflows += 1,
                ReadOutcome::Timeout => {}
                ReadOutcome::EndOfStream => break,
                ReadOutcome::Line(line) => panic!("unexpected line of {} bytes", line.len()),
            }
            assert!(reader.pending_len() <= MAX_LINE_LEN);
        }
        // Reported once, then skipped until a terminator shows up
        assert_eq!(overflows, 1);
    }

    #[test]
    fn test_resynchronizes_after_oversized_line() {
        let mock = MockTransport::new();
        mock.inject_read(&vec![b'x'; 2000]);
        mock.inject_timeout();
        mock.inject_read(b"tail of the junk\r\n$GPGGA,1*00\r\n");
        let mut reader = LineReader::new(mock);

        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Overflow(2000));
        assert_eq!(reader.pending_len(), 0);
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Timeout);
        assert_eq!(
            reader.read_line().unwrap(),
            ReadOutcome::Line(b"$GPGGA,1*00\r\n".to_vec())
        );
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::EndOfStream);
    }

    #[test]
    fn test_line_at_limit_is_kept() {
        let mut line = vec![b'x'; MAX_LINE_LEN - 2];
        line.extend_from_slice(b"\r\n");
        let mock = MockTransport::new();
        mock.inject_read(&line);
        let mut reader = LineReader::new(mock);
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Line(line));
    }
}
