//! Forwarding loop
//!
//! One thread, fully synchronous: read a line, process it, write it, repeat.
//! Frames leave in arrival order and nothing is buffered between stages.
//!
//! ```text
//! Idle ──run()──▶ Running ──end of stream / error / interrupt──▶ Stopped
//! ```
//!
//! The relay owns both endpoints; they are released when it is dropped.

use crate::error::Result;
use crate::nmea::{Clock, FrameProcessor, Processed};
use crate::transport::{FrameSink, LineReader, ReadOutcome};
use serde::Deserialize;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

/// What to do with a target sentence that fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidFramePolicy {
    /// Stop the relay and return the error
    #[default]
    Abort,
    /// Drop the frame, log a warning and keep going
    Skip,
}

/// Lifecycle of a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Running,
    Stopped,
}

/// Result of a single loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Frame forwarded unchanged
    Forwarded,
    /// Frame rewritten and forwarded
    Rewritten,
    /// Invalid frame dropped under `InvalidFramePolicy::Skip`
    Skipped,
    /// Oversized input line dropped by the reader
    Discarded,
    /// Read timed out, nothing forwarded
    Idle,
    /// Input closed
    EndOfStream,
}

/// Counters reported when the relay stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Frames written to the sink (rewritten ones included)
    pub frames_forwarded: u64,
    /// Frames that received the date fix
    pub frames_rewritten: u64,
    /// Invalid frames dropped
    pub frames_skipped: u64,
    /// Input lines dropped for exceeding the line length limit
    pub lines_discarded: u64,
    /// Bytes written to the sink
    pub bytes_sent: u64,
}

/// Serial-to-sink forwarding loop
pub struct Relay<R: Read, S: FrameSink, C: Clock> {
    reader: LineReader<R>,
    sink: S,
    processor: FrameProcessor<C>,
    policy: InvalidFramePolicy,
    state: RelayState,
    stats: RelayStats,
}

impl<R: Read, S: FrameSink, C: Clock> Relay<R, S, C> {
    /// Create an idle relay from already opened endpoints
    pub fn new(
        input: R,
        sink: S,
        processor: FrameProcessor<C>,
        policy: InvalidFramePolicy,
    ) -> Self {
        Self {
            reader: LineReader::new(input),
            sink,
            processor,
            policy,
            state: RelayState::Idle,
            stats: RelayStats::default(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Counters so far, also available after a failed run
    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Run one iteration: read at most one line and forward it
    pub fn step(&mut self) -> Result<Step> {
        let line = match self.reader.read_line()? {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Overflow(_) => {
                self.stats.lines_discarded += 1;
                return Ok(Step::Discarded);
            }
            ReadOutcome::Timeout => return Ok(Step::Idle),
            ReadOutcome::EndOfStream => return Ok(Step::EndOfStream),
        };

        let processed = match self.processor.process(&line) {
            Ok(processed) => processed,
            Err(e) if e.is_frame_error() && self.policy == InvalidFramePolicy::Skip => {
                log::warn!("Dropping invalid frame: {}", e);
                self.stats.frames_skipped += 1;
                return Ok(Step::Skipped);
            }
            Err(e) => return Err(e),
        };

        let frame = processed.as_bytes();
        log::trace!("-> {}", String::from_utf8_lossy(frame).trim_end());
        self.sink.send_frame(frame)?;

        self.stats.frames_forwarded += 1;
        self.stats.bytes_sent += frame.len() as u64;
        Ok(match processed {
            Processed::Rewritten(_) => {
                self.stats.frames_rewritten += 1;
                Step::Rewritten
            }
            Processed::PassThrough(_) => Step::Forwarded,
        })
    }

    /// Forward frames until end of stream, an error, or `running` is cleared
    ///
    /// The interrupt flag is checked between reads, so a stop request is
    /// honoured within one read timeout.
    pub fn run(&mut self, running: &AtomicBool) -> Result<RelayStats> {
        self.state = RelayState::Running;
        let result = self.run_until_stopped(running);
        self.state = RelayState::Stopped;
        result.map(|()| self.stats)
    }

    fn run_until_stopped(&mut self, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::Relaxed) {
            if self.step()? == Step::EndOfStream {
                log::info!("Input stream closed");
                break;
            }
        }
        Ok(())
    }
}
