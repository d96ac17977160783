//! Tracker recordings
//!
//! JSON-lines recordings of tracker output and physical key transitions,
//! used by the binary to drive the engine without a camera. One record per
//! line; blank lines and lines starting with `#` are ignored.
//!
//! ```text
//! {"t": 0.000, "x": 312.0, "y": 240.5, "scores": [0.0, 0.0, 0.0, 0.12]}
//! {"t": 0.033, "x": 313.5, "y": 240.0, "scores": [0.0, 0.0, 0.0, 0.71]}
//! {"t": 0.500, "key": 36, "state": "pressed"}
//! {"t": 0.580, "key": 36, "state": "released"}
//! ```

use super::{PositionSample, TrackerFrame};
use crate::input::KeyState;
use serde::Deserialize;
use std::io::BufRead;
use thiserror::Error;

/// Recording parse errors
#[derive(Error, Debug)]
pub enum ReplayError {
    /// A line was not a valid record
    #[error("line {line}: {source}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A record had a position component without its pair
    #[error("line {0}: position needs both x and y")]
    IncompletePosition(usize),

    /// Reading the recording failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyLine {
    t: f64,
    key: u32,
    state: KeyState,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameLine {
    t: f64,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    scores: Option<Vec<f32>>,
}

/// One replayable record
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayRecord {
    /// A tracker frame
    Frame {
        /// Offset from the start of the recording, seconds
        at: f64,
        /// The frame itself
        frame: TrackerFrame,
    },
    /// A physical key transition
    Key {
        /// Offset from the start of the recording, seconds
        at: f64,
        /// evdev key code
        keycode: u32,
        /// Transition
        state: KeyState,
    },
}

impl ReplayRecord {
    /// Offset from the start of the recording, seconds
    pub fn at(&self) -> f64 {
        match self {
            Self::Frame { at, .. } | Self::Key { at, .. } => *at,
        }
    }
}

/// Parse one line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<ReplayRecord>, ReplayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let parse_error = |source| ReplayError::Parse {
        line: line_no,
        source,
    };
    let value: serde_json::Value = serde_json::from_str(trimmed).map_err(parse_error)?;

    // A `key` field makes it a key record, so a bad key line is an error
    // rather than an empty frame
    let record = if value.get("key").is_some() {
        let KeyLine { t, key, state } = serde_json::from_value(value).map_err(parse_error)?;
        ReplayRecord::Key {
            at: t,
            keycode: key,
            state,
        }
    } else {
        let FrameLine { t, x, y, scores } = serde_json::from_value(value).map_err(parse_error)?;
        let position = match (x, y) {
            (Some(x), Some(y)) => Some(PositionSample::new(x, y, t)),
            (None, None) => None,
            _ => return Err(ReplayError::IncompletePosition(line_no)),
        };
        ReplayRecord::Frame {
            at: t,
            frame: TrackerFrame { position, scores },
        }
    };

    Ok(Some(record))
}

/// Streaming reader over a recording
pub struct RecordingReader<R> {
    inner: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> RecordingReader<R> {
    /// Wrap a buffered reader
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Read every remaining record
    pub fn read_all(self) -> Result<Vec<ReplayRecord>, ReplayError> {
        self.collect()
    }
}

impl<R: BufRead> Iterator for RecordingReader<R> {
    type Item = Result<ReplayRecord, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    match parse_line(self.line_no, &self.buf) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
