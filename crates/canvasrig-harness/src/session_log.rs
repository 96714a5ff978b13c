#![forbid(unsafe_code)]

//! JSONL session log.
//!
//! One JSON object per line, one line per notable session event. The schema
//! is stable so CI can grep or replay logs across runs:
//!
//! ```text
//! {"run_id":"18c2…-4242","t_ms":3100,"event":"ready","overlay":"hidden",...}
//! {"run_id":"18c2…-4242","t_ms":3100,"event":"gesture","kind":"tap","x":640.0,"y":444.96}
//! {"run_id":"18c2…-4242","t_ms":5600,"event":"checkpoint","label":"menu","observed":2,...}
//! ```
//!
//! Logging never fails a session: write errors are reported once through
//! `tracing` and further writes are skipped.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

/// An event worth recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Ready {
        surface_ms: u64,
        overlay: &'static str,
        overlay_ms: u64,
        grace_ms: u64,
    },
    Gesture {
        kind: &'static str,
        x: f64,
        y: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        to_x: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        to_y: Option<f64>,
    },
    Checkpoint {
        label: String,
        observed: usize,
        residue: Vec<String>,
    },
}

#[derive(Serialize)]
struct Record<'a> {
    run_id: &'a str,
    t_ms: u64,
    #[serde(flatten)]
    event: &'a SessionEvent,
}

/// Appends [`SessionEvent`]s to a JSONL sink.
pub struct SessionLog {
    run_id: String,
    writer: Option<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for SessionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLog")
            .field("run_id", &self.run_id)
            .field("enabled", &self.writer.is_some())
            .finish()
    }
}

impl SessionLog {
    /// A log that drops everything.
    pub fn disabled(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            writer: None,
        }
    }

    /// Append to (or create) the file at `path`.
    pub fn to_path(run_id: impl Into<String>, path: &Path) -> io::Result<Self> {
        let file: File = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::to_writer(run_id, BufWriter::new(file)))
    }

    pub fn to_writer(run_id: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            run_id: run_id.into(),
            writer: Some(Box::new(writer)),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Write one line stamped with host time `t`.
    pub fn record(&mut self, t: Duration, event: &SessionEvent) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let record = Record {
            run_id: &self.run_id,
            t_ms: t.as_millis() as u64,
            event,
        };
        let result = serde_json::to_writer(&mut *writer, &record)
            .map_err(io::Error::from)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());
        if let Err(err) = result {
            tracing::warn!(
                run_id = %self.run_id,
                error = %err,
                "session log write failed; disabling"
            );
            self.writer = None;
        }
    }
}
