#![forbid(unsafe_code)]

//! Diagnostic collection.
//!
//! Hosts push [`DiagnosticEvent`]s into a channel from whatever tasks
//! observe the browsing context. A [`DiagnosticCollector`] is the single
//! consumer: it drains the channel into an append-only buffer, keeping only
//! error-severity console output and uncaught page faults.
//!
//! ```text
//!  console listener ─┐
//!  fault listener   ─┼─ mpsc ─> DiagnosticCollector::pump ─> Vec<DiagnosticMessage>
//!  log listener     ─┘
//! ```

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::error::HostError;
use crate::host::SurfaceHost;

/// Prefix applied to uncaught runtime faults in the buffer.
pub const PAGE_ERROR_PREFIX: &str = "[pageerror] ";

/// Producer half handed to host listener tasks.
pub type DiagnosticSender = Sender<DiagnosticEvent>;
/// Consumer half returned by [`SurfaceHost::subscribe_diagnostics`].
pub type DiagnosticReceiver = Receiver<DiagnosticEvent>;

/// Create a connected diagnostic channel.
pub fn diagnostic_channel() -> (DiagnosticSender, DiagnosticReceiver) {
    mpsc::channel()
}

/// Console severity as reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConsoleLevel {
    Debug,
    Log,
    Info,
    Warning,
    Error,
}

impl ConsoleLevel {
    /// Map a browser level name (`"error"`, `"warning"`, `"warn"`, ...).
    ///
    /// Failed `console.assert` calls are warnings: only `console.error`
    /// counts as an error.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warning" | "warn" | "assert" => Self::Warning,
            "info" => Self::Info,
            "debug" | "verbose" | "trace" => Self::Debug,
            _ => Self::Log,
        }
    }
}

/// Raw event produced by a host listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A console message (or an error-level log entry).
    Console { level: ConsoleLevel, text: String },
    /// An uncaught exception in page script.
    PageError { message: String },
}

impl DiagnosticEvent {
    pub fn console(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self::Console {
            level,
            text: text.into(),
        }
    }

    pub fn page_error(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Convert into a buffered message, or `None` if this severity is not
    /// collected.
    pub fn into_message(self) -> Option<DiagnosticMessage> {
        match self {
            Self::Console {
                level: ConsoleLevel::Error,
                text,
            } => Some(DiagnosticMessage {
                channel: DiagnosticChannel::Console,
                line: text,
            }),
            Self::Console { .. } => None,
            Self::PageError { message } => Some(DiagnosticMessage {
                channel: DiagnosticChannel::PageError,
                line: format!("{PAGE_ERROR_PREFIX}{message}"),
            }),
        }
    }
}

/// Which side channel a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticChannel {
    Console,
    PageError,
}

/// One captured diagnostic line, exactly as the classifier sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub channel: DiagnosticChannel,
    pub line: String,
}

impl AsRef<str> for DiagnosticMessage {
    fn as_ref(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Position in a collector's buffer, for [`DiagnosticCollector::since`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct BufferMark {
    /// Number of drains before the mark was taken.
    generation: u64,
    offset: usize,
}

/// Append-only buffer of error diagnostics for one browsing context.
#[derive(Debug)]
pub struct DiagnosticCollector {
    rx: DiagnosticReceiver,
    buffer: Vec<DiagnosticMessage>,
    generation: u64,
    disconnected: bool,
}

impl DiagnosticCollector {
    /// Subscribe to `host`'s diagnostics.
    pub async fn start<H: SurfaceHost>(host: &mut H) -> Result<Self, HostError> {
        let rx = host.subscribe_diagnostics().await?;
        tracing::debug!("diagnostic collection started");
        Ok(Self::from_receiver(rx))
    }

    pub fn from_receiver(rx: DiagnosticReceiver) -> Self {
        Self {
            rx,
            buffer: Vec::new(),
            generation: 0,
            disconnected: false,
        }
    }

    /// Move everything currently queued into the buffer.
    ///
    /// Returns the number of messages appended.
    pub fn pump(&mut self) -> usize {
        if self.disconnected {
            return 0;
        }
        let before = self.buffer.len();
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(msg) = event.into_message() {
                        self.buffer.push(msg);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("diagnostic channel closed");
                    self.disconnected = true;
                    break;
                }
            }
        }
        self.buffer.len() - before
    }

    /// Everything collected so far, in observation order.
    pub fn messages(&mut self) -> &[DiagnosticMessage] {
        self.pump();
        &self.buffer
    }

    /// Take everything collected so far and reset the buffer.
    pub fn drain(&mut self) -> Vec<DiagnosticMessage> {
        self.pump();
        self.generation += 1;
        std::mem::take(&mut self.buffer)
    }

    /// Mark the current end of the buffer.
    pub fn mark(&mut self) -> BufferMark {
        self.pump();
        BufferMark {
            generation: self.generation,
            offset: self.buffer.len(),
        }
    }

    /// Messages appended after `mark`.
    ///
    /// A mark taken before a [`drain`](Self::drain) predates the whole
    /// current buffer, so everything collected since the drain is returned.
    pub fn since(&mut self, mark: BufferMark) -> &[DiagnosticMessage] {
        self.pump();
        let start = if mark.generation == self.generation {
            mark.offset.min(self.buffer.len())
        } else {
            0
        };
        &self.buffer[start..]
    }

    pub fn len(&mut self) -> usize {
        self.pump();
        self.buffer.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Whether every producer has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}
