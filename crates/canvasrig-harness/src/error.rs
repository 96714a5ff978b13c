#![forbid(unsafe_code)]

//! Error taxonomy.
//!
//! Every fatal condition propagates straight to the calling scenario. The
//! harness never retries on its own; the single soft failure (a loading
//! overlay that never hides) is not an error at all but a
//! [`crate::readiness::OverlayOutcome`].

use std::fmt;
use std::time::Duration;

use canvasrig_core::layout::LayoutError;
use canvasrig_core::{ReferenceFrame, SurfaceRect};

/// Convenience alias used across the harness.
pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

/// Failure reported by a [`crate::host::SurfaceHost`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The browsing context (or the process behind it) is gone.
    Disconnected,
    /// The automation protocol rejected a command.
    Protocol(String),
    /// A page script threw or returned an unexpected shape.
    Script(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "browsing context disconnected"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::Script(msg) => write!(f, "page script error: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Harness error type.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// No rendering surface when geometry was requested.
    SurfaceNotFound { selector: String },
    /// The rendering surface never appeared within the load timeout.
    SurfaceTimeout { selector: String, waited: Duration },
    /// Diagnostics survived noise filtering at a checkpoint.
    UnexpectedDiagnostics { context: String, residue: Vec<String> },
    /// The surface's proportions differ from the layout calibration.
    AspectMismatch {
        reference: ReferenceFrame,
        actual: SurfaceRect,
        deviation: f64,
    },
    /// A named layout entry does not exist.
    Layout(LayoutError),
    /// The host failed underneath us.
    Host(HostError),
}

impl HarnessError {
    /// Residual diagnostics, if this is an [`Self::UnexpectedDiagnostics`].
    pub fn residue(&self) -> Option<&[String]> {
        match self {
            Self::UnexpectedDiagnostics { residue, .. } => Some(residue),
            _ => None,
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceNotFound { selector } => {
                write!(f, "no rendering surface matching '{selector}' (did the target load?)")
            }
            Self::SurfaceTimeout { selector, waited } => write!(
                f,
                "rendering surface '{selector}' did not appear within {}ms",
                waited.as_millis()
            ),
            Self::UnexpectedDiagnostics { context, residue } => {
                write!(f, "[{context}] Console errors:\n{}", residue.join("\n"))
            }
            Self::AspectMismatch {
                reference,
                actual,
                deviation,
            } => write!(
                f,
                "surface {}x{} does not match the {}x{} calibration aspect (off by {:.1}%)",
                actual.width,
                actual.height,
                reference.width,
                reference.height,
                deviation * 100.0
            ),
            Self::Layout(err) => write!(f, "layout lookup failed: {err}"),
            Self::Host(err) => write!(f, "host failure: {err}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            Self::Host(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HostError> for HarnessError {
    fn from(err: HostError) -> Self {
        Self::Host(err)
    }
}

impl From<LayoutError> for HarnessError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}
