#![forbid(unsafe_code)]

//! Black-box interaction harness for canvas-rendered applications.
//!
//! The target draws its whole UI into one opaque surface, so nothing here
//! inspects its internals. Every decision comes from three signals: the
//! surface's geometry, elapsed time, and the diagnostic text the page
//! emits.
//!
//! # Components
//!
//! - [`locator::SurfaceLocator`] finds the surface rectangle, fresh per call.
//! - [`readiness::ReadinessDetector`] runs the three-phase readiness wait.
//! - [`translate::CoordinateTranslator`] maps calibrated positions to pixels.
//! - [`gesture::GestureSynthesizer`] issues clicks, taps and swipes.
//! - [`diagnostics::DiagnosticCollector`] buffers console errors and faults.
//! - [`noise::NoiseClassifier`] separates engine chatter from real failures.
//!
//! [`session::Session`] wires them together over a [`host::SurfaceHost`].
//! [`scripted::ScriptedHost`] is a deterministic host for tests.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gesture;
pub mod host;
pub mod input;
pub mod locator;
pub mod noise;
pub mod readiness;
pub mod scripted;
pub mod session;
pub mod session_log;
pub mod translate;

pub use canvasrig_core::{NormalizedPosition, Point, ReferenceFrame, SurfaceRect, layout};
pub use config::HarnessConfig;
pub use diagnostics::{
    ConsoleLevel, DiagnosticCollector, DiagnosticEvent, DiagnosticMessage, DiagnosticSender,
    diagnostic_channel,
};
pub use error::{HarnessError, HostError, Result};
pub use gesture::{GestureSynthesizer, SwipeOptions, SwipePath};
pub use host::{
    ElementState, PollOptions, SurfaceHost, WaitOutcome, wait_for_condition, wait_for_element,
};
pub use input::{InputEvent, PointerButton, PointerInput, PointerPhase};
pub use locator::SurfaceLocator;
pub use noise::{NoiseClassifier, NoisePattern, StackFrameMatcher};
pub use readiness::{OverlayOutcome, ReadinessDetector, ReadinessOptions, ReadinessReport};
pub use scripted::{OverlayScript, ScriptedHost};
pub use session::{CheckpointReport, Session};
pub use session_log::{SessionEvent, SessionLog};
pub use translate::{AspectCheck, AspectPolicy, CoordinateTranslator};
