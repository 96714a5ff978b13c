#![forbid(unsafe_code)]

//! Deterministic in-memory host.
//!
//! [`ScriptedHost`] plays a scripted target: a surface that appears at a
//! chosen instant, a loading overlay with a chosen fate, diagnostics pushed
//! on demand. Time only moves when the harness sleeps, so readiness bounds
//! of a minute finish instantly and every timing assertion is exact.

use std::time::Duration;

use canvasrig_core::{Point, SurfaceRect};

use crate::diagnostics::{
    ConsoleLevel, DiagnosticEvent, DiagnosticReceiver, DiagnosticSender, diagnostic_channel,
};
use crate::error::HostError;
use crate::host::{ElementState, SurfaceHost};
use crate::input::InputEvent;
use crate::locator::DEFAULT_SURFACE_SELECTOR;
use crate::readiness::DEFAULT_OVERLAY_SELECTOR;

/// Monotonic clock that only moves when told to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    pub const fn now(&self) -> Duration {
        self.now
    }
}

/// Behaviour of the loading overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayScript {
    /// No overlay element.
    #[default]
    Absent,
    /// Visible forever.
    Visible,
    /// Visible until the given instant, hidden afterwards.
    HiddenAfter(Duration),
}

/// One dispatched input, stamped with host time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchRecord {
    pub at: Duration,
    pub event: InputEvent,
}

/// Scripted [`SurfaceHost`].
#[derive(Debug)]
pub struct ScriptedHost {
    clock: DeterministicClock,
    surface_selector: String,
    overlay_selector: String,
    surface: Option<SurfaceRect>,
    surface_from: Duration,
    overlay: OverlayScript,
    dispatched: Vec<DispatchRecord>,
    sleeps: Vec<Duration>,
    diagnostics: Option<DiagnosticSender>,
    failing_probes: usize,
    disconnected: bool,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHost {
    /// A host with no surface and no overlay.
    pub fn new() -> Self {
        Self {
            clock: DeterministicClock::new(),
            surface_selector: DEFAULT_SURFACE_SELECTOR.to_string(),
            overlay_selector: DEFAULT_OVERLAY_SELECTOR.to_string(),
            surface: None,
            surface_from: Duration::ZERO,
            overlay: OverlayScript::Absent,
            dispatched: Vec::new(),
            sleeps: Vec::new(),
            diagnostics: None,
            failing_probes: 0,
            disconnected: false,
        }
    }

    #[must_use]
    pub fn with_surface(mut self, rect: SurfaceRect) -> Self {
        self.surface = Some(rect);
        self
    }

    /// The surface only exists from `at` onwards.
    #[must_use]
    pub fn surface_appears_after(mut self, at: Duration) -> Self {
        self.surface_from = at;
        self
    }

    #[must_use]
    pub fn with_surface_selector(mut self, selector: impl Into<String>) -> Self {
        self.surface_selector = selector.into();
        self
    }

    #[must_use]
    pub fn with_overlay_selector(mut self, selector: impl Into<String>) -> Self {
        self.overlay_selector = selector.into();
        self
    }

    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayScript) -> Self {
        self.overlay = overlay;
        self
    }

    /// The next `n` element probes fail with [`HostError::Disconnected`].
    #[must_use]
    pub fn failing_probes(mut self, n: usize) -> Self {
        self.failing_probes = n;
        self
    }

    /// Every host call fails as if the page had closed.
    #[must_use]
    pub fn disconnected(mut self) -> Self {
        self.disconnected = true;
        self
    }

    /// Replace the surface (simulates a resize or reflow).
    pub fn set_surface(&mut self, rect: Option<SurfaceRect>) {
        self.surface = rect;
    }

    pub fn set_overlay(&mut self, overlay: OverlayScript) {
        self.overlay = overlay;
    }

    pub fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut DeterministicClock {
        &mut self.clock
    }

    /// Push a diagnostic event. Dropped if nobody has subscribed yet.
    pub fn emit(&mut self, event: DiagnosticEvent) {
        let closed = match &self.diagnostics {
            Some(tx) => tx.send(event).is_err(),
            None => false,
        };
        if closed {
            self.diagnostics = None;
        }
    }

    pub fn emit_console(&mut self, level: ConsoleLevel, text: impl Into<String>) {
        self.emit(DiagnosticEvent::console(level, text));
    }

    pub fn emit_error(&mut self, text: impl Into<String>) {
        self.emit_console(ConsoleLevel::Error, text);
    }

    pub fn emit_page_error(&mut self, message: impl Into<String>) {
        self.emit(DiagnosticEvent::page_error(message));
    }

    /// Everything dispatched so far.
    pub fn dispatched(&self) -> &[DispatchRecord] {
        &self.dispatched
    }

    /// Dispatched events without timestamps.
    pub fn events(&self) -> Vec<InputEvent> {
        self.dispatched.iter().map(|r| r.event).collect()
    }

    /// Targets of every pointer move, in order.
    pub fn pointer_moves(&self) -> Vec<Point> {
        self.dispatched
            .iter()
            .filter(|r| r.event.is_pointer_move())
            .map(|r| r.event.position())
            .collect()
    }

    /// Every sleep requested, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    fn surface_present(&self) -> bool {
        self.surface.is_some() && self.clock.now() >= self.surface_from
    }

    fn check_connected(&self) -> Result<(), HostError> {
        if self.disconnected {
            Err(HostError::Disconnected)
        } else {
            Ok(())
        }
    }
}

impl SurfaceHost for ScriptedHost {
    fn now(&self) -> Duration {
        self.clock.now()
    }

    async fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.clock.advance(duration);
    }

    async fn element_state(&mut self, selector: &str) -> Result<ElementState, HostError> {
        self.check_connected()?;
        if self.failing_probes > 0 {
            self.failing_probes -= 1;
            return Err(HostError::Disconnected);
        }
        if selector == self.surface_selector {
            return Ok(if self.surface_present() {
                ElementState::Visible
            } else {
                ElementState::Absent
            });
        }
        if selector == self.overlay_selector {
            return Ok(match self.overlay {
                OverlayScript::Absent => ElementState::Absent,
                OverlayScript::Visible => ElementState::Visible,
                OverlayScript::HiddenAfter(at) if self.clock.now() >= at => ElementState::Hidden,
                OverlayScript::HiddenAfter(_) => ElementState::Visible,
            });
        }
        Ok(ElementState::Absent)
    }

    async fn bounding_rect(&mut self, selector: &str) -> Result<Option<SurfaceRect>, HostError> {
        self.check_connected()?;
        if selector == self.surface_selector && self.surface_present() {
            return Ok(self.surface);
        }
        Ok(None)
    }

    async fn dispatch(&mut self, event: InputEvent) -> Result<(), HostError> {
        self.check_connected()?;
        self.dispatched.push(DispatchRecord {
            at: self.clock.now(),
            event,
        });
        Ok(())
    }

    async fn subscribe_diagnostics(&mut self) -> Result<DiagnosticReceiver, HostError> {
        self.check_connected()?;
        let (tx, rx) = diagnostic_channel();
        self.diagnostics = Some(tx);
        Ok(rx)
    }
}
