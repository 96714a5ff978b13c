#![forbid(unsafe_code)]

//! The host seam: everything the harness needs from a browsing context.
//!
//! A [`SurfaceHost`] wraps one browsing context. The harness only ever sees
//! element probes, geometry, input dispatch, diagnostics and a clock, which
//! keeps every component testable against [`crate::scripted::ScriptedHost`].
//!
//! The clock lives on the host so that every suspension point (readiness
//! polling, grace delays, gesture pauses) can be driven deterministically.

use std::time::Duration;

use canvasrig_core::SurfaceRect;

use crate::diagnostics::DiagnosticReceiver;
use crate::error::HostError;
use crate::input::InputEvent;

/// Smallest poll interval honoured by the wait loops.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Result of probing a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// No element matches.
    Absent,
    /// Present and rendered.
    Visible,
    /// Present but computed `display: none`, `visibility: hidden` or
    /// `opacity: 0`.
    Hidden,
}

impl ElementState {
    pub const fn is_present(self) -> bool {
        !matches!(self, Self::Absent)
    }
}

/// Browsing context the harness drives.
///
/// Implementations are used generically (`H: SurfaceHost`), one per session.
#[allow(async_fn_in_trait)]
pub trait SurfaceHost {
    /// Monotonic time since the host was created.
    fn now(&self) -> Duration;

    /// Suspend for `duration` of host time.
    async fn sleep(&mut self, duration: Duration);

    /// Probe the first element matching `selector`.
    async fn element_state(&mut self, selector: &str) -> Result<ElementState, HostError>;

    /// Bounding rectangle of the first element matching `selector`, or
    /// `None` when nothing matches.
    async fn bounding_rect(&mut self, selector: &str) -> Result<Option<SurfaceRect>, HostError>;

    /// Dispatch one input event at absolute viewport coordinates.
    async fn dispatch(&mut self, event: InputEvent) -> Result<(), HostError>;

    /// Subscribe to error diagnostics for this browsing context.
    ///
    /// Messages emitted before the subscription are not replayed.
    async fn subscribe_diagnostics(&mut self) -> Result<DiagnosticReceiver, HostError>;
}

/// Condition evaluated against a probed [`ElementState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementCondition {
    /// The element exists (visible or hidden).
    Present,
    /// The element is hidden or gone.
    HiddenOrAbsent,
}

impl ElementCondition {
    pub const fn is_met(self, state: ElementState) -> bool {
        match self {
            Self::Present => state.is_present(),
            Self::HiddenOrAbsent => !matches!(state, ElementState::Visible),
        }
    }
}

/// Options for the bounded poll loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Upper bound on the whole wait.
    pub timeout: Duration,
    /// Pause between probes.
    pub interval: Duration,
    /// Keep polling when a probe fails instead of propagating the error.
    pub tolerate_errors: bool,
}

impl PollOptions {
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            tolerate_errors: false,
        }
    }

    #[must_use]
    pub const fn tolerate_errors(mut self, tolerate: bool) -> Self {
        self.tolerate_errors = tolerate;
        self
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_millis(100))
    }
}

/// How a bounded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition held at `elapsed`.
    Satisfied { state: ElementState, elapsed: Duration },
    /// The bound ran out. `last` is the most recent successful probe.
    TimedOut {
        last: Option<ElementState>,
        elapsed: Duration,
    },
}

impl WaitOutcome {
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Satisfied { elapsed, .. } | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

/// Poll `selector` until `condition` holds or `options.timeout` elapses.
///
/// The probe runs at least once, even with a zero timeout. Sleeps are
/// clipped to the remaining budget so the loop never overshoots its bound
/// by more than one probe.
pub async fn wait_for_condition<H: SurfaceHost>(
    host: &mut H,
    selector: &str,
    condition: ElementCondition,
    options: PollOptions,
) -> Result<WaitOutcome, HostError> {
    let start = host.now();
    let deadline = start + options.timeout;
    let interval = options.interval.max(MIN_POLL_INTERVAL);
    let mut last = None;

    loop {
        match host.element_state(selector).await {
            Ok(state) => {
                last = Some(state);
                if condition.is_met(state) {
                    return Ok(WaitOutcome::Satisfied {
                        state,
                        elapsed: host.now().saturating_sub(start),
                    });
                }
            }
            Err(err) if options.tolerate_errors => {
                tracing::warn!(selector, error = %err, "element probe failed; polling continues");
            }
            Err(err) => return Err(err),
        }

        let now = host.now();
        if now >= deadline {
            return Ok(WaitOutcome::TimedOut {
                last,
                elapsed: now.saturating_sub(start),
            });
        }
        host.sleep(interval.min(deadline - now)).await;
    }
}

/// Poll until an element matching `selector` exists.
pub async fn wait_for_element<H: SurfaceHost>(
    host: &mut H,
    selector: &str,
    options: PollOptions,
) -> Result<WaitOutcome, HostError> {
    wait_for_condition(host, selector, ElementCondition::Present, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{OverlayScript, ScriptedHost};
    use canvasrig_core::SurfaceRect;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn conditions() {
        assert!(ElementCondition::Present.is_met(ElementState::Hidden));
        assert!(!ElementCondition::Present.is_met(ElementState::Absent));
        assert!(ElementCondition::HiddenOrAbsent.is_met(ElementState::Absent));
        assert!(!ElementCondition::HiddenOrAbsent.is_met(ElementState::Visible));
    }

    #[tokio::test]
    async fn wait_for_element_sees_late_surface() {
        let mut host = ScriptedHost::new()
            .with_surface(SurfaceRect::from_size(1280.0, 720.0))
            .surface_appears_after(ms(250));
        let outcome = wait_for_element(&mut host, "canvas", PollOptions::new(ms(1000), ms(100)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WaitOutcome::Satisfied {
                state: ElementState::Visible,
                elapsed: ms(300)
            }
        );
    }

    #[tokio::test]
    async fn wait_stops_exactly_at_bound() {
        let mut host = ScriptedHost::new();
        let outcome = wait_for_element(&mut host, "canvas", PollOptions::new(ms(250), ms(100)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WaitOutcome::TimedOut {
                last: Some(ElementState::Absent),
                elapsed: ms(250)
            }
        );
        assert_eq!(host.sleeps(), &[ms(100), ms(100), ms(50)]);
    }

    #[tokio::test]
    async fn zero_timeout_probes_once() {
        let mut host = ScriptedHost::new().with_surface(SurfaceRect::from_size(10.0, 10.0));
        let outcome = wait_for_element(
            &mut host,
            "canvas",
            PollOptions::new(Duration::ZERO, ms(100)),
        )
        .await
        .unwrap();
        assert!(outcome.is_satisfied());
        assert!(host.sleeps().is_empty());
    }

    #[tokio::test]
    async fn probe_errors_propagate_unless_tolerated() {
        let mut host = ScriptedHost::new()
            .with_overlay(OverlayScript::HiddenAfter(ms(200)))
            .failing_probes(2);
        let err = wait_for_condition(
            &mut host,
            "#status",
            ElementCondition::HiddenOrAbsent,
            PollOptions::new(ms(1000), ms(100)),
        )
        .await
        .unwrap_err();
        assert_eq!(err, HostError::Disconnected);

        let mut host = ScriptedHost::new()
            .with_overlay(OverlayScript::HiddenAfter(ms(200)))
            .failing_probes(2);
        let outcome = wait_for_condition(
            &mut host,
            "#status",
            ElementCondition::HiddenOrAbsent,
            PollOptions::new(ms(1000), ms(100)).tolerate_errors(true),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            WaitOutcome::Satisfied {
                state: ElementState::Hidden,
                elapsed: ms(200)
            }
        );
    }
}
