#![forbid(unsafe_code)]

//! Deciding when the target is interactive.
//!
//! A canvas application gives no reliable "ready" signal, so readiness is
//! inferred in three phases:
//!
//! 1. wait for the surface element to exist (hard bound, fatal on timeout);
//! 2. wait for the loading overlay to go away (soft bound, warning only);
//! 3. sleep a fixed grace period so the first scene can finish drawing.
//!
//! Phase 2 never fails. Its result is reported as an [`OverlayOutcome`].

use std::time::Duration;

use crate::error::{HarnessError, Result};
use crate::host::{
    ElementCondition, ElementState, PollOptions, SurfaceHost, WaitOutcome, wait_for_condition,
    wait_for_element,
};

/// Default selector for the engine's loading overlay.
pub const DEFAULT_OVERLAY_SELECTOR: &str = "#status";

/// Upper bound on the overlay wait regardless of the load timeout.
pub const OVERLAY_CAP: Duration = Duration::from_secs(30);

/// Timing for [`ReadinessDetector::await_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessOptions {
    /// Unconditional pause after the overlay phase.
    pub grace_period: Duration,
    /// Bound on surface appearance, and on the overlay wait.
    pub load_timeout: Duration,
    /// Secondary bound on the overlay wait.
    pub overlay_cap: Duration,
    pub poll_interval: Duration,
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_millis(3000),
            load_timeout: Duration::from_secs(60),
            overlay_cap: OVERLAY_CAP,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ReadinessOptions {
    #[must_use]
    pub const fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Effective bound on the overlay phase.
    pub fn overlay_timeout(&self) -> Duration {
        self.load_timeout.min(self.overlay_cap)
    }
}

/// Result of the overlay phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// The overlay was present and became hidden.
    Hidden,
    /// There was no overlay element.
    Absent,
    /// The overlay was still visible at the bound.
    TimedOut,
}

impl OverlayOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Absent => "absent",
            Self::TimedOut => "timed_out",
        }
    }
}

/// What [`ReadinessDetector::await_ready`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Time until the surface element existed.
    pub surface_after: Duration,
    pub overlay: OverlayOutcome,
    /// Time spent in the overlay phase.
    pub overlay_after: Duration,
    /// Grace delay applied.
    pub grace: Duration,
}

impl ReadinessReport {
    pub fn total(&self) -> Duration {
        self.surface_after + self.overlay_after + self.grace
    }
}

/// Three-phase readiness protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessDetector {
    surface_selector: String,
    overlay_selector: String,
    options: ReadinessOptions,
}

impl ReadinessDetector {
    pub fn new(
        surface_selector: impl Into<String>,
        overlay_selector: impl Into<String>,
        options: ReadinessOptions,
    ) -> Self {
        Self {
            surface_selector: surface_selector.into(),
            overlay_selector: overlay_selector.into(),
            options,
        }
    }

    pub fn options(&self) -> &ReadinessOptions {
        &self.options
    }

    /// Block until the target is judged interactive.
    ///
    /// Fails only with [`HarnessError::SurfaceTimeout`]. Probe errors in
    /// either wait are logged and polling continues until the bound.
    pub async fn await_ready<H: SurfaceHost>(&self, host: &mut H) -> Result<ReadinessReport> {
        let opts = &self.options;

        let surface = wait_for_element(
            host,
            &self.surface_selector,
            PollOptions::new(opts.load_timeout, opts.poll_interval)
                .tolerate_errors(true),
        )
        .await?;
        let surface_after = match surface {
            WaitOutcome::Satisfied { elapsed, .. } => elapsed,
            WaitOutcome::TimedOut { elapsed, .. } => {
                tracing::error!(
                    selector = %self.surface_selector,
                    waited_ms = elapsed.as_millis() as u64,
                    "rendering surface never appeared"
                );
                return Err(HarnessError::SurfaceTimeout {
                    selector: self.surface_selector.clone(),
                    waited: opts.load_timeout,
                });
            }
        };
        tracing::debug!(
            selector = %self.surface_selector,
            after_ms = surface_after.as_millis() as u64,
            "surface present"
        );

        let wait = wait_for_condition(
            host,
            &self.overlay_selector,
            ElementCondition::HiddenOrAbsent,
            PollOptions::new(opts.overlay_timeout(), opts.poll_interval)
                .tolerate_errors(true),
        )
        .await?;
        let (overlay, overlay_after) = match wait {
            WaitOutcome::Satisfied {
                state: ElementState::Absent,
                elapsed,
            } => (OverlayOutcome::Absent, elapsed),
            WaitOutcome::Satisfied { elapsed, .. } => (OverlayOutcome::Hidden, elapsed),
            WaitOutcome::TimedOut { elapsed, .. } => {
                tracing::warn!(
                    selector = %self.overlay_selector,
                    waited_ms = elapsed.as_millis() as u64,
                    "loading overlay still visible; continuing"
                );
                (OverlayOutcome::TimedOut, elapsed)
            }
        };

        host.sleep(opts.grace_period).await;

        let report = ReadinessReport {
            surface_after,
            overlay,
            overlay_after,
            grace: opts.grace_period,
        };
        tracing::info!(
            surface_ms = report.surface_after.as_millis() as u64,
            overlay = overlay.as_str(),
            overlay_ms = report.overlay_after.as_millis() as u64,
            grace_ms = report.grace.as_millis() as u64,
            "target ready"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_bound_is_capped() {
        let opts = ReadinessOptions::default();
        assert_eq!(opts.overlay_timeout(), OVERLAY_CAP);
        let short = opts.with_load_timeout(Duration::from_secs(5));
        assert_eq!(short.overlay_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn report_total() {
        let report = ReadinessReport {
            surface_after: Duration::from_millis(100),
            overlay: OverlayOutcome::Hidden,
            overlay_after: Duration::from_millis(200),
            grace: Duration::from_millis(3000),
        };
        assert_eq!(report.total(), Duration::from_millis(3300));
    }
}
