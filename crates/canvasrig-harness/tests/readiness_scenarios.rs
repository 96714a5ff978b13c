//! Readiness protocol end to end against a scripted target.

use std::time::Duration;

use canvasrig_harness::{
    HarnessError, HostError, OverlayOutcome, OverlayScript, ReadinessDetector, ReadinessOptions,
    ScriptedHost, SurfaceHost, SurfaceRect,
};
use pretty_assertions::assert_eq;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn detector(options: ReadinessOptions) -> ReadinessDetector {
    ReadinessDetector::new("canvas", "#status", options)
}

fn surface() -> SurfaceRect {
    SurfaceRect::from_size(1280.0, 720.0)
}

#[tokio::test]
async fn surface_without_overlay_is_ready_after_grace() {
    let mut host = ScriptedHost::new().with_surface(surface());
    let report = detector(ReadinessOptions::default())
        .await_ready(&mut host)
        .await
        .unwrap();

    assert_eq!(report.surface_after, Duration::ZERO);
    assert_eq!(report.overlay, OverlayOutcome::Absent);
    assert_eq!(report.grace, ms(3000));
    assert_eq!(host.now(), ms(3000));
    assert_eq!(host.sleeps(), &[ms(3000)]);
}

#[tokio::test]
async fn missing_surface_times_out() {
    let mut host = ScriptedHost::new();
    let err = detector(ReadinessOptions::default().with_load_timeout(ms(500)))
        .await_ready(&mut host)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        HarnessError::SurfaceTimeout {
            selector: "canvas".into(),
            waited: ms(500),
        }
    );
    // Bounded: no grace delay after a timeout, and no overshoot.
    assert_eq!(host.now(), ms(500));
}

#[tokio::test]
async fn overlay_hides_before_grace() {
    let mut host = ScriptedHost::new()
        .with_surface(surface())
        .surface_appears_after(ms(1200))
        .with_overlay(OverlayScript::HiddenAfter(ms(4000)));
    let report = detector(ReadinessOptions::default().with_grace_period(ms(500)))
        .await_ready(&mut host)
        .await
        .unwrap();

    assert_eq!(report.surface_after, ms(1200));
    assert_eq!(report.overlay, OverlayOutcome::Hidden);
    assert_eq!(report.overlay_after, ms(2800));
    assert_eq!(host.now(), ms(4500));
}

#[tokio::test]
async fn stuck_overlay_is_only_a_warning() {
    let mut host = ScriptedHost::new()
        .with_surface(surface())
        .with_overlay(OverlayScript::Visible);
    let report = detector(ReadinessOptions::default().with_grace_period(Duration::ZERO))
        .await_ready(&mut host)
        .await
        .unwrap();

    assert_eq!(report.overlay, OverlayOutcome::TimedOut);
    assert_eq!(report.overlay_after, Duration::from_secs(30));
}

#[tokio::test]
async fn overlay_bound_follows_short_load_timeout() {
    let mut host = ScriptedHost::new()
        .with_surface(surface())
        .with_overlay(OverlayScript::Visible);
    let report = detector(
        ReadinessOptions::default()
            .with_load_timeout(ms(2000))
            .with_grace_period(Duration::ZERO),
    )
    .await_ready(&mut host)
    .await
    .unwrap();

    assert_eq!(report.overlay, OverlayOutcome::TimedOut);
    assert_eq!(report.overlay_after, ms(2000));
}

#[tokio::test]
async fn overlay_probe_errors_are_tolerated() {
    let mut host = ScriptedHost::new()
        .with_surface(surface())
        .with_overlay(OverlayScript::HiddenAfter(ms(100)));
    // Let the surface probe succeed, then fail the first two overlay probes.
    let detector = detector(ReadinessOptions::default().with_grace_period(Duration::ZERO));
    let mut flaky = FlakyOverlay { inner: &mut host, failures: 2 };
    let report = detector.await_ready(&mut flaky).await.unwrap();
    assert_eq!(report.overlay, OverlayOutcome::Hidden);
    assert_eq!(report.overlay_after, ms(200));
}

#[tokio::test]
async fn transient_surface_query_error_is_retried() {
    let mut host = ScriptedHost::new().with_surface(surface()).failing_probes(1);
    let report = detector(ReadinessOptions::default().with_grace_period(Duration::ZERO))
        .await_ready(&mut host)
        .await
        .unwrap();

    assert_eq!(report.surface_after, ms(100));
    assert_eq!(report.overlay, OverlayOutcome::Absent);
}

#[tokio::test]
async fn persistent_query_errors_end_in_surface_timeout() {
    let mut host = ScriptedHost::new().with_surface(surface()).disconnected();
    let err = detector(ReadinessOptions::default().with_load_timeout(ms(500)))
        .await_ready(&mut host)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        HarnessError::SurfaceTimeout {
            selector: "canvas".into(),
            waited: ms(500),
        }
    );
    assert_eq!(host.now(), ms(500));
}

/// Wraps a scripted host and fails the first `failures` overlay probes.
struct FlakyOverlay<'a> {
    inner: &'a mut ScriptedHost,
    failures: usize,
}

impl SurfaceHost for FlakyOverlay<'_> {
    fn now(&self) -> Duration {
        self.inner.now()
    }

    async fn sleep(&mut self, duration: Duration) {
        self.inner.sleep(duration).await;
    }

    async fn element_state(
        &mut self,
        selector: &str,
    ) -> Result<canvasrig_harness::ElementState, HostError> {
        if selector == "#status" && self.failures > 0 {
            self.failures -= 1;
            return Err(HostError::Script("overlay probe threw".into()));
        }
        self.inner.element_state(selector).await
    }

    async fn bounding_rect(&mut self, selector: &str) -> Result<Option<SurfaceRect>, HostError> {
        self.inner.bounding_rect(selector).await
    }

    async fn dispatch(&mut self, event: canvasrig_harness::InputEvent) -> Result<(), HostError> {
        self.inner.dispatch(event).await
    }

    async fn subscribe_diagnostics(
        &mut self,
    ) -> Result<canvasrig_harness::diagnostics::DiagnosticReceiver, HostError> {
        self.inner.subscribe_diagnostics().await
    }
}
