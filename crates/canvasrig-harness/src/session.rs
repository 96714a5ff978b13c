#![forbid(unsafe_code)]

//! One test's view of one browsing context.
//!
//! A [`Session`] owns a host, the collector buffer for that host, and the
//! component stack built from a [`HarnessConfig`]. Multi-context scenarios
//! open one session per context; sessions share nothing.
//!
//! Typical flow:
//!
//! ```ignore
//! let mut session = Session::new(host, HarnessConfig::from_env());
//! session.start_diagnostics().await?;
//! session.await_ready().await?;
//! session.click(MenuButton::Start.position()).await?;
//! session.settle_default().await;
//! session.checkpoint("main-menu")?;
//! ```

use std::time::Duration;

use canvasrig_core::{NormalizedPosition, Point, SurfaceRect, layout};

use crate::config::HarnessConfig;
use crate::diagnostics::{BufferMark, DiagnosticCollector, DiagnosticMessage};
use crate::error::Result;
use crate::gesture::{GestureSynthesizer, SwipeOptions, SwipePath};
use crate::host::SurfaceHost;
use crate::locator::SurfaceLocator;
use crate::noise::NoiseClassifier;
use crate::readiness::{ReadinessDetector, ReadinessReport};
use crate::session_log::{SessionEvent, SessionLog};
use crate::translate::CoordinateTranslator;

/// Outcome of a passing [`Session::checkpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointReport {
    pub label: String,
    /// Messages observed since the previous checkpoint, noise included.
    pub observed: usize,
}

/// Scope of one test against one host.
#[derive(Debug)]
pub struct Session<H> {
    host: H,
    config: HarnessConfig,
    detector: ReadinessDetector,
    synth: GestureSynthesizer,
    classifier: NoiseClassifier,
    collector: Option<DiagnosticCollector>,
    checkpoint_mark: BufferMark,
    log: SessionLog,
}

impl<H: SurfaceHost> Session<H> {
    /// Build a session. A session log that cannot be opened is reported and
    /// skipped.
    pub fn new(host: H, config: HarnessConfig) -> Self {
        let detector = ReadinessDetector::new(
            config.surface_selector.clone(),
            config.overlay_selector.clone(),
            config.readiness,
        );
        let translator = CoordinateTranslator::new(
            SurfaceLocator::new(config.surface_selector.clone()),
            config.aspect_check(),
        );
        let synth = GestureSynthesizer::new(translator).with_touch_settle(config.touch_settle);
        let classifier = config.noise_classifier();
        let log = match &config.session_log {
            Some(path) => SessionLog::to_path(config.run_id.clone(), path).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "cannot open session log");
                SessionLog::disabled(config.run_id.clone())
            }),
            None => SessionLog::disabled(config.run_id.clone()),
        };
        Self {
            host,
            config,
            detector,
            synth,
            classifier,
            collector: None,
            checkpoint_mark: BufferMark::default(),
            log,
        }
    }

    /// Replace the session log sink.
    #[must_use]
    pub fn with_log(mut self, log: SessionLog) -> Self {
        self.log = log;
        self
    }

    /// Replace the noise classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: NoiseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Begin collecting diagnostics. Calling again keeps the existing buffer.
    pub async fn start_diagnostics(&mut self) -> Result<()> {
        if self.collector.is_none() {
            self.collector = Some(DiagnosticCollector::start(&mut self.host).await?);
            self.checkpoint_mark = BufferMark::default();
        }
        Ok(())
    }

    pub async fn await_ready(&mut self) -> Result<ReadinessReport> {
        let report = self.detector.await_ready(&mut self.host).await?;
        self.log.record(
            self.host.now(),
            &SessionEvent::Ready {
                surface_ms: report.surface_after.as_millis() as u64,
                overlay: report.overlay.as_str(),
                overlay_ms: report.overlay_after.as_millis() as u64,
                grace_ms: report.grace.as_millis() as u64,
            },
        );
        Ok(report)
    }

    pub async fn locate_surface(&mut self) -> Result<SurfaceRect> {
        self.synth
            .translator()
            .locator()
            .locate(&mut self.host)
            .await
    }

    pub async fn to_absolute(&mut self, position: NormalizedPosition) -> Result<Point> {
        self.synth
            .translator()
            .to_absolute(&mut self.host, position)
            .await
    }

    pub async fn click(&mut self, position: NormalizedPosition) -> Result<Point> {
        let at = self.synth.click(&mut self.host, position).await?;
        self.log_gesture("click", at, None);
        Ok(at)
    }

    pub async fn tap(&mut self, position: NormalizedPosition) -> Result<Point> {
        let at = self.synth.tap(&mut self.host, position).await?;
        self.log_gesture("tap", at, None);
        Ok(at)
    }

    /// Swipe with the configured default shape.
    pub async fn swipe(
        &mut self,
        from: NormalizedPosition,
        to: NormalizedPosition,
    ) -> Result<SwipePath> {
        let options = self.config.swipe;
        self.swipe_with(from, to, options).await
    }

    pub async fn swipe_with(
        &mut self,
        from: NormalizedPosition,
        to: NormalizedPosition,
        options: SwipeOptions,
    ) -> Result<SwipePath> {
        let path = self.synth.swipe(&mut self.host, from, to, options).await?;
        self.log_gesture("swipe", path.from, Some(path.to));
        Ok(path)
    }

    /// Click a layout entry by qualified name (`menu.start`).
    pub async fn click_named(&mut self, name: &str) -> Result<Point> {
        let position = layout::lookup(name)?;
        self.click(position).await
    }

    /// Tap a layout entry by qualified name (`tribe.judah`).
    pub async fn tap_named(&mut self, name: &str) -> Result<Point> {
        let position = layout::lookup(name)?;
        self.tap(position).await
    }

    /// Wait for the target to finish a transition.
    pub async fn settle(&mut self, duration: Duration) {
        self.host.sleep(duration).await;
    }

    /// [`Self::settle`] with the configured transition pause.
    pub async fn settle_default(&mut self) {
        let duration = self.config.transition_settle;
        self.settle(duration).await;
    }

    /// Everything collected so far; empty before [`Self::start_diagnostics`].
    pub fn diagnostics(&mut self) -> &[DiagnosticMessage] {
        match self.collector.as_mut() {
            Some(collector) => collector.messages(),
            None => &[],
        }
    }

    /// Classify the whole buffer since diagnostics started.
    pub fn assert_healthy(&mut self, context: &str) -> Result<()> {
        let Some(collector) = self.collector.as_mut() else {
            tracing::debug!(context, "no diagnostics collected; nothing to check");
            return Ok(());
        };
        self.classifier
            .assert_healthy(collector.messages(), context)
    }

    /// Classify what arrived since the previous checkpoint, then move the
    /// mark forward. The mark advances even on failure so one bad message is
    /// reported once.
    pub fn checkpoint(&mut self, label: &str) -> Result<CheckpointReport> {
        let t = self.host.now();
        let Some(collector) = self.collector.as_mut() else {
            self.log.record(
                t,
                &SessionEvent::Checkpoint {
                    label: label.to_string(),
                    observed: 0,
                    residue: Vec::new(),
                },
            );
            return Ok(CheckpointReport {
                label: label.to_string(),
                observed: 0,
            });
        };

        let window = collector.since(self.checkpoint_mark);
        let observed = window.len();
        let outcome = self.classifier.assert_healthy(window, label);
        self.checkpoint_mark = collector.mark();

        let residue = outcome
            .as_ref()
            .err()
            .and_then(|err| err.residue())
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        tracing::info!(label, observed, residue = residue.len(), "checkpoint");
        self.log.record(
            t,
            &SessionEvent::Checkpoint {
                label: label.to_string(),
                observed,
                residue,
            },
        );

        outcome.map(|()| CheckpointReport {
            label: label.to_string(),
            observed,
        })
    }

    fn log_gesture(&mut self, kind: &'static str, at: Point, to: Option<Point>) {
        self.log.record(
            self.host.now(),
            &SessionEvent::Gesture {
                kind,
                x: at.x,
                y: at.y,
                to_x: to.map(|p| p.x),
                to_y: to.map(|p| p.y),
            },
        );
    }
}
