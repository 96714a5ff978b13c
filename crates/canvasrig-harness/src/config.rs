#![forbid(unsafe_code)]

//! Session configuration.
//!
//! Defaults suit a Godot web export served locally. Every knob can be set
//! through a `with_*` builder or a `CANVASRIG_*` environment variable:
//!
//! | Variable                      | Meaning                                |
//! |-------------------------------|----------------------------------------|
//! | `CANVASRIG_SURFACE_SELECTOR`  | CSS selector of the rendering surface  |
//! | `CANVASRIG_OVERLAY_SELECTOR`  | CSS selector of the loading overlay    |
//! | `CANVASRIG_GRACE_MS`          | readiness grace period                 |
//! | `CANVASRIG_LOAD_TIMEOUT_MS`   | bound on surface appearance            |
//! | `CANVASRIG_POLL_MS`           | readiness poll interval                |
//! | `CANVASRIG_SWIPE_STEPS`       | default swipe step count               |
//! | `CANVASRIG_SWIPE_MS`          | default swipe duration                 |
//! | `CANVASRIG_ASPECT`            | `enforce`, `warn` or `ignore`          |
//! | `CANVASRIG_EXTRA_NOISE`       | comma-separated extra noise substrings |
//! | `CANVASRIG_SESSION_JSONL`     | path of the JSONL session log          |
//!
//! Values that do not parse are ignored with a warning.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use canvasrig_core::ReferenceFrame;

use crate::gesture::{DEFAULT_TOUCH_SETTLE, SwipeOptions};
use crate::locator::DEFAULT_SURFACE_SELECTOR;
use crate::noise::NoiseClassifier;
use crate::readiness::{DEFAULT_OVERLAY_SELECTOR, ReadinessOptions};
use crate::translate::{AspectCheck, AspectPolicy, DEFAULT_ASPECT_TOLERANCE};

/// Default pause after a scene transition.
pub const DEFAULT_TRANSITION_SETTLE: Duration = Duration::from_millis(2500);

/// Everything a [`crate::session::Session`] needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub surface_selector: String,
    pub overlay_selector: String,
    pub readiness: ReadinessOptions,
    pub swipe: SwipeOptions,
    /// Pause between the priming tap and the drag of a swipe.
    pub touch_settle: Duration,
    /// Default pause for [`crate::session::Session::settle`].
    pub transition_settle: Duration,
    /// Surface size the layout was calibrated against.
    pub reference: ReferenceFrame,
    pub aspect_policy: AspectPolicy,
    pub aspect_tolerance: f64,
    /// Noise substrings added to the default allow-list.
    pub extra_noise: Vec<String>,
    /// JSONL session log destination, if any.
    pub session_log: Option<PathBuf>,
    /// Identifier stamped on every session log line.
    pub run_id: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            surface_selector: DEFAULT_SURFACE_SELECTOR.to_string(),
            overlay_selector: DEFAULT_OVERLAY_SELECTOR.to_string(),
            readiness: ReadinessOptions::default(),
            swipe: SwipeOptions::default(),
            touch_settle: DEFAULT_TOUCH_SETTLE,
            transition_settle: DEFAULT_TRANSITION_SETTLE,
            reference: ReferenceFrame::default(),
            aspect_policy: AspectPolicy::default(),
            aspect_tolerance: DEFAULT_ASPECT_TOLERANCE,
            extra_noise: Vec::new(),
            session_log: None,
            run_id: generate_run_id(),
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by `CANVASRIG_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    #[must_use]
    pub fn apply_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("CANVASRIG_SURFACE_SELECTOR") {
            self.surface_selector = v;
        }
        if let Some(v) = get("CANVASRIG_OVERLAY_SELECTOR") {
            self.overlay_selector = v;
        }
        if let Some(ms) = parse_var::<u64>("CANVASRIG_GRACE_MS", get("CANVASRIG_GRACE_MS")) {
            self.readiness.grace_period = Duration::from_millis(ms);
        }
        if let Some(ms) =
            parse_var::<u64>("CANVASRIG_LOAD_TIMEOUT_MS", get("CANVASRIG_LOAD_TIMEOUT_MS"))
        {
            self.readiness.load_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("CANVASRIG_POLL_MS", get("CANVASRIG_POLL_MS")) {
            self.readiness.poll_interval = Duration::from_millis(ms);
        }
        if let Some(steps) =
            parse_var::<u32>("CANVASRIG_SWIPE_STEPS", get("CANVASRIG_SWIPE_STEPS"))
        {
            self.swipe.steps = steps;
        }
        if let Some(ms) = parse_var::<u64>("CANVASRIG_SWIPE_MS", get("CANVASRIG_SWIPE_MS")) {
            self.swipe.duration = Duration::from_millis(ms);
        }
        if let Some(policy) =
            parse_var::<AspectPolicy>("CANVASRIG_ASPECT", get("CANVASRIG_ASPECT"))
        {
            self.aspect_policy = policy;
        }
        if let Some(list) = get("CANVASRIG_EXTRA_NOISE") {
            self.extra_noise.extend(
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }
        if let Some(path) = get("CANVASRIG_SESSION_JSONL") {
            self.session_log = Some(PathBuf::from(path));
        }
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
    pub fn with_readiness(mut self, readiness: ReadinessOptions) -> Self {
        self.readiness = readiness;
        self
    }

    #[must_use]
    pub fn with_swipe(mut self, swipe: SwipeOptions) -> Self {
        self.swipe = swipe;
        self
    }

    #[must_use]
    pub fn with_touch_settle(mut self, settle: Duration) -> Self {
        self.touch_settle = settle;
        self
    }

    #[must_use]
    pub fn with_transition_settle(mut self, settle: Duration) -> Self {
        self.transition_settle = settle;
        self
    }

    #[must_use]
    pub fn with_aspect_policy(mut self, policy: AspectPolicy) -> Self {
        self.aspect_policy = policy;
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: ReferenceFrame) -> Self {
        self.reference = reference;
        self
    }

    #[must_use]
    pub fn with_extra_noise(mut self, text: impl Into<String>) -> Self {
        self.extra_noise.push(text.into());
        self
    }

    #[must_use]
    pub fn with_session_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_log = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn aspect_check(&self) -> AspectCheck {
        AspectCheck {
            reference: self.reference,
            policy: self.aspect_policy,
            tolerance: self.aspect_tolerance,
        }
    }

    /// Default allow-list plus [`Self::extra_noise`].
    pub fn noise_classifier(&self) -> NoiseClassifier {
        NoiseClassifier::default()
            .with_substrings(self.extra_noise.iter().cloned())
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

fn generate_run_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{timestamp:x}-{}", std::process::id())
}
