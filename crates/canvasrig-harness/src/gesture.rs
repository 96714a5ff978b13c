#![forbid(unsafe_code)]

//! Click, tap and swipe synthesis.
//!
//! Gestures are issued strictly in sequence through the host. A gesture that
//! fails partway is not rolled back: the target has already seen the events
//! that went out.

use std::time::Duration;

use canvasrig_core::{NormalizedPosition, Point};

use crate::error::Result;
use crate::host::SurfaceHost;
use crate::input::InputEvent;
use crate::translate::CoordinateTranslator;

/// Pause between the priming tap and the pointer drag of a swipe.
pub const DEFAULT_TOUCH_SETTLE: Duration = Duration::from_millis(50);

/// Shape of a swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeOptions {
    /// Number of interpolated pointer moves. Zero is treated as one.
    pub steps: u32,
    /// Total time spent moving.
    pub duration: Duration,
}

impl Default for SwipeOptions {
    fn default() -> Self {
        Self {
            steps: 10,
            duration: Duration::from_millis(200),
        }
    }
}

impl SwipeOptions {
    #[must_use]
    pub const fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Steps actually performed.
    pub const fn effective_steps(&self) -> u32 {
        if self.steps == 0 { 1 } else { self.steps }
    }

    /// Pause after each move.
    pub fn step_pause(&self) -> Duration {
        self.duration / self.effective_steps()
    }
}

/// Absolute endpoints of a completed swipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipePath {
    pub from: Point,
    pub to: Point,
    pub steps: u32,
}

impl SwipePath {
    /// Target of the `i`-th move (1-based).
    pub fn waypoint(&self, i: u32) -> Point {
        Point::lerp(self.from, self.to, f64::from(i) / f64::from(self.steps))
    }
}

/// Turns normalized positions into input sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSynthesizer {
    translator: CoordinateTranslator,
    touch_settle: Duration,
}

impl GestureSynthesizer {
    pub fn new(translator: CoordinateTranslator) -> Self {
        Self {
            translator,
            touch_settle: DEFAULT_TOUCH_SETTLE,
        }
    }

    #[must_use]
    pub fn with_touch_settle(mut self, settle: Duration) -> Self {
        self.touch_settle = settle;
        self
    }

    pub fn translator(&self) -> &CoordinateTranslator {
        &self.translator
    }

    /// Single pointer click at `position`.
    pub async fn click<H: SurfaceHost>(
        &self,
        host: &mut H,
        position: NormalizedPosition,
    ) -> Result<Point> {
        let at = self.translator.to_absolute(host, position).await?;
        tracing::debug!(x = at.x, y = at.y, "click");
        host.dispatch(InputEvent::click(at)).await?;
        Ok(at)
    }

    /// Single touch tap at `position`.
    pub async fn tap<H: SurfaceHost>(
        &self,
        host: &mut H,
        position: NormalizedPosition,
    ) -> Result<Point> {
        let at = self.translator.to_absolute(host, position).await?;
        tracing::debug!(x = at.x, y = at.y, "tap");
        host.dispatch(InputEvent::tap(at)).await?;
        Ok(at)
    }

    /// Drag from `from` to `to`.
    ///
    /// Sequence: touch tap at `from`, settle, pointer down at `from`, then
    /// `steps` evenly spaced moves each followed by `duration / steps`, then
    /// pointer up at `to`. The last move lands on `to` exactly.
    pub async fn swipe<H: SurfaceHost>(
        &self,
        host: &mut H,
        from: NormalizedPosition,
        to: NormalizedPosition,
        options: SwipeOptions,
    ) -> Result<SwipePath> {
        let rect = self.translator.surface(host).await?;
        let path = SwipePath {
            from: rect.project(from),
            to: rect.project(to),
            steps: options.effective_steps(),
        };
        let pause = options.step_pause();
        tracing::debug!(
            from_x = path.from.x,
            from_y = path.from.y,
            to_x = path.to.x,
            to_y = path.to.y,
            steps = path.steps,
            duration_ms = options.duration.as_millis() as u64,
            "swipe"
        );

        // Some engines only start tracking a drag once a touch has focused
        // the surface.
        host.dispatch(InputEvent::tap(path.from)).await?;
        host.sleep(self.touch_settle).await;

        host.dispatch(InputEvent::down(path.from)).await?;
        for i in 1..=path.steps {
            host.dispatch(InputEvent::drag_to(path.waypoint(i))).await?;
            host.sleep(pause).await;
        }
        host.dispatch(InputEvent::up(path.to)).await?;
        Ok(path)
    }
}
