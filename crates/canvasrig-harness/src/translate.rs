#![forbid(unsafe_code)]

//! Normalized position → absolute viewport coordinate.

use std::fmt;
use std::str::FromStr;

use canvasrig_core::{NormalizedPosition, Point, ReferenceFrame, SurfaceRect};

use crate::error::{HarnessError, Result};
use crate::host::SurfaceHost;
use crate::locator::SurfaceLocator;

/// Default relative tolerance for the aspect check (2%).
pub const DEFAULT_ASPECT_TOLERANCE: f64 = 0.02;

/// What to do when the surface's proportions differ from the calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectPolicy {
    /// Fail with [`HarnessError::AspectMismatch`].
    #[default]
    Enforce,
    /// Log a warning and translate anyway.
    Warn,
    /// Translate without checking.
    Ignore,
}

impl AspectPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Warn => "warn",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for AspectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" | "strict" => Ok(Self::Enforce),
            "warn" => Ok(Self::Warn),
            "ignore" | "off" => Ok(Self::Ignore),
            other => Err(format!("unknown aspect policy '{other}'")),
        }
    }
}

/// Aspect-ratio precondition for a layout calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectCheck {
    pub reference: ReferenceFrame,
    pub policy: AspectPolicy,
    /// Maximum relative deviation accepted.
    pub tolerance: f64,
}

impl Default for AspectCheck {
    fn default() -> Self {
        Self {
            reference: ReferenceFrame::default(),
            policy: AspectPolicy::default(),
            tolerance: DEFAULT_ASPECT_TOLERANCE,
        }
    }
}

impl AspectCheck {
    pub fn verify(&self, rect: &SurfaceRect) -> Result<()> {
        if self.policy == AspectPolicy::Ignore {
            return Ok(());
        }
        let deviation = self.reference.aspect_deviation(rect);
        if deviation <= self.tolerance {
            return Ok(());
        }
        match self.policy {
            AspectPolicy::Enforce => Err(HarnessError::AspectMismatch {
                reference: self.reference,
                actual: *rect,
                deviation,
            }),
            AspectPolicy::Warn | AspectPolicy::Ignore => {
                tracing::warn!(
                    width = rect.width,
                    height = rect.height,
                    reference_width = self.reference.width,
                    reference_height = self.reference.height,
                    deviation,
                    "surface aspect differs from layout calibration"
                );
                Ok(())
            }
        }
    }
}

/// Maps normalized positions onto the live surface.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTranslator {
    locator: SurfaceLocator,
    aspect: AspectCheck,
}

impl CoordinateTranslator {
    pub fn new(locator: SurfaceLocator, aspect: AspectCheck) -> Self {
        Self { locator, aspect }
    }

    pub fn locator(&self) -> &SurfaceLocator {
        &self.locator
    }

    pub fn aspect(&self) -> &AspectCheck {
        &self.aspect
    }

    /// Locate the surface and check it against the calibration.
    pub async fn surface<H: SurfaceHost>(&self, host: &mut H) -> Result<SurfaceRect> {
        let rect = self.locator.locate(host).await?;
        self.aspect.verify(&rect)?;
        Ok(rect)
    }

    /// Absolute coordinate of `position` on a freshly located surface.
    pub async fn to_absolute<H: SurfaceHost>(
        &self,
        host: &mut H,
        position: NormalizedPosition,
    ) -> Result<Point> {
        let rect = self.surface(host).await?;
        Ok(rect.project(position))
    }
}
