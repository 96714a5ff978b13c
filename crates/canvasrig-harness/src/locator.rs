#![forbid(unsafe_code)]

//! Resolving the rendering surface.

use canvasrig_core::SurfaceRect;

use crate::error::{HarnessError, Result};
use crate::host::SurfaceHost;

/// Default selector for the rendering surface.
pub const DEFAULT_SURFACE_SELECTOR: &str = "canvas";

/// Finds the rendering surface and reports its current rectangle.
///
/// Nothing is cached: the target may resize or reflow the surface on any
/// scene transition, so every call goes back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceLocator {
    selector: String,
}

impl Default for SurfaceLocator {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_SELECTOR)
    }
}

impl SurfaceLocator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Current rectangle of the surface.
    ///
    /// A surface without area is treated as missing.
    pub async fn locate<H: SurfaceHost>(&self, host: &mut H) -> Result<SurfaceRect> {
        match host.bounding_rect(&self.selector).await? {
            Some(rect) if !rect.is_empty() => {
                tracing::trace!(
                    selector = %self.selector,
                    x = rect.x,
                    y = rect.y,
                    width = rect.width,
                    height = rect.height,
                    "surface located"
                );
                Ok(rect)
            }
            Some(rect) => {
                tracing::debug!(selector = %self.selector, ?rect, "surface has no area");
                Err(self.not_found())
            }
            None => Err(self.not_found()),
        }
    }

    fn not_found(&self) -> HarnessError {
        HarnessError::SurfaceNotFound {
            selector: self.selector.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::scripted::ScriptedHost;

    #[tokio::test]
    async fn locates_fresh_each_call() {
        let mut host = ScriptedHost::new().with_surface(SurfaceRect::new(0.0, 0.0, 1280.0, 720.0));
        let locator = SurfaceLocator::default();
        assert_eq!(locator.locate(&mut host).await.unwrap().width, 1280.0);
        host.set_surface(Some(SurfaceRect::new(10.0, 5.0, 640.0, 360.0)));
        assert_eq!(
            locator.locate(&mut host).await.unwrap(),
            SurfaceRect::new(10.0, 5.0, 640.0, 360.0)
        );
    }

    #[tokio::test]
    async fn missing_or_empty_surface_is_not_found() {
        let locator = SurfaceLocator::new("#game");
        let mut host = ScriptedHost::new().with_surface_selector("#game");
        let expected = HarnessError::SurfaceNotFound {
            selector: "#game".into(),
        };
        assert_eq!(locator.locate(&mut host).await.unwrap_err(), expected);

        host.set_surface(Some(SurfaceRect::from_size(0.0, 720.0)));
        assert_eq!(locator.locate(&mut host).await.unwrap_err(), expected);
    }

    #[tokio::test]
    async fn host_failures_pass_through() {
        let mut host = ScriptedHost::new().disconnected();
        let err = SurfaceLocator::default().locate(&mut host).await.unwrap_err();
        assert_eq!(err, HarnessError::Host(HostError::Disconnected));
    }
}
