#![forbid(unsafe_code)]

//! Launching a browser suitable for WebGL canvas targets.
//!
//! Headless Chromium has no GPU, so WebGL runs on SwiftShader through ANGLE.
//! Engines compiled to wasm with threads also need `SharedArrayBuffer`,
//! which is only exposed with the feature flag below when the page is not
//! cross-origin isolated.

use std::path::PathBuf;

use canvasrig_harness::HostError;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::cdp::CdpHost;

/// Flags every launch carries.
pub const GL_ARGS: &[&str] = &[
    "--use-gl=angle",
    "--use-angle=swiftshader-webgl",
    "--enable-experimental-web-platform-features",
    "--enable-features=SharedArrayBuffer,WebAssemblyBaseline",
    "--disable-web-security",
    "--allow-running-insecure-content",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--ignore-gpu-blacklist",
    "--enable-gpu-rasterization",
];

/// Browser launch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub headless: bool,
    pub width: u32,
    pub height: u32,
    /// Advertise touch support to pages.
    pub touch: bool,
    /// Browser binary; the system default when unset.
    pub executable: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1280,
            height: 720,
            touch: true,
            executable: None,
            extra_args: Vec::new(),
        }
    }
}

impl LaunchConfig {
    /// Defaults plus `CANVASRIG_CHROME` (browser binary) and
    /// `CANVASRIG_HEADED=1`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn apply_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CANVASRIG_CHROME").filter(|p| !p.trim().is_empty()) {
            self.executable = Some(PathBuf::from(path.trim()));
        }
        if let Some(flag) = lookup("CANVASRIG_HEADED") {
            self.headless = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        self
    }

    #[must_use]
    pub fn headed(mut self, headed: bool) -> Self {
        self.headless = !headed;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Full command-line flag list.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = GL_ARGS.iter().map(|a| a.to_string()).collect();
        args.push(format!("--window-size={},{}", self.width, self.height));
        for extra in &self.extra_args {
            if !args.contains(extra) {
                args.push(extra.clone());
            }
        }
        args
    }

    fn browser_config(&self) -> Result<BrowserConfig, HostError> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.width, self.height)
            .args(self.args());
        if let Some(bin) = &self.executable {
            builder = builder.chrome_executable(bin);
        }
        if !self.headless {
            builder = builder.with_head();
        }
        builder.build().map_err(HostError::Protocol)
    }
}

/// A running browser and its protocol event loop.
pub struct WebRig {
    browser: Browser,
    handler: JoinHandle<()>,
    config: LaunchConfig,
}

impl std::fmt::Debug for WebRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRig")
            .field("config", &self.config)
            .field("handler_finished", &self.handler.is_finished())
            .finish()
    }
}

impl WebRig {
    /// Start the browser and its handler task.
    pub async fn launch(config: LaunchConfig) -> Result<Self, HostError> {
        let browser_config = config.browser_config()?;
        tracing::info!(
            headless = config.headless,
            width = config.width,
            height = config.height,
            executable = ?config.executable,
            "launching browser"
        );
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|err| HostError::Protocol(format!("browser launch failed: {err}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::warn!(error = %err, "browser handler error; stopping event loop");
                    break;
                }
            }
            tracing::debug!("browser event loop exited");
        });

        Ok(Self {
            browser,
            handler,
            config,
        })
    }

    /// Open a blank page with device emulation applied.
    ///
    /// Navigation is left to the caller so diagnostics can be subscribed
    /// before the target starts loading.
    pub async fn open_blank(&self) -> Result<CdpHost, HostError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| HostError::Protocol(err.to_string()))?;
        let host = CdpHost::new(page);
        host.emulate_device(self.config.width, self.config.height, self.config.touch)
            .await?;
        Ok(host)
    }

    /// Close the browser and stop the handler.
    pub async fn close(mut self) -> Result<(), HostError> {
        let closed = self.browser.close().await;
        self.handler.abort();
        closed
            .map(drop)
            .map_err(|err| HostError::Protocol(err.to_string()))
    }
}
