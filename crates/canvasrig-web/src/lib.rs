#![forbid(unsafe_code)]

//! Chromium binding for the canvasrig harness.
//!
//! [`WebRig`] launches a browser configured for software WebGL and hands
//! out [`CdpHost`] pages, each of which implements
//! [`canvasrig_harness::SurfaceHost`]:
//!
//! ```ignore
//! let rig = WebRig::launch(LaunchConfig::from_env()).await?;
//! let mut host = rig.open_blank().await?;
//! let mut session = Session::new(host, HarnessConfig::from_env());
//! session.start_diagnostics().await?;
//! session.host_mut().goto("http://localhost:8000").await?;
//! session.await_ready().await?;
//! ```

pub mod cdp;
pub mod launch;
pub mod scripts;

pub use cdp::{CdpHost, InputCommand, input_commands};
pub use launch::{GL_ARGS, LaunchConfig, WebRig};
