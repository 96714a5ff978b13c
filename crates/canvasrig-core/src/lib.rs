#![forbid(unsafe_code)]

//! Core data for driving canvas-rendered applications from the outside.
//!
//! Nothing in this crate talks to a browser. It holds the two pieces of
//! pure data every interaction needs:
//!
//! - [`geometry`]: the surface rectangle, normalized positions and the
//!   linear projection between them.
//! - [`layout`]: named, calibrated positions of the target's controls.
//!
//! The async machinery that locates surfaces and dispatches input lives in
//! `canvasrig-harness`.

pub mod geometry;
pub mod layout;

pub use geometry::{NormalizedPosition, Point, ReferenceFrame, SurfaceRect};
pub use layout::{AvatarSlot, Control, LayoutEntry, LayoutError, LayoutGroup, MenuButton, Tribe};
