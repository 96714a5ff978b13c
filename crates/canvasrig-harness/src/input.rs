#![forbid(unsafe_code)]

//! Primitive input events, addressed by absolute viewport coordinates.
//!
//! These are the only events the harness ever asks a host to dispatch.
//! Pointer and touch are distinct channels: targets may branch on input
//! source, so a tap is never emulated with a click or vice versa.

use canvasrig_core::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Move,
    Down,
    Up,
}

/// One low-level pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub phase: PointerPhase,
    /// Button pressed, released, or held while moving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<PointerButton>,
    pub at: Point,
}

/// Input the harness asks a host to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    /// Raw pointer sample (used to compose drags).
    Pointer(PointerInput),
    /// Complete click: move, press and release at one point.
    Click { at: Point, button: PointerButton },
    /// Complete touch tap: touch start and end at one point.
    Tap { at: Point },
}

impl InputEvent {
    /// Pointer move with no button held.
    pub const fn move_to(at: Point) -> Self {
        Self::Pointer(PointerInput {
            phase: PointerPhase::Move,
            button: None,
            at,
        })
    }

    /// Pointer move while the left button is held.
    pub const fn drag_to(at: Point) -> Self {
        Self::Pointer(PointerInput {
            phase: PointerPhase::Move,
            button: Some(PointerButton::Left),
            at,
        })
    }

    pub const fn down(at: Point) -> Self {
        Self::Pointer(PointerInput {
            phase: PointerPhase::Down,
            button: Some(PointerButton::Left),
            at,
        })
    }

    pub const fn up(at: Point) -> Self {
        Self::Pointer(PointerInput {
            phase: PointerPhase::Up,
            button: Some(PointerButton::Left),
            at,
        })
    }

    pub const fn click(at: Point) -> Self {
        Self::Click {
            at,
            button: PointerButton::Left,
        }
    }

    pub const fn tap(at: Point) -> Self {
        Self::Tap { at }
    }

    /// Where the event lands.
    pub const fn position(&self) -> Point {
        match self {
            Self::Pointer(pointer) => pointer.at,
            Self::Click { at, .. } | Self::Tap { at } => *at,
        }
    }

    /// Whether this is a bare pointer move (with or without a held button).
    pub fn is_pointer_move(&self) -> bool {
        matches!(
            self,
            Self::Pointer(PointerInput {
                phase: PointerPhase::Move,
                ..
            })
        )
    }
}
