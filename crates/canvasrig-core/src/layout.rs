#![forbid(unsafe_code)]

//! Calibrated control positions of the target application.
//!
//! Every position here was measured against a 1280×720 surface
//! ([`CALIBRATION`]) and is only meaningful for surfaces with that aspect
//! ratio. Recalibrating for another reference means replacing this table;
//! no other component encodes positions.
//!
//! Entries are addressable three ways:
//!
//! - typed: `Tribe::Judah.position()`
//! - by group and name: `lookup_in(LayoutGroup::Tribe, "judah")`
//! - by qualified name: `lookup("tribe.judah")`

use std::fmt;
use std::str::FromStr;

use crate::geometry::{NormalizedPosition, ReferenceFrame};

/// Surface size the tables below were measured on.
pub const CALIBRATION: ReferenceFrame = ReferenceFrame::new(1280, 720);

/// Column centers of the tribe grid, left to right.
pub const TRIBE_COLUMN_X: [f64; 3] = [0.105, 0.240, 0.375];
/// Row centers of the tribe grid, top to bottom.
pub const TRIBE_ROW_Y: [f64; 4] = [0.235, 0.321, 0.407, 0.493];

/// Column centers of the avatar picker.
pub const AVATAR_COLUMN_X: [f64; 2] = [0.615, 0.820];
/// Row centers of the avatar picker.
pub const AVATAR_ROW_Y: [f64; 2] = [0.35, 0.52];

/// Errors from name-based lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The group part of a qualified name is not a known group.
    UnknownGroup(String),
    /// The group exists but has no entry with this name.
    UnknownEntry { group: LayoutGroup, name: String },
    /// A qualified name without the `group.entry` shape.
    Malformed(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGroup(group) => write!(f, "unknown layout group '{group}'"),
            Self::UnknownEntry { group, name } => {
                write!(f, "no entry '{name}' in layout group '{group}'")
            }
            Self::Malformed(raw) => {
                write!(f, "malformed layout name '{raw}' (expected group.entry)")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// One of the four registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutGroup {
    /// Main menu buttons.
    Menu,
    /// The 3×4 tribe selection grid.
    Tribe,
    /// The 2×2 avatar picker.
    Avatar,
    /// Standalone controls.
    Control,
}

impl LayoutGroup {
    pub const ALL: [LayoutGroup; 4] = [Self::Menu, Self::Tribe, Self::Avatar, Self::Control];

    /// Stable lowercase name used in qualified lookups.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Tribe => "tribe",
            Self::Avatar => "avatar",
            Self::Control => "control",
        }
    }

    /// All entries in this group, in authoring order.
    pub fn entries(self) -> &'static [LayoutEntry] {
        match self {
            Self::Menu => &MENU_ENTRIES,
            Self::Tribe => &TRIBE_ENTRIES,
            Self::Avatar => &AVATAR_ENTRIES,
            Self::Control => &CONTROL_ENTRIES,
        }
    }
}

impl fmt::Display for LayoutGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutGroup {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| LayoutError::UnknownGroup(s.to_string()))
    }
}

/// A named, calibrated position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEntry {
    pub group: LayoutGroup,
    pub name: &'static str,
    pub position: NormalizedPosition,
}

impl LayoutEntry {
    const fn new(group: LayoutGroup, name: &'static str, position: NormalizedPosition) -> Self {
        Self {
            group,
            name,
            position,
        }
    }

    /// `group.name`, the form accepted by [`lookup`].
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.group.as_str(), self.name)
    }
}

/// Main menu buttons, a single centered column.
///
/// `Continue` and `StartWithSave` only appear when a save exists; they reuse
/// the slots of `Start` and `VerseVault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuButton {
    Start,
    VerseVault,
    Multiplayer,
    Support,
    Quit,
    Continue,
    StartWithSave,
}

impl MenuButton {
    pub const ALL: [MenuButton; 7] = [
        Self::Start,
        Self::VerseVault,
        Self::Multiplayer,
        Self::Support,
        Self::Quit,
        Self::Continue,
        Self::StartWithSave,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::VerseVault => "verse_vault",
            Self::Multiplayer => "multiplayer",
            Self::Support => "support",
            Self::Quit => "quit",
            Self::Continue => "continue",
            Self::StartWithSave => "start_with_save",
        }
    }

    pub const fn position(self) -> NormalizedPosition {
        let y = match self {
            Self::Start | Self::Continue => 0.618,
            Self::VerseVault | Self::StartWithSave => 0.702,
            Self::Multiplayer => 0.788,
            Self::Support => 0.874,
            Self::Quit => 0.960,
        };
        NormalizedPosition::new(0.50, y)
    }
}

/// Tribe grid cells, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tribe {
    Reuben,
    Simeon,
    Levi,
    Judah,
    Dan,
    Naphtali,
    Gad,
    Asher,
    Issachar,
    Zebulun,
    Joseph,
    Benjamin,
}

impl Tribe {
    pub const ALL: [Tribe; 12] = [
        Self::Reuben,
        Self::Simeon,
        Self::Levi,
        Self::Judah,
        Self::Dan,
        Self::Naphtali,
        Self::Gad,
        Self::Asher,
        Self::Issachar,
        Self::Zebulun,
        Self::Joseph,
        Self::Benjamin,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Reuben => "reuben",
            Self::Simeon => "simeon",
            Self::Levi => "levi",
            Self::Judah => "judah",
            Self::Dan => "dan",
            Self::Naphtali => "naphtali",
            Self::Gad => "gad",
            Self::Asher => "asher",
            Self::Issachar => "issachar",
            Self::Zebulun => "zebulun",
            Self::Joseph => "joseph",
            Self::Benjamin => "benjamin",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    /// Grid row, `0..4`.
    pub const fn row(self) -> usize {
        self.index() / TRIBE_COLUMN_X.len()
    }

    /// Grid column, `0..3`.
    pub const fn column(self) -> usize {
        self.index() % TRIBE_COLUMN_X.len()
    }

    /// The tribe at a grid cell, if the cell exists.
    pub const fn at(row: usize, column: usize) -> Option<Tribe> {
        if row >= TRIBE_ROW_Y.len() || column >= TRIBE_COLUMN_X.len() {
            return None;
        }
        Some(Self::ALL[row * TRIBE_COLUMN_X.len() + column])
    }

    pub const fn position(self) -> NormalizedPosition {
        NormalizedPosition::new(TRIBE_COLUMN_X[self.column()], TRIBE_ROW_Y[self.row()])
    }
}

/// Avatar picker corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvatarSlot {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl AvatarSlot {
    pub const ALL: [AvatarSlot; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopRight => "top_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomRight => "bottom_right",
        }
    }

    pub const fn position(self) -> NormalizedPosition {
        let (column, row) = match self {
            Self::TopLeft => (0, 0),
            Self::TopRight => (1, 0),
            Self::BottomLeft => (0, 1),
            Self::BottomRight => (1, 1),
        };
        NormalizedPosition::new(AVATAR_COLUMN_X[column], AVATAR_ROW_Y[row])
    }
}

/// Standalone single-position controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Confirms the avatar selection.
    AvatarConfirm,
    /// Returns to the previous screen.
    BackToMenu,
}

impl Control {
    pub const ALL: [Control; 2] = [Self::AvatarConfirm, Self::BackToMenu];

    pub const fn name(self) -> &'static str {
        match self {
            Self::AvatarConfirm => "avatar_confirm",
            Self::BackToMenu => "back_to_menu",
        }
    }

    pub const fn position(self) -> NormalizedPosition {
        match self {
            Self::AvatarConfirm => NormalizedPosition::new(0.88, 0.93),
            Self::BackToMenu => NormalizedPosition::new(0.07, 0.06),
        }
    }
}

macro_rules! entry_table {
    ($group:expr, $kind:ident, $len:literal) => {{
        let mut table = [LayoutEntry::new($group, "", NormalizedPosition::ORIGIN); $len];
        let mut i = 0;
        while i < $len {
            let item = $kind::ALL[i];
            table[i] = LayoutEntry::new($group, item.name(), item.position());
            i += 1;
        }
        table
    }};
}

static MENU_ENTRIES: [LayoutEntry; 7] = entry_table!(LayoutGroup::Menu, MenuButton, 7);
static TRIBE_ENTRIES: [LayoutEntry; 12] = entry_table!(LayoutGroup::Tribe, Tribe, 12);
static AVATAR_ENTRIES: [LayoutEntry; 4] = entry_table!(LayoutGroup::Avatar, AvatarSlot, 4);
static CONTROL_ENTRIES: [LayoutEntry; 2] = entry_table!(LayoutGroup::Control, Control, 2);

/// Every entry across all groups.
pub fn entries() -> impl Iterator<Item = &'static LayoutEntry> {
    LayoutGroup::ALL
        .into_iter()
        .flat_map(|group| group.entries().iter())
}

/// Find an entry by group and name.
pub fn lookup_in(group: LayoutGroup, name: &str) -> Result<NormalizedPosition, LayoutError> {
    group
        .entries()
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.position)
        .ok_or_else(|| LayoutError::UnknownEntry {
            group,
            name: name.to_string(),
        })
}

/// Find an entry by qualified `group.entry` name.
pub fn lookup(qualified: &str) -> Result<NormalizedPosition, LayoutError> {
    let Some((group, name)) = qualified.split_once('.') else {
        return Err(LayoutError::Malformed(qualified.to_string()));
    };
    if name.is_empty() {
        return Err(LayoutError::Malformed(qualified.to_string()));
    }
    lookup_in(group.parse()?, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn group_sizes() {
        assert_eq!(LayoutGroup::Menu.entries().len(), 7);
        assert_eq!(LayoutGroup::Tribe.entries().len(), 12);
        assert_eq!(LayoutGroup::Avatar.entries().len(), 4);
        assert_eq!(LayoutGroup::Control.entries().len(), 2);
        assert_eq!(entries().count(), 25);
    }

    #[test]
    fn tribe_grid_is_row_major() {
        assert_eq!(Tribe::Reuben.position(), NormalizedPosition::new(0.105, 0.235));
        assert_eq!(Tribe::Levi.position(), NormalizedPosition::new(0.375, 0.235));
        assert_eq!(Tribe::Judah.position(), NormalizedPosition::new(0.105, 0.321));
        assert_eq!(Tribe::Benjamin.position(), NormalizedPosition::new(0.375, 0.493));
        for tribe in Tribe::ALL {
            assert_eq!(Tribe::at(tribe.row(), tribe.column()), Some(tribe));
        }
        assert_eq!(Tribe::at(4, 0), None);
        assert_eq!(Tribe::at(0, 3), None);
    }

    #[test]
    fn menu_is_single_column() {
        for button in MenuButton::ALL {
            assert_eq!(button.position().x, 0.50);
        }
        assert_eq!(MenuButton::Continue.position(), MenuButton::Start.position());
        assert_eq!(MenuButton::Quit.position().y, 0.960);
    }

    #[test]
    fn avatar_corners() {
        assert_eq!(AvatarSlot::TopLeft.position(), NormalizedPosition::new(0.615, 0.35));
        assert_eq!(AvatarSlot::BottomRight.position(), NormalizedPosition::new(0.820, 0.52));
    }

    #[test]
    fn qualified_lookup() {
        assert_eq!(lookup("tribe.judah"), Ok(Tribe::Judah.position()));
        assert_eq!(lookup("control.back_to_menu"), Ok(Control::BackToMenu.position()));
        assert_eq!(
            lookup("tribe.ephraim"),
            Err(LayoutError::UnknownEntry {
                group: LayoutGroup::Tribe,
                name: "ephraim".into()
            })
        );
        assert_eq!(lookup("hud.start"), Err(LayoutError::UnknownGroup("hud".into())));
        assert_eq!(lookup("start"), Err(LayoutError::Malformed("start".into())));
        assert_eq!(lookup("menu."), Err(LayoutError::Malformed("menu.".into())));
    }

    #[test]
    fn qualified_names_round_trip_through_lookup() {
        for entry in entries() {
            assert_eq!(lookup(&entry.qualified_name()), Ok(entry.position));
        }
    }

    #[test]
    fn every_entry_is_on_surface() {
        assert!(entries().all(|entry| entry.position.is_within_unit()));
    }
}
