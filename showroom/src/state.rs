//! Showroom view state and the actions that drive it.

use crate::facade::FacadeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowroomView {
    /// Whole building, one facade facing the viewer
    #[default]
    Building,
    /// Building with one apartment highlighted
    FacadeHighlight,
    /// Apartment floor plan
    FloorPlan,
    /// 360° room panorama
    Panorama,
}

impl fmt::Display for ShowroomView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Building => "building",
            Self::FacadeHighlight => "facade_highlight",
            Self::FloorPlan => "floor_plan",
            Self::Panorama => "panorama",
        })
    }
}

/// Animation style of a transition; descriptive only
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// Facade rotation
    Rotate,
    /// Into the floor plan
    ZoomIn,
    /// Out of the floor plan
    ZoomOut,
    /// Cross-fade
    Fade,
    /// No transition running
    #[default]
    None,
}

/// Room shown in panorama view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// Living room
    Living,
    /// Bedroom
    Bedroom,
    /// Kitchen
    Kitchen,
    /// Bathroom
    Bathroom,
}

impl RoomType {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Living => "living",
            Self::Bedroom => "bedroom",
            Self::Kitchen => "kitchen",
            Self::Bathroom => "bathroom",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "living" => Ok(Self::Living),
            "bedroom" => Ok(Self::Bedroom),
            "kitchen" => Ok(Self::Kitchen),
            "bathroom" => Ok(Self::Bathroom),
            other => Err(format!("unknown room: {other}")),
        }
    }
}

/// Identifies one transition start
///
/// The settle message scheduled by a transition carries its token, so a late
/// settle from an older transition can be told apart from the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionToken(pub u64);

/// A running transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Animation style
    pub kind: TransitionType,
    /// Token of the start that created it
    pub token: TransitionToken,
}

/// A previously visited view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The view
    pub view: ShowroomView,
    /// Room that was open, for panorama entries
    pub room: Option<RoomType>,
}

/// Showroom view state
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowroomState {
    /// Active screen
    pub current_view: ShowroomView,
    /// Facade facing the viewer
    pub current_facade: FacadeId,
    /// Facade before the last rotation, for rotation visuals
    pub previous_facade: Option<FacadeId>,
    /// Selected building id
    pub selected_building_id: Option<String>,
    /// Selected apartment id
    pub selected_apartment_id: Option<String>,
    /// Floor of the selected apartment
    pub selected_floor_id: Option<String>,
    /// Open room; only set in [`ShowroomView::Panorama`]
    pub selected_room: Option<RoomType>,
    /// Running transition, if any
    pub transition: Option<Transition>,
    /// Views to return to, most recent last
    pub history: Vec<HistoryEntry>,
    /// Next transition token to hand out; survives [`ShowroomAction::Reset`]
    #[serde(skip)]
    pub(crate) next_token: u64,
}

impl ShowroomState {
    /// Initial state with `building_id` pre-selected
    #[must_use]
    pub fn initial(building_id: Option<String>) -> Self {
        Self {
            selected_building_id: building_id,
            ..Self::default()
        }
    }

    /// Whether a transition is running
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Style of the running transition, [`TransitionType::None`] when idle
    #[must_use]
    pub fn transition_type(&self) -> TransitionType {
        self.transition.map_or(TransitionType::None, |t| t.kind)
    }

    /// Token of the running transition
    #[must_use]
    pub fn transition_token(&self) -> Option<TransitionToken> {
        self.transition.map(|t| t.token)
    }

    /// Whether [`ShowroomAction::GoBack`] would do anything
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }
}

/// Showroom actions
#[derive(Clone, Debug, PartialEq)]
pub enum ShowroomAction {
    /// Rotate to a specific facade
    RotateTo(FacadeId),
    /// Rotate one facade forward (A → B → C → D → A)
    RotateNext,
    /// Rotate one facade back
    RotatePrev,
    /// Highlight an apartment on its facade
    ShowApartment {
        /// Building to select, when known
        building_id: Option<String>,
        /// Apartment to select
        apartment_id: String,
        /// Floor of the apartment
        floor_id: String,
        /// Facade the apartment is visible from
        facade: FacadeId,
    },
    /// Open the floor plan of the selected apartment
    EnterApartment,
    /// Open a room panorama
    ShowRoom(RoomType),
    /// Return to the previous view
    GoBack,
    /// Return to the initial state
    Reset,
    /// A transition's settle delay elapsed
    TransitionSettled {
        /// Token of the transition that scheduled it
        token: TransitionToken,
    },
}

impl ShowroomAction {
    /// Whether this is one of the rotation actions
    #[must_use]
    pub const fn is_rotation(&self) -> bool {
        matches!(self, Self::RotateTo(_) | Self::RotateNext | Self::RotatePrev)
    }

    /// Whether this is a user-facing navigation action
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        !matches!(self, Self::Reset | Self::TransitionSettled { .. })
    }
}
