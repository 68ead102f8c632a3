//! Facade identifiers and the orientation → facade mapping.
//!
//! The building exterior is shown from four sides. Apartment orientations use
//! eight compass points, which fold onto the four facades:
//!
//! | Orientation | Facade |
//! |-------------|--------|
//! | S, SW       | A      |
//! | W, NW       | B      |
//! | N, NE       | C      |
//! | E, SE       | D      |
//!
//! Anything else, including a missing orientation, shows on facade `A`.

use crate::catalog::{Apartment, Building};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four building sides
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacadeId {
    /// South
    #[default]
    A,
    /// West
    B,
    /// North
    C,
    /// East
    D,
}

impl FacadeId {
    /// All facades in rotation order
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// The facade after this one, wrapping D → A
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::C,
            Self::C => Self::D,
            Self::D => Self::A,
        }
    }

    /// The facade before this one, wrapping A → D
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::A => Self::D,
            Self::B => Self::A,
            Self::C => Self::B,
            Self::D => Self::C,
        }
    }

    /// Compass label used in prompts
    #[must_use]
    pub const fn compass_label(self) -> &'static str {
        match self {
            Self::A => "South (S, SW)",
            Self::B => "West (W, NW)",
            Self::C => "North (N, NE)",
            Self::D => "East (E, SE)",
        }
    }
}

impl fmt::Display for FacadeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        f.write_str(letter)
    }
}

/// Error returned when a string is not a facade letter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a facade identifier: {0:?}")]
pub struct ParseFacadeError(pub String);

impl FromStr for FacadeId {
    type Err = ParseFacadeError;

    /// Accepts exactly `A`, `B`, `C` or `D`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(ParseFacadeError(other.to_string())),
        }
    }
}

/// Map a compass orientation to the facade it is visible from
///
/// Total: unknown or absent orientations map to [`FacadeId::A`]. Surrounding
/// whitespace and letter case are ignored.
#[must_use]
pub fn facade_for_orientation(orientation: Option<&str>) -> FacadeId {
    let Some(orientation) = orientation else {
        return FacadeId::A;
    };

    match orientation.trim().to_ascii_uppercase().as_str() {
        "W" | "NW" => FacadeId::B,
        "N" | "NE" => FacadeId::C,
        "E" | "SE" => FacadeId::D,
        // S, SW and everything unrecognized
        _ => FacadeId::A,
    }
}

/// Apartments visible from `facade`
pub fn apartments_on_facade<'a, I>(apartments: I, facade: FacadeId) -> Vec<&'a Apartment>
where
    I: IntoIterator<Item = &'a Apartment>,
{
    apartments
        .into_iter()
        .filter(|apartment| facade_for_orientation(apartment.orientation.as_deref()) == facade)
        .collect()
}

/// Case-insensitive lookup by apartment code across every building and floor
///
/// Returns the first match in catalog order.
#[must_use]
pub fn find_apartment_by_code<'a>(buildings: &'a [Building], code: &str) -> Option<&'a Apartment> {
    buildings
        .iter()
        .flat_map(|building| building.floors.iter())
        .flat_map(|floor| floor.apartments.iter())
        .find(|apartment| apartment.code.eq_ignore_ascii_case(code))
}

/// Every apartment of every building, in catalog order
#[must_use]
pub fn all_apartments(buildings: &[Building]) -> Vec<&Apartment> {
    buildings
        .iter()
        .flat_map(|building| building.floors.iter())
        .flat_map(|floor| floor.apartments.iter())
        .collect()
}
