//! Classifier intents.
//!
//! The classifier replies with an [`IntentEnvelope`]: a type tag and an
//! untyped parameter object. [`IntentEnvelope::to_intent`] turns that into the
//! typed [`Intent`], applying the lenient parameter rules once so the
//! dispatcher can match on plain Rust values.

use crate::catalog::{Apartment, ApartmentType};
use crate::facade::FacadeId;
use crate::state::RoomType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Confidence assumed when the classifier omits it
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Intent errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// The type tag is not one the showroom understands
    #[error("unknown intent type: {0:?}")]
    UnknownType(String),
}

/// Intent as it travels on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentEnvelope {
    /// Intent type tag (`rotate_building`, `show_apartment`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific parameters
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Reply to show the user
    #[serde(default)]
    pub response_text: String,
    /// Classifier confidence in `[0, 1]`
    pub confidence: f64,
}

impl IntentEnvelope {
    /// Convert to the typed form
    ///
    /// Parameters are read leniently: a missing or malformed parameter becomes
    /// `None` (or the documented default) rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::UnknownType`] if the type tag is not recognized.
    pub fn to_intent(&self) -> Result<Intent, IntentError> {
        let params = &self.params;
        let intent = match self.kind.as_str() {
            "rotate_building" => Intent::RotateBuilding {
                direction: string_param(params, "direction")
                    .map_or(RotateDirection::Next, |d| RotateDirection::parse(&d)),
            },
            "show_apartment" => Intent::ShowApartment {
                apartment_code: string_param(params, "apartmentCode"),
            },
            "enter_apartment" => Intent::EnterApartment,
            "show_room" => Intent::ShowRoom {
                room: string_param(params, "room").and_then(|r| r.parse().ok()),
            },
            "go_back" => Intent::GoBack,
            "list_available" => Intent::ListAvailable {
                filter: params
                    .get("filter")
                    .and_then(Value::as_object)
                    .map(ListFilter::from_params)
                    .unwrap_or_default(),
            },
            "describe_element" => Intent::DescribeElement {
                element: string_param(params, "element"),
            },
            "general_info" => Intent::GeneralInfo {
                topic: string_param(params, "topic"),
            },
            other => return Err(IntentError::UnknownType(other.to_string())),
        };
        Ok(intent)
    }
}

/// Rotation target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotateDirection {
    /// One facade forward
    Next,
    /// One facade back
    Prev,
    /// A specific facade
    To(FacadeId),
}

impl RotateDirection {
    /// `next`, `prev`, or a facade letter; anything else means `Next`
    #[must_use]
    pub fn parse(direction: &str) -> Self {
        match direction {
            "next" => Self::Next,
            "prev" => Self::Prev,
            other => other.parse().map_or(Self::Next, Self::To),
        }
    }
}

/// Optional constraints of a `list_available` request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListFilter {
    /// Layout class
    pub kind: Option<ApartmentType>,
    /// Minimum area in m²
    pub min_area: Option<f64>,
    /// Maximum price in euros
    pub max_price: Option<f64>,
}

impl ListFilter {
    fn from_params(params: &Map<String, Value>) -> Self {
        Self {
            kind: string_param(params, "type").and_then(|t| t.parse().ok()),
            min_area: params.get("minArea").and_then(Value::as_f64),
            max_price: params.get("maxPrice").and_then(Value::as_f64),
        }
    }

    /// Whether `apartment` satisfies every constraint that is set
    #[must_use]
    pub fn matches(&self, apartment: &Apartment) -> bool {
        self.kind.is_none_or(|kind| apartment.kind == kind)
            && self.min_area.is_none_or(|min| apartment.area_m2 >= min)
            && self.max_price.is_none_or(|max| apartment.price_eur <= max)
    }
}

/// Typed classifier intent
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Rotate the building
    RotateBuilding {
        /// Target
        direction: RotateDirection,
    },
    /// Highlight an apartment by code
    ShowApartment {
        /// Sales code, if the classifier gave one
        apartment_code: Option<String>,
    },
    /// Open the selected apartment's floor plan
    EnterApartment,
    /// Open a room panorama
    ShowRoom {
        /// Room, if recognized
        room: Option<RoomType>,
    },
    /// Step back
    GoBack,
    /// List apartments on the market
    ListAvailable {
        /// Constraints mentioned by the user
        filter: ListFilter,
    },
    /// Describe something on screen
    DescribeElement {
        /// What to describe
        element: Option<String>,
    },
    /// Answer a general question
    GeneralInfo {
        /// Question topic
        topic: Option<String>,
    },
}

impl Intent {
    /// Wire type tag
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RotateBuilding { .. } => "rotate_building",
            Self::ShowApartment { .. } => "show_apartment",
            Self::EnterApartment => "enter_apartment",
            Self::ShowRoom { .. } => "show_room",
            Self::GoBack => "go_back",
            Self::ListAvailable { .. } => "list_available",
            Self::DescribeElement { .. } => "describe_element",
            Self::GeneralInfo { .. } => "general_info",
        }
    }

    /// Whether the intent only carries information and never moves the view
    #[must_use]
    pub const fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::ListAvailable { .. } | Self::DescribeElement { .. } | Self::GeneralInfo { .. }
        )
    }
}

/// Non-empty string parameter; numbers are accepted and stringified
fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::catalog::test_fixtures::apartment;
    use serde_json::json;

    fn envelope(kind: &str, params: Value) -> IntentEnvelope {
        IntentEnvelope {
            kind: kind.to_string(),
            params: params.as_object().cloned().unwrap_or_default(),
            response_text: String::new(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    #[test]
    fn test_rotate_directions() {
        let cases = [
            (json!({"direction": "next"}), RotateDirection::Next),
            (json!({"direction": "prev"}), RotateDirection::Prev),
            (json!({"direction": "C"}), RotateDirection::To(FacadeId::C)),
            (json!({"direction": "sideways"}), RotateDirection::Next),
            (json!({}), RotateDirection::Next),
        ];
        for (params, expected) in cases {
            assert_eq!(
                envelope("rotate_building", params).to_intent(),
                Ok(Intent::RotateBuilding {
                    direction: expected
                })
            );
        }
    }

    #[test]
    fn test_apartment_code_accepts_numbers() {
        let intent = envelope("show_apartment", json!({"apartmentCode": 14})).to_intent();
        assert_eq!(
            intent,
            Ok(Intent::ShowApartment {
                apartment_code: Some("14".to_string())
            })
        );

        let intent = envelope("show_apartment", json!({"apartmentCode": "  "})).to_intent();
        assert_eq!(intent, Ok(Intent::ShowApartment { apartment_code: None }));
    }

    #[test]
    fn test_unknown_room_is_none() {
        let intent = envelope("show_room", json!({"room": "garage"})).to_intent();
        assert_eq!(intent, Ok(Intent::ShowRoom { room: None }));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let err = envelope("book_viewing", json!({})).to_intent().unwrap_err();
        assert_eq!(err, IntentError::UnknownType("book_viewing".to_string()));
    }

    #[test]
    fn test_list_filter() {
        let intent = envelope(
            "list_available",
            json!({"filter": {"type": "2br", "minArea": 60, "maxPrice": 200000}}),
        )
        .to_intent()
        .unwrap();

        let Intent::ListAvailable { filter } = intent else {
            unreachable!("list_available maps to ListAvailable");
        };
        assert_eq!(filter.kind, Some(ApartmentType::TwoBedroom));

        let mut apt = apartment("apt-1", "1", None);
        assert!(filter.matches(&apt));
        apt.price_eur = 250_000.0;
        assert!(!filter.matches(&apt));
        assert!(ListFilter::default().matches(&apt));
    }

    #[test]
    fn test_informational_intents() {
        assert!(Intent::GeneralInfo { topic: None }.is_informational());
        assert!(!Intent::GoBack.is_informational());
        assert_eq!(Intent::EnterApartment.kind(), "enter_apartment");
    }
}
