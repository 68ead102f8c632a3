//! Apartment catalog: buildings → floors → apartments.
//!
//! The catalog is owned by whoever loads it and is only ever read by the
//! showroom. The JSON form uses camelCase keys (`floorId`, `areaM2`,
//! `priceEur`, ...).

use crate::facade;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two apartments share a code (compared case-insensitively)
    #[error("duplicate apartment code {code:?} (apartments {first} and {second})")]
    DuplicateCode {
        /// The clashing code as written on the second apartment
        code: String,
        /// Id of the apartment seen first
        first: String,
        /// Id of the apartment seen second
        second: String,
    },

    /// Catalog JSON is malformed
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog file could not be read
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// File that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Sales status of an apartment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApartmentStatus {
    /// On the market
    Available,
    /// Held for a buyer
    Reserved,
    /// Gone
    Sold,
}

/// Apartment layout class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApartmentType {
    /// Single open room
    #[serde(rename = "studio")]
    Studio,
    /// One bedroom
    #[serde(rename = "1br")]
    OneBedroom,
    /// Two bedrooms
    #[serde(rename = "2br")]
    TwoBedroom,
    /// Three bedrooms
    #[serde(rename = "3br")]
    ThreeBedroom,
    /// Top-floor unit
    #[serde(rename = "penthouse")]
    Penthouse,
}

impl ApartmentType {
    /// Wire code (`studio`, `1br`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Studio => "studio",
            Self::OneBedroom => "1br",
            Self::TwoBedroom => "2br",
            Self::ThreeBedroom => "3br",
            Self::Penthouse => "penthouse",
        }
    }
}

impl fmt::Display for ApartmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApartmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "studio" => Ok(Self::Studio),
            "1br" => Ok(Self::OneBedroom),
            "2br" => Ok(Self::TwoBedroom),
            "3br" => Ok(Self::ThreeBedroom),
            "penthouse" => Ok(Self::Penthouse),
            other => Err(format!("unknown apartment type: {other}")),
        }
    }
}

/// A single apartment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    /// Catalog id
    pub id: String,
    /// Owning floor id
    pub floor_id: String,
    /// Sales code shown to buyers, unique per catalog
    pub code: String,
    /// Layout class
    #[serde(rename = "type")]
    pub kind: ApartmentType,
    /// Human label for the layout ("Two-bedroom", ...)
    pub type_label: String,
    /// Net area in square metres
    pub area_m2: f64,
    /// Asking price in euros
    pub price_eur: f64,
    /// Room count
    pub rooms: u32,
    /// Bathroom count
    pub bathrooms: u32,
    /// Sales status
    pub status: ApartmentStatus,
    /// Compass orientation (S, SW, W, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// Selling points
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Apartment {
    /// Whether the apartment can still be bought
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ApartmentStatus::Available
    }

    /// Facade the apartment is visible from
    #[must_use]
    pub fn facade(&self) -> facade::FacadeId {
        facade::facade_for_orientation(self.orientation.as_deref())
    }
}

/// One storey of a building
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    /// Catalog id
    pub id: String,
    /// Owning building id
    pub building_id: String,
    /// Storey number, ground floor is 0
    pub floor_number: i32,
    /// Display name
    pub name: String,
    /// Short label ("GF", "P1", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Apartments on this floor
    #[serde(default)]
    pub apartments: Vec<Apartment>,
}

/// A building of the project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Floors, lowest first
    #[serde(default)]
    pub floors: Vec<Floor>,
}

/// An apartment together with the floor and building that contain it
#[derive(Clone, Copy, Debug)]
pub struct ApartmentLocation<'a> {
    /// Containing building
    pub building: &'a Building,
    /// Containing floor
    pub floor: &'a Floor,
    /// The apartment
    pub apartment: &'a Apartment,
}

/// Validated, read-only apartment catalog
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    buildings: Vec<Building>,
}

impl Catalog {
    /// Wrap `buildings`, rejecting duplicate apartment codes
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateCode`] if two apartments share a code
    /// ignoring ASCII case.
    pub fn new(buildings: Vec<Building>) -> Result<Self, CatalogError> {
        let mut seen: HashMap<String, String> = HashMap::new();
        for apartment in facade::all_apartments(&buildings) {
            let key = apartment.code.to_ascii_lowercase();
            if let Some(first) = seen.insert(key, apartment.id.clone()) {
                return Err(CatalogError::DuplicateCode {
                    code: apartment.code.clone(),
                    first,
                    second: apartment.id.clone(),
                });
            }
        }

        tracing::debug!(
            buildings = buildings.len(),
            apartments = seen.len(),
            "Catalog loaded"
        );
        Ok(Self { buildings })
    }

    /// Parse a JSON array of buildings
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] for malformed input and
    /// [`CatalogError::DuplicateCode`] for clashing codes.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let buildings: Vec<Building> = serde_json::from_str(json)?;
        Self::new(buildings)
    }

    /// Read and parse a JSON catalog file
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise the
    /// errors of [`Catalog::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// All buildings
    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// First building, used as the initial selection
    #[must_use]
    pub fn first_building_id(&self) -> Option<&str> {
        self.buildings.first().map(|b| b.id.as_str())
    }

    /// Every apartment in catalog order
    #[must_use]
    pub fn apartments(&self) -> Vec<&Apartment> {
        facade::all_apartments(&self.buildings)
    }

    /// Case-insensitive lookup by code
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Apartment> {
        facade::find_apartment_by_code(&self.buildings, code)
    }

    /// Case-insensitive lookup by code, with the containing floor and building
    #[must_use]
    pub fn locate(&self, code: &str) -> Option<ApartmentLocation<'_>> {
        self.locations()
            .find(|location| location.apartment.code.eq_ignore_ascii_case(code))
    }

    /// Apartments still on the market, in catalog order
    #[must_use]
    pub fn available(&self) -> Vec<ApartmentLocation<'_>> {
        self.locations()
            .filter(|location| location.apartment.is_available())
            .collect()
    }

    fn locations(&self) -> impl Iterator<Item = ApartmentLocation<'_>> {
        self.buildings.iter().flat_map(|building| {
            building.floors.iter().flat_map(move |floor| {
                floor.apartments.iter().map(move |apartment| ApartmentLocation {
                    building,
                    floor,
                    apartment,
                })
            })
        })
    }
}
