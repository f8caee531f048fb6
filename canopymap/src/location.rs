//! Location model for map rendering.
//!
//! A [`Location`] is plain data describing a point of interest: identity,
//! display name, WGS84 coordinates, and optional sponsorship attributes.
//! Locations are immutable per reconciliation pass; when attributes change the
//! caller supplies a new list and the synchronizer treats it as a value
//! replacement keyed by [`LocationId`].
//!
//! Validation happens only at the boundary via [`validate_locations`]. The
//! engine itself never sanitizes input: a single invalid entry is a caller
//! contract violation, and the reconciliation pass skips it rather than
//! abandoning the remaining valid entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a location within one list.
///
/// No two locations in a single list may share an id. The Marker Set is keyed
/// by this type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LocationId(pub u32);

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A geographic point of interest supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identity within the supplied list.
    pub id: LocationId,
    /// Display name shown in marker overlays.
    pub name: String,
    /// Latitude in degrees, [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, [-180, 180].
    pub lng: f64,
    /// Trees planted at this project, if known.
    pub trees: Option<u32>,
    /// Region or country label, if known.
    pub area: Option<String>,
}

impl Location {
    /// Create a location with the required fields.
    pub fn new(id: u32, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: LocationId(id),
            name: name.into(),
            lat,
            lng,
            trees: None,
            area: None,
        }
    }

    /// Set the tree count.
    pub fn with_trees(mut self, trees: u32) -> Self {
        self.trees = Some(trees);
        self
    }

    /// Set the region/country label.
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    /// Coordinates as a `(lat, lng)` pair.
    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Whether both coordinates are finite and within WGS84 range.
    pub fn has_valid_coords(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({:.4}, {:.4})", self.id, self.name, self.lat, self.lng)
    }
}

/// Caller contract violations detectable at the input boundary.
#[derive(Debug, Error, PartialEq)]
pub enum LocationError {
    /// Two locations in one list share an id.
    #[error("duplicate location id {0}")]
    DuplicateId(LocationId),

    /// Coordinates are non-finite or outside WGS84 range.
    #[error("invalid coordinates ({lat}, {lng}) for location {id}")]
    InvalidCoordinates { id: LocationId, lat: f64, lng: f64 },
}

/// Check a location list for caller contract violations.
///
/// Returns the first violation found. This is a convenience for callers; the
/// adapters do not require it and tolerate invalid single entries by skipping
/// them during reconciliation.
pub fn validate_locations(locations: &[Location]) -> Result<(), LocationError> {
    let mut seen = std::collections::HashSet::new();
    for loc in locations {
        if !seen.insert(loc.id) {
            return Err(LocationError::DuplicateId(loc.id));
        }
        if !loc.has_valid_coords() {
            return Err(LocationError::InvalidCoordinates {
                id: loc.id,
                lat: loc.lat,
                lng: loc.lng,
            });
        }
    }
    Ok(())
}

/// The built-in global impact list shown on the product's landing page.
///
/// Six flagship forest projects with tree counts, used by the CLI demo and as
/// fixture data in tests.
pub fn demo_locations() -> Vec<Location> {
    vec![
        Location::new(1, "Amazon Rainforest", -3.4653, -62.2159)
            .with_trees(15_000)
            .with_area("Brazil"),
        Location::new(2, "Borneo Forest", 0.9619, 114.5548)
            .with_trees(8_500)
            .with_area("Indonesia"),
        Location::new(3, "Taiga Forest", 60.0, 105.0)
            .with_trees(12_000)
            .with_area("Russia"),
        Location::new(4, "Congo Basin", -0.7832, 23.6558)
            .with_trees(9_800)
            .with_area("Congo"),
        Location::new(5, "Great Bear Rainforest", 52.8821, -128.1561)
            .with_trees(7_200)
            .with_area("Canada"),
        Location::new(6, "Daintree Rainforest", -16.25, 145.4167)
            .with_trees(5_600)
            .with_area("Australia"),
    ]
}
