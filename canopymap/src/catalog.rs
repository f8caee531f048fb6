//! Planting-organization catalog.
//!
//! The product's map page pairs the map with a sidebar of planting
//! organizations; selecting one highlights its project location on the map.
//! This module holds that catalog: plain data plus pure search/filter
//! functions and the derivation of a [`Location`] list for the map, keyed by
//! organization id so the caller can forward the selected org id as the
//! highlight.

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Kind of planting organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgKind {
    /// Non-governmental organization.
    Ngo,
    /// Government agency or ministry program.
    Government,
    /// Community- or indigenous-led initiative.
    Community,
}

impl std::fmt::Display for OrgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrgKind::Ngo => write!(f, "NGO"),
            OrgKind::Government => write!(f, "Government"),
            OrgKind::Community => write!(f, "Community"),
        }
    }
}

impl std::str::FromStr for OrgKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ngo" => Ok(OrgKind::Ngo),
            "government" => Ok(OrgKind::Government),
            "community" => Ok(OrgKind::Community),
            other => Err(format!("unknown organization kind: {other}")),
        }
    }
}

/// A planting organization and its flagship project site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Catalog identity; doubles as the map location id.
    pub id: u32,
    /// Organization name.
    pub name: String,
    /// Kind of organization.
    pub kind: OrgKind,
    /// Human-readable region label.
    pub region: String,
    /// Latitude of the flagship project site.
    pub lat: f64,
    /// Longitude of the flagship project site.
    pub lng: f64,
    /// Total trees planted to date.
    pub trees_planted: u32,
    /// Short description of the organization's work.
    pub description: String,
    /// Year the organization was founded.
    pub year_founded: u16,
}

impl Organization {
    /// Derive the map location for this organization's project site.
    pub fn to_location(&self) -> Location {
        Location::new(self.id, self.name.clone(), self.lat, self.lng)
            .with_trees(self.trees_planted)
            .with_area(self.region.clone())
    }
}

/// The built-in organization catalog.
pub fn organizations() -> Vec<Organization> {
    vec![
        Organization {
            id: 1,
            name: "Green Earth Initiative".into(),
            kind: OrgKind::Ngo,
            region: "Amazon Basin, Brazil".into(),
            lat: -3.4653,
            lng: -62.2159,
            trees_planted: 150_000,
            description: "Focused on restoring deforested areas in the Amazon rainforest.".into(),
            year_founded: 2008,
        },
        Organization {
            id: 2,
            name: "Brazilian Environmental Protection Agency".into(),
            kind: OrgKind::Government,
            region: "Multiple Regions, Brazil".into(),
            lat: -14.235,
            lng: -51.9253,
            trees_planted: 750_000,
            description: "Government effort to combat deforestation and promote biodiversity."
                .into(),
            year_founded: 1992,
        },
        Organization {
            id: 3,
            name: "Reforest Africa".into(),
            kind: OrgKind::Ngo,
            region: "Congo Basin".into(),
            lat: -0.7832,
            lng: 23.6558,
            trees_planted: 325_000,
            description:
                "Working with local communities to restore forest coverage across central Africa."
                    .into(),
            year_founded: 2012,
        },
        Organization {
            id: 4,
            name: "Ministry of Forests - Indonesia".into(),
            kind: OrgKind::Government,
            region: "Borneo, Indonesia".into(),
            lat: 0.9619,
            lng: 114.5548,
            trees_planted: 520_000,
            description: "National program to restore rainforest and combat illegal logging."
                .into(),
            year_founded: 2005,
        },
        Organization {
            id: 5,
            name: "Taiga Restoration Society".into(),
            kind: OrgKind::Ngo,
            region: "Siberia, Russia".into(),
            lat: 60.0,
            lng: 105.0,
            trees_planted: 280_000,
            description:
                "Focusing on coniferous forest restoration and protection of wildlife corridors."
                    .into(),
            year_founded: 2010,
        },
        Organization {
            id: 6,
            name: "Indigenous Forest Guardians".into(),
            kind: OrgKind::Community,
            region: "Great Bear Rainforest, Canada".into(),
            lat: 52.8821,
            lng: -128.1561,
            trees_planted: 95_000,
            description:
                "Indigenous-led initiative to protect old-growth forests and restore degraded areas."
                    .into(),
            year_founded: 2015,
        },
        Organization {
            id: 7,
            name: "Australian Reforestation Department".into(),
            kind: OrgKind::Government,
            region: "Queensland, Australia".into(),
            lat: -20.9176,
            lng: 142.7028,
            trees_planted: 180_000,
            description:
                "Government program to restore native eucalyptus forests and promote wildlife corridors."
                    .into(),
            year_founded: 2000,
        },
    ]
}

/// Filter the catalog by kind and a case-insensitive search term.
///
/// The search term matches against organization name and region, mirroring the
/// sidebar's search box. `None` for either parameter leaves that axis
/// unfiltered.
pub fn filter_organizations(
    orgs: &[Organization],
    kind: Option<OrgKind>,
    search: Option<&str>,
) -> Vec<Organization> {
    let needle = search.map(|s| s.to_lowercase());
    orgs.iter()
        .filter(|org| kind.map_or(true, |k| org.kind == k))
        .filter(|org| {
            needle.as_deref().map_or(true, |n| {
                org.name.to_lowercase().contains(n) || org.region.to_lowercase().contains(n)
            })
        })
        .cloned()
        .collect()
}

/// Derive the map location list for a set of organizations.
pub fn catalog_locations(orgs: &[Organization]) -> Vec<Location> {
    orgs.iter().map(Organization::to_location).collect()
}
