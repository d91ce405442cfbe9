//! Map data: district boundaries from GeoJSON, choropleth joins, and venue
//! marker layers.
//!
//! Only the district names are needed from the boundaries: a choropleth layer
//! is the per-district metric keyed by the same names the features carry.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::enrich::EnrichedVenue;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    name: Option<String>,
    #[serde(default)]
    properties: Option<Value>,
}

impl Feature {
    /// `feature.name`, falling back to `feature.properties.name`.
    fn district_name(&self) -> Option<&str> {
        self.name.as_deref().or_else(|| {
            self.properties
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
        })
    }
}

/// District names of a boundary file.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictBoundaries {
    names: BTreeSet<String>,
}

/// Metric values joined to boundary names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethLayer {
    pub metric: String,
    /// Values for districts that have a boundary.
    pub values: BTreeMap<String, f64>,
    /// Districts with a boundary but no value.
    pub missing_data: Vec<String>,
    /// Values whose district has no boundary; these cannot be drawn.
    pub unknown_districts: Vec<String>,
}

impl DistrictBoundaries {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read GeoJSON '{}'", path.display()))?;
        let boundaries = Self::from_json(&content)
            .with_context(|| format!("invalid GeoJSON '{}'", path.display()))?;

        info!(path = %path.display(), districts = boundaries.names.len(), "Boundaries loaded");
        Ok(boundaries)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_str(content)?;

        let mut names = BTreeSet::new();
        for (index, feature) in collection.features.iter().enumerate() {
            match feature.district_name() {
                Some(name) => {
                    names.insert(name.to_string());
                }
                None => warn!(index, "GeoJSON feature has no name, skipping"),
            }
        }

        if names.is_empty() {
            bail!("GeoJSON has no named features");
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, district: &str) -> bool {
        self.names.contains(district)
    }

    /// Joins `values` to the boundary names.
    pub fn choropleth(&self, metric: &str, values: &BTreeMap<String, f64>) -> ChoroplethLayer {
        let (known, unknown): (BTreeMap<_, _>, BTreeMap<_, _>) = values
            .iter()
            .map(|(district, value)| (district.clone(), *value))
            .partition(|(district, _)| self.contains(district));

        let missing_data: Vec<String> = self
            .names
            .iter()
            .filter(|name| !known.contains_key(*name))
            .cloned()
            .collect();

        if !unknown.is_empty() {
            warn!(
                metric,
                districts = ?unknown.keys().collect::<Vec<_>>(),
                "Values for districts without boundaries"
            );
        }

        ChoroplethLayer {
            metric: metric.to_string(),
            values: known,
            missing_data,
            unknown_districts: unknown.into_keys().collect(),
        }
    }
}

/// One venue marker with the fields shown in its popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenuePoint {
    pub name: String,
    pub category: String,
    pub address: String,
    pub rating: Option<f64>,
    pub lat: f64,
    pub lng: f64,
}

/// Venue markers for a clustered point map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLayer {
    pub count: usize,
    pub points: Vec<VenuePoint>,
}

/// Builds a marker per venue. Venues with non-finite coordinates are left out.
pub fn venue_points<'a>(venues: impl IntoIterator<Item = &'a EnrichedVenue>) -> PointLayer {
    let mut skipped = 0usize;
    let points: Vec<VenuePoint> = venues
        .into_iter()
        .filter(|v| {
            let finite = v.venue.lat.is_finite() && v.venue.lng.is_finite();
            if !finite {
                skipped += 1;
            }
            finite
        })
        .map(|v| VenuePoint {
            name: v.venue.name.clone(),
            category: v.venue.category.clone(),
            address: v.venue.address.clone(),
            rating: v.venue.rating,
            lat: v.venue.lat,
            lng: v.venue.lng,
        })
        .collect();

    if skipped > 0 {
        debug!(skipped, "Venues without usable coordinates left off the map");
    }

    PointLayer {
        count: points.len(),
        points,
    }
}
