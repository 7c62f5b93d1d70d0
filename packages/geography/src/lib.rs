#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! State boundary loading and choropleth joins.
//!
//! Reads a `GeoJSON` feature collection of state polygons and decorates
//! each feature with the aggregated value of the matching dataset state,
//! ready for a map layer to style.

pub mod choropleth;

use std::path::Path;

use epi_map_geography_models::FEATURE_NAME_PROPERTIES;
use geojson::{Feature, FeatureCollection, GeoJson};
use thiserror::Error;

pub use choropleth::{join, match_state};
pub use epi_map_geography_models::Choropleth;

/// Errors that can occur while loading boundaries.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Reading the boundary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document is valid `GeoJSON` but has no features.
    #[error("Expected a FeatureCollection or Feature, got a bare geometry")]
    NotFeatures,
}

/// Reads and parses a boundary file.
///
/// # Errors
///
/// * If the file cannot be read
/// * If the contents are not a `GeoJSON` feature or feature collection
pub fn load_boundaries(path: &Path) -> Result<FeatureCollection, GeoError> {
    let contents = std::fs::read_to_string(path)?;
    let collection = parse_boundaries(&contents)?;

    log::info!(
        "Loaded {} boundary features from {}",
        collection.features.len(),
        path.display()
    );

    Ok(collection)
}

/// Parses `GeoJSON` text into a feature collection.
///
/// A single feature is wrapped in a one-element collection.
///
/// # Errors
///
/// * If the text is not valid `GeoJSON`
/// * If it is a bare geometry
pub fn parse_boundaries(contents: &str) -> Result<FeatureCollection, GeoError> {
    match contents.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => Err(GeoError::NotFeatures),
    }
}

/// An empty feature collection, used when no boundary file is available.
#[must_use]
pub const fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}

/// Display name of a feature: the first non-blank string among the
/// `name`, `NAME` and `STATE_NAME` properties.
#[must_use]
pub fn feature_name(feature: &Feature) -> Option<&str> {
    FEATURE_NAME_PROPERTIES.iter().find_map(|key| {
        feature
            .property(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NAME": "California" },
                "geometry": { "type": "Point", "coordinates": [-119.4, 36.7] }
            },
            {
                "type": "Feature",
                "properties": { "STATE_NAME": "Texas", "name": "  " },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn parses_feature_collection() {
        let collection = parse_boundaries(TWO_STATES).unwrap();
        assert_eq!(collection.features.len(), 2);
    }

    #[test]
    fn wraps_single_feature() {
        let collection = parse_boundaries(
            r#"{"type":"Feature","properties":{"name":"Ohio"},"geometry":null}"#,
        )
        .unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(feature_name(&collection.features[0]), Some("Ohio"));
    }

    #[test]
    fn rejects_bare_geometry_and_garbage() {
        assert!(matches!(
            parse_boundaries(r#"{"type":"Point","coordinates":[0.0,0.0]}"#),
            Err(GeoError::NotFeatures)
        ));
        assert!(matches!(
            parse_boundaries("not json"),
            Err(GeoError::GeoJson(_))
        ));
    }

    #[test]
    fn feature_name_falls_through_variants() {
        let collection = parse_boundaries(TWO_STATES).unwrap();
        assert_eq!(feature_name(&collection.features[0]), Some("California"));
        assert_eq!(feature_name(&collection.features[1]), Some("Texas"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("epi_map_no_such_boundaries.geojson");
        assert!(matches!(load_boundaries(&path), Err(GeoError::Io(_))));
    }
}
