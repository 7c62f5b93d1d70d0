#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! US state lookup and choropleth join types.
//!
//! These types describe how boundary features are paired with aggregated
//! state data and what a finished choropleth carries.

pub mod states;

use epi_map_analytics_models::{Histogram, Metric};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

pub use states::{US_STATES, UsState, lookup_state, same_state};

/// Property names a boundary feature's display name may be stored under,
/// in lookup order.
pub const FEATURE_NAME_PROPERTIES: &[&str] = &["name", "NAME", "STATE_NAME"];

/// Property keys written onto joined features.
pub mod props {
    /// Metric value, `null` when the feature has no data.
    pub const VALUE: &str = "value";
    /// Summed case count.
    pub const CASES: &str = "cases";
    /// Cases per 100,000 residents.
    pub const PER_100K: &str = "per100k";
    /// Whether any aggregated data matched the feature.
    pub const HAS_DATA: &str = "hasData";
    /// Histogram bin index used to pick a fill color, `null` without data.
    pub const COLOR_CLASS: &str = "colorClass";
    /// Name of the matched dataset state.
    pub const DATA_STATE: &str = "dataState";
}

/// How a boundary feature was paired with a dataset state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateMatch {
    /// Names are byte-for-byte equal.
    Exact,
    /// Names differ only in ASCII case.
    CaseInsensitive,
    /// Names resolve to the same entry of the state table
    /// (e.g. "CA" and "California").
    Table,
}

/// Outcome counts of a choropleth join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStats {
    /// Number of boundary features.
    pub features: usize,
    /// Features paired with a dataset state.
    pub matched: usize,
    /// Display names of features without data.
    pub unmatched: Vec<String>,
    /// Dataset states no feature claimed.
    pub orphaned_states: Vec<String>,
}

/// A boundary collection decorated with per-state values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Choropleth {
    /// Metric the map is colored by.
    pub metric: Metric,
    /// Legend bins; a feature's `colorClass` indexes into these.
    pub legend: Histogram,
    /// Features with the joined properties added.
    pub collection: FeatureCollection,
    /// Match counts.
    pub stats: JoinStats,
}
