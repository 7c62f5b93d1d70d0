#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input selectors and result types for the analytics engine.
//!
//! Selectors ([`RowFilter`], [`GroupBy`], [`SortMode`], [`Metric`],
//! [`ScatterAxis`]) describe what a chart asks for. Results
//! ([`ChartSeries`], [`Histogram`], [`BoxSummary`], [`SummaryTable`], ...)
//! are chart-ready values serialized straight to the API.

use epi_map_observation_models::{ObservationRow, StateSummary};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Row selection applied before aggregation.
///
/// `None` (or an empty string) means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFilter {
    /// Exact, case-sensitive disease name.
    pub disease: Option<String>,
    /// Exact year string.
    pub year: Option<String>,
    /// Exact state name.
    pub state: Option<String>,
}

impl RowFilter {
    /// A filter that matches every row.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the filter to one disease.
    #[must_use]
    pub fn with_disease(mut self, disease: impl Into<String>) -> Self {
        self.disease = Some(disease.into());
        self
    }

    /// Restricts the filter to one year.
    #[must_use]
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Restricts the filter to one state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Returns `true` if `row` participates under this filter.
    #[must_use]
    pub fn matches(&self, row: &ObservationRow) -> bool {
        accepts(self.disease.as_deref(), &row.disease)
            && accepts(self.year.as_deref(), &row.year)
            && accepts(self.state.as_deref(), &row.state)
    }
}

fn accepts(wanted: Option<&str>, actual: &str) -> bool {
    match wanted {
        None | Some("") => true,
        Some(wanted) => wanted == actual,
    }
}

/// Which column a grouping is keyed by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GroupBy {
    /// Group by state name.
    State,
    /// Group by year.
    Year,
    /// Group by disease name.
    Disease,
}

impl GroupBy {
    /// Extracts the grouping key from a row.
    #[must_use]
    pub fn key(self, row: &ObservationRow) -> &str {
        match self {
            Self::State => &row.state,
            Self::Year => &row.year,
            Self::Disease => &row.disease,
        }
    }
}

/// Ranking order for per-state summaries.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum SortMode {
    /// Fewest cases first.
    #[strum(serialize = "cases_asc")]
    CasesAsc,
    /// Most cases first.
    #[default]
    #[strum(serialize = "cases_desc")]
    CasesDesc,
    /// State name A to Z.
    #[strum(serialize = "alpha_asc")]
    AlphaAsc,
    /// State name Z to A.
    #[strum(serialize = "alpha_desc")]
    AlphaDesc,
    /// Largest population first.
    #[strum(serialize = "population_desc")]
    PopulationDesc,
    /// Densest first.
    #[strum(serialize = "density_desc")]
    DensityDesc,
    /// Highest per-100k rate first.
    #[serde(rename = "per100k_desc")]
    #[strum(serialize = "per100k_desc")]
    Per100kDesc,
}

/// The value a chart shows per state.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Metric {
    /// Raw case count.
    #[default]
    #[serde(rename = "cases")]
    #[strum(serialize = "cases")]
    Cases,
    /// Cases per 100,000 residents.
    #[serde(rename = "per100k")]
    #[strum(serialize = "per100k")]
    Per100k,
}

impl Metric {
    /// Reads this metric from a summary.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, summary: &StateSummary) -> f64 {
        match self {
            Self::Cases => summary.cases as f64,
            Self::Per100k => summary.per100k,
        }
    }

    /// Human-readable axis label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cases => "Cases",
            Self::Per100k => "Cases per 100k",
        }
    }
}

/// Horizontal axis of a scatter plot.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ScatterAxis {
    /// State population.
    #[default]
    Population,
    /// State population density.
    Density,
}

impl ScatterAxis {
    /// Reads this axis from a summary.
    #[must_use]
    pub const fn value(self, summary: &StateSummary) -> f64 {
        match self {
            Self::Population => summary.population,
            Self::Density => summary.density,
        }
    }
}

/// Case total for one grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// Grouping key (state, year or disease).
    pub key: String,
    /// Sum of cases.
    pub total: u64,
}

/// One labelled numeric series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    /// Legend label.
    pub label: String,
    /// One value per chart label.
    pub data: Vec<f64>,
}

/// Labels plus numeric series, the shape chart renderers consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// X-axis (or category) labels.
    pub labels: Vec<String>,
    /// Series sharing the labels.
    pub datasets: Vec<ChartDataset>,
}

/// A single scatter plot point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    /// State name.
    pub state: String,
    /// Horizontal value.
    pub x: f64,
    /// Vertical value.
    pub y: f64,
}

/// One histogram bin covering `[lower, upper)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    /// Inclusive lower edge.
    pub lower: f64,
    /// Exclusive upper edge.
    pub upper: f64,
    /// Display label, e.g. `"1000–1999"`.
    pub label: String,
    /// Number of values assigned to this bin.
    pub count: usize,
}

/// Equal-width histogram with a rounded bin width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    /// Lower edge of the first bin.
    pub start: f64,
    /// Width shared by every bin.
    pub width: f64,
    /// Bins in ascending order. Empty when there were no values.
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Total number of values across all bins.
    #[must_use]
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Five-number summary for a box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxSummary {
    /// Number of observations.
    pub count: usize,
    /// Smallest value.
    pub min: f64,
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Largest value.
    pub max: f64,
}

/// Distribution of per-state values for one disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseDistribution {
    /// Disease name.
    pub disease: String,
    /// Box summary, or `None` when no state had data.
    pub summary: Option<BoxSummary>,
}

/// A state paired with the value it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedValue {
    /// State name.
    pub state: String,
    /// Metric value.
    pub value: f64,
}

/// Headline numbers shown above the state table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTable {
    /// Metric the table was computed for.
    pub metric: Metric,
    /// Sum of cases across all states.
    pub total_cases: u64,
    /// Number of states with data.
    pub state_count: usize,
    /// Cases per 100,000 across the states with a known population.
    pub overall_per100k: f64,
    /// Median of the per-state metric values.
    pub median_value: Option<f64>,
    /// State at the (lower) middle position of the ascending ranking.
    pub median_state: Option<RankedValue>,
    /// State with the highest metric value.
    pub highest: Option<RankedValue>,
    /// State with the lowest metric value.
    pub lowest: Option<RankedValue>,
}
