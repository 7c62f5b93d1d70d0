#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the epi-map server.
//!
//! These types are serialized to JSON for the REST API and printed by the
//! CLI. They wrap the analytics result types so the API contract can
//! evolve independently of the engine.

use epi_map_analytics_models::{
    BoxSummary, CategoryTotal, ChartSeries, DiseaseDistribution, Histogram, Metric, RowFilter,
    ScatterAxis, ScatterPoint, SortMode, SummaryTable,
};
use epi_map_dataset_models::{LoadSource, Theme};
use epi_map_geography_models::Choropleth;
use epi_map_observation_models::StateSummary;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of diseases charted when the request does not name any.
pub const DEFAULT_TOP_DISEASES: usize = 4;

/// A query parameter that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {name}: {value:?}")]
pub struct InvalidParam {
    /// Parameter name.
    pub name: &'static str,
    /// The rejected value.
    pub value: String,
}

/// Raw query parameters shared by the dashboard endpoints.
///
/// Every field is optional text; [`DashboardRequest::from_params`]
/// validates them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// Exact disease name.
    pub disease: Option<String>,
    /// Exact year.
    pub year: Option<String>,
    /// Exact state name.
    pub state: Option<String>,
    /// Ranking order (e.g. `cases_desc`).
    pub sort: Option<String>,
    /// `cases` or `per100k`.
    pub metric: Option<String>,
    /// Scatter x-axis: `population` or `density`.
    pub axis: Option<String>,
    /// Comma-separated disease names.
    pub diseases: Option<String>,
    /// Result count limit.
    pub n: Option<String>,
}

/// Validated dashboard selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardRequest {
    /// Row selection.
    pub filter: RowFilter,
    /// Ranking order.
    pub sort: SortMode,
    /// Value shown per state.
    pub metric: Metric,
    /// Scatter x-axis.
    pub axis: ScatterAxis,
    /// Explicit disease list, if given.
    pub diseases: Option<Vec<String>>,
    /// Result count limit, if given.
    pub n: Option<usize>,
}

impl DashboardRequest {
    /// Validates raw query parameters. Blank values count as absent.
    ///
    /// # Errors
    ///
    /// * If `sort`, `metric`, `axis` or `n` holds an unrecognized value
    pub fn from_params(params: &DashboardQueryParams) -> Result<Self, InvalidParam> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let diseases = text(&params.diseases).map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        Ok(Self {
            filter: RowFilter {
                disease: text(&params.disease),
                year: text(&params.year),
                state: text(&params.state),
            },
            sort: parse_param("sort", params.sort.as_deref())?.unwrap_or_default(),
            metric: parse_param("metric", params.metric.as_deref())?.unwrap_or_default(),
            axis: parse_param("axis", params.axis.as_deref())?.unwrap_or_default(),
            diseases: diseases.filter(|d| !d.is_empty()),
            n: parse_param("n", params.n.as_deref())?,
        })
    }

    /// The row filter with any disease selector removed.
    #[must_use]
    pub fn filter_without_disease(&self) -> RowFilter {
        RowFilter {
            disease: None,
            ..self.filter.clone()
        }
    }
}

/// Parses an optional parameter. Blank values count as absent.
fn parse_param<T: std::str::FromStr>(
    name: &'static str,
    value: Option<&str>,
) -> Result<Option<T>, InvalidParam> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse().map_err(|_| InvalidParam {
                name,
                value: v.to_string(),
            })
        })
        .transpose()
}

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Number of loaded rows.
    pub rows: usize,
}

/// `GET /api/meta` response: what the dataset contains.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    /// Number of loaded rows.
    pub row_count: usize,
    /// Records dropped during normalization.
    pub dropped: usize,
    /// Where the rows came from.
    pub source: LoadSource,
    /// Distinct diseases, sorted.
    pub diseases: Vec<String>,
    /// Distinct years, sorted.
    pub years: Vec<String>,
    /// Distinct states, sorted.
    pub states: Vec<String>,
    /// Diseases charted by default (largest case totals).
    pub default_diseases: Vec<String>,
    /// Message describing a degraded load.
    pub notice: Option<String>,
}

/// `GET /api/summary` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// Per-state summaries in the requested order, limited to `n`.
    pub ranked: Vec<StateSummary>,
    /// Headline numbers over all states.
    pub table: SummaryTable,
    /// Bar chart of `ranked`.
    pub bars: ChartSeries,
}

/// `GET /api/trend` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrend {
    /// Diseases plotted.
    pub diseases: Vec<String>,
    /// One line per disease over their common years.
    pub series: ChartSeries,
}

/// `GET /api/distribution` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDistribution {
    /// Metric summarized.
    pub metric: Metric,
    /// Box summary per disease.
    pub distributions: Vec<DiseaseDistribution>,
    /// Median bar chart for renderers without box plots.
    pub median_series: ChartSeries,
}

/// `GET /api/histogram` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHistogram {
    /// Metric binned.
    pub metric: Metric,
    /// The bins.
    pub histogram: Histogram,
    /// Five-number summary of the same values.
    pub summary: Option<BoxSummary>,
}

/// `GET /api/scatter` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiScatter {
    /// Horizontal axis.
    pub axis: ScatterAxis,
    /// Vertical axis.
    pub metric: Metric,
    /// One point per state with a known x value.
    pub points: Vec<ScatterPoint>,
}

/// `GET /api/choropleth` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChoropleth {
    /// Joined boundaries, legend and match counts.
    #[serde(flatten)]
    pub choropleth: Choropleth,
    /// Message when no boundaries are available.
    pub notice: Option<String>,
}

/// Year series for one disease in one state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDiseaseYears {
    /// Disease name.
    pub disease: String,
    /// Case totals per year, ascending.
    pub years: Vec<CategoryTotal>,
}

/// One disease's totals within a state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDiseaseSummary {
    /// Disease name.
    pub disease: String,
    /// Aggregated totals for the state.
    pub summary: StateSummary,
}

/// `GET /api/state` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStateView {
    /// State name.
    pub state: String,
    /// Diseases with the largest case totals in the state.
    pub top_diseases: Vec<CategoryTotal>,
    /// Year series for each top disease.
    pub year_series: Vec<ApiDiseaseYears>,
    /// Totals for every disease reported in the state, largest first.
    pub diseases: Vec<ApiDiseaseSummary>,
}

/// `GET /api/preferences` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPreferences {
    /// Selected theme.
    pub theme: Theme,
}

/// `PUT /api/preferences` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPreferencesUpdate {
    /// `light` or `dark`.
    pub theme: String,
}

/// Error body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> DashboardQueryParams {
        let mut p = DashboardQueryParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "disease" => p.disease = value,
                "year" => p.year = value,
                "state" => p.state = value,
                "sort" => p.sort = value,
                "metric" => p.metric = value,
                "axis" => p.axis = value,
                "diseases" => p.diseases = value,
                "n" => p.n = value,
                _ => unreachable!(),
            }
        }
        p
    }

    #[test]
    fn empty_params_give_defaults() {
        let req = DashboardRequest::from_params(&DashboardQueryParams::default()).unwrap();
        assert_eq!(req, DashboardRequest::default());
        assert_eq!(req.sort, SortMode::CasesDesc);
        assert_eq!(req.metric, Metric::Cases);
    }

    #[test]
    fn parses_selectors() {
        let req = DashboardRequest::from_params(&params(&[
            ("disease", "Measles"),
            ("year", " 2020 "),
            ("state", ""),
            ("sort", "alpha_desc"),
            ("metric", "per100k"),
            ("axis", "density"),
            ("diseases", "Flu, Mumps,,"),
            ("n", "3"),
        ]))
        .unwrap();

        assert_eq!(req.filter.disease.as_deref(), Some("Measles"));
        assert_eq!(req.filter.year.as_deref(), Some("2020"));
        assert_eq!(req.filter.state, None);
        assert_eq!(req.sort, SortMode::AlphaDesc);
        assert_eq!(req.metric, Metric::Per100k);
        assert_eq!(req.axis, ScatterAxis::Density);
        assert_eq!(req.diseases, Some(vec!["Flu".to_string(), "Mumps".to_string()]));
        assert_eq!(req.n, Some(3));
        assert_eq!(req.filter_without_disease().disease, None);
    }

    #[test]
    fn rejects_unknown_values() {
        let err = DashboardRequest::from_params(&params(&[("sort", "sideways")])).unwrap_err();
        assert_eq!(err.name, "sort");
        assert_eq!(err.value, "sideways");

        assert!(DashboardRequest::from_params(&params(&[("metric", "deaths")])).is_err());
        assert!(DashboardRequest::from_params(&params(&[("n", "-1")])).is_err());
    }

    #[test]
    fn meta_and_preferences_serialize_from_model_types() {
        let meta = ApiMeta {
            row_count: 2,
            dropped: 1,
            source: LoadSource::Cache,
            diseases: vec!["Flu".to_string()],
            years: vec!["2020".to_string()],
            states: vec!["CA".to_string(), "TX".to_string()],
            default_diseases: vec!["Flu".to_string()],
            notice: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["rowCount"], 2);
        assert_eq!(json["source"], "cache");
        assert!(json["notice"].is_null());

        let prefs = serde_json::to_value(ApiPreferences { theme: Theme::Dark }).unwrap();
        assert_eq!(prefs["theme"], "dark");
    }

    #[test]
    fn comma_only_disease_list_is_absent() {
        let req = DashboardRequest::from_params(&params(&[("diseases", " , ")])).unwrap();
        assert_eq!(req.diseases, None);
    }
}
