//! Builds API responses from the shared dataset.
//!
//! Each function is a pure computation over the rows; the HTTP handlers
//! and the CLI both call these and only differ in how they deliver the
//! result.

use epi_map_analytics::{
    aggregate, box_summary, distribution_by_disease, histogram, median_fallback_series,
    metric_values, rank, scatter_points, state_bar_series, summary_table, top_n, top_n_totals,
    totals_by, trend_series, unique_sorted, year_series,
};
use epi_map_analytics_models::{GroupBy, RowFilter};
use epi_map_dataset::{Dataset, LoadNotice, LoadSource};
use epi_map_observation_models::{AccumulationPolicy, ObservationRow};
use epi_map_server_models::{
    ApiChoropleth, ApiDiseaseSummary, ApiDiseaseYears, ApiDistribution, ApiHistogram, ApiMeta,
    ApiScatter, ApiStateView, ApiSummary, ApiTrend, DEFAULT_TOP_DISEASES, DashboardRequest,
};
use geojson::FeatureCollection;

/// Diseases named by the request, or the ones with the largest case
/// totals under the request's filter.
#[must_use]
pub fn selected_diseases(rows: &[ObservationRow], req: &DashboardRequest) -> Vec<String> {
    req.diseases.clone().unwrap_or_else(|| {
        top_n(
            rows,
            GroupBy::Disease,
            req.n.unwrap_or(DEFAULT_TOP_DISEASES),
            &req.filter_without_disease(),
        )
    })
}

/// What the dataset contains.
#[must_use]
pub fn meta(
    dataset: &Dataset,
    source: LoadSource,
    dropped: usize,
    notice: Option<&LoadNotice>,
) -> ApiMeta {
    let rows = dataset.rows();
    ApiMeta {
        row_count: rows.len(),
        dropped,
        source,
        diseases: unique_sorted(rows, GroupBy::Disease),
        years: unique_sorted(rows, GroupBy::Year),
        states: unique_sorted(rows, GroupBy::State),
        default_diseases: top_n(rows, GroupBy::Disease, DEFAULT_TOP_DISEASES, &RowFilter::all()),
        notice: notice.map(|n| n.message.clone()),
    }
}

/// Ranked per-state summaries, the headline table and the bar series.
#[must_use]
pub fn summary(
    rows: &[ObservationRow],
    req: &DashboardRequest,
    policy: AccumulationPolicy,
) -> ApiSummary {
    let summaries = aggregate(rows, &req.filter, policy);
    let mut ranked = rank(&summaries, req.sort);
    if let Some(n) = req.n {
        ranked.truncate(n);
    }

    ApiSummary {
        table: summary_table(&summaries, req.metric),
        bars: state_bar_series(&ranked, req.metric),
        ranked,
    }
}

/// Multi-disease trend over common years.
#[must_use]
pub fn trend(rows: &[ObservationRow], req: &DashboardRequest) -> ApiTrend {
    let diseases = selected_diseases(rows, req);
    ApiTrend {
        series: trend_series(rows, &diseases, &req.filter),
        diseases,
    }
}

/// Per-disease box summaries and the median fallback chart.
#[must_use]
pub fn distribution(
    rows: &[ObservationRow],
    req: &DashboardRequest,
    policy: AccumulationPolicy,
) -> ApiDistribution {
    let diseases = selected_diseases(rows, req);
    let distributions =
        distribution_by_disease(rows, &diseases, &req.filter, req.metric, policy);

    ApiDistribution {
        metric: req.metric,
        median_series: median_fallback_series(&distributions, req.metric),
        distributions,
    }
}

/// Histogram of per-state metric values.
#[must_use]
pub fn state_histogram(
    rows: &[ObservationRow],
    req: &DashboardRequest,
    policy: AccumulationPolicy,
) -> ApiHistogram {
    let values = metric_values(&aggregate(rows, &req.filter, policy), req.metric);
    ApiHistogram {
        metric: req.metric,
        histogram: histogram(&values),
        summary: box_summary(&values),
    }
}

/// Population or density against the metric.
#[must_use]
pub fn scatter(
    rows: &[ObservationRow],
    req: &DashboardRequest,
    policy: AccumulationPolicy,
) -> ApiScatter {
    let summaries = aggregate(rows, &req.filter, policy);
    ApiScatter {
        axis: req.axis,
        metric: req.metric,
        points: scatter_points(&summaries, req.axis, req.metric),
    }
}

/// Boundaries joined with per-state values.
#[must_use]
pub fn choropleth(
    rows: &[ObservationRow],
    boundaries: &FeatureCollection,
    boundaries_notice: Option<&LoadNotice>,
    req: &DashboardRequest,
    policy: AccumulationPolicy,
) -> ApiChoropleth {
    let summaries = aggregate(rows, &req.filter, policy);
    ApiChoropleth {
        choropleth: epi_map_geography::join(boundaries, &summaries, req.metric),
        notice: boundaries_notice.map(|n| n.message.clone()),
    }
}

/// Everything about one state: its top diseases with their year series,
/// and totals for every disease it reports.
///
/// The request's state selector is replaced by `state`; its disease
/// selector is ignored.
#[must_use]
pub fn state_view(
    rows: &[ObservationRow],
    state: &str,
    req: &DashboardRequest,
    policy: AccumulationPolicy,
) -> ApiStateView {
    let filter = req.filter_without_disease().with_state(state);
    let totals = top_n_totals(totals_by(rows, GroupBy::Disease, &filter), usize::MAX);

    let top_diseases: Vec<_> = totals
        .iter()
        .take(req.n.unwrap_or(DEFAULT_TOP_DISEASES))
        .cloned()
        .collect();

    let series = top_diseases
        .iter()
        .map(|t| ApiDiseaseYears {
            disease: t.key.clone(),
            years: year_series(rows, &filter.clone().with_disease(t.key.as_str())),
        })
        .collect();

    let diseases = totals
        .iter()
        .filter_map(|t| {
            let summaries = aggregate(rows, &filter.clone().with_disease(t.key.as_str()), policy);
            summaries.get(state).cloned().map(|summary| ApiDiseaseSummary {
                disease: t.key.clone(),
                summary,
            })
        })
        .collect();

    ApiStateView {
        state: state.to_string(),
        top_diseases,
        year_series: series,
        diseases,
    }
}
