#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and grouping engine for the dashboard.
//!
//! Every function here is pure: it takes a slice of normalized
//! [`ObservationRow`](epi_map_observation_models::ObservationRow)s (or
//! summaries derived from them) and returns fresh, chart-ready values.
//! Nothing is cached and nothing touches I/O, so callers may share one
//! dataset across threads and recompute on every request.

pub mod aggregate;
pub mod charts;
pub mod grouping;
pub mod histogram;
pub mod ranking;
pub mod stats;

pub use aggregate::{aggregate, totals_by, year_series};
pub use charts::{
    distribution_by_disease, median_fallback_series, metric_values, scatter_points,
    state_bar_series, summary_table, trend_series,
};
pub use grouping::{common_years, intersect_years, top_n, top_n_totals, unique_sorted};
pub use histogram::{HISTOGRAM_BINS, bin_index, histogram};
pub use ranking::{rank, sort_summaries};
pub use stats::{box_summary, median, quantile};

#[cfg(test)]
mod tests {
    use epi_map_analytics_models::{Metric, RowFilter, SortMode};
    use epi_map_observation_models::{AccumulationPolicy, ObservationRow};

    use super::*;

    fn row(state: &str, year: &str, disease: &str, cases: u64, population: f64) -> ObservationRow {
        ObservationRow {
            state: state.to_string(),
            year: year.to_string(),
            disease: disease.to_string(),
            cases,
            population,
            population_density: 0.0,
        }
    }

    #[test]
    fn dashboard_pipeline_end_to_end() {
        let rows = vec![
            row("CA", "2019", "Measles", 100, 1000.0),
            row("CA", "2020", "Measles", 200, 1000.0),
            row("TX", "2019", "Measles", 50, 0.0),
            row("TX", "2020", "Measles", 25, 500.0),
            row("NY", "2020", "Mumps", 400, 4000.0),
        ];

        let diseases = top_n(&rows, epi_map_analytics_models::GroupBy::Disease, 2, &RowFilter::all());
        assert_eq!(diseases, vec!["Measles", "Mumps"]);

        let measles = aggregate(
            &rows,
            &RowFilter::all().with_disease("Measles"),
            AccumulationPolicy::FirstSeen,
        );
        let ca = measles.get("CA").unwrap();
        assert_eq!(ca.cases, 300);
        assert!((ca.population - 1000.0).abs() < f64::EPSILON);
        assert!((ca.per100k - 30_000.0).abs() < 1e-9);

        let tx = measles.get("TX").unwrap();
        assert!((tx.population - 500.0).abs() < f64::EPSILON);

        let ranked = rank(&measles, SortMode::Per100kDesc);
        assert_eq!(ranked[0].state, "CA");

        let hist = histogram(&metric_values(&measles, Metric::Cases));
        assert_eq!(hist.total(), 2);

        let trend = trend_series(&rows, &diseases, &RowFilter::all());
        assert_eq!(trend.labels, vec!["2020"]);

        let table = summary_table(&measles, Metric::Cases);
        assert_eq!(table.total_cases, 375);
        assert_eq!(table.highest.map(|r| r.state), Some("CA".to_string()));
    }
}
