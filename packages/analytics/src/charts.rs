//! Chart-ready series built from rows and summaries.
//!
//! Renderers consume a labels array plus numeric series; everything here
//! produces that shape (or plain point/summary lists) without knowing
//! which chart library draws it.

use std::collections::BTreeMap;

use epi_map_analytics_models::{
    ChartDataset, ChartSeries, DiseaseDistribution, GroupBy, Metric, RankedValue, RowFilter,
    ScatterAxis, ScatterPoint, SummaryTable,
};
use epi_map_observation_models::{
    AccumulationPolicy, ObservationRow, StateSummaries, StateSummary, summary_rate_per_100k,
};

use crate::aggregate::{aggregate, totals_by};
use crate::grouping::common_years;
use crate::stats::{box_summary, median};

/// One line per disease over the years every disease has data for.
///
/// Each point is the case total for that disease and year across the
/// states the filter admits.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn trend_series(rows: &[ObservationRow], diseases: &[String], filter: &RowFilter) -> ChartSeries {
    // The disease list replaces any disease selector on the filter.
    let filter = RowFilter {
        disease: None,
        ..filter.clone()
    };
    let labels = common_years(rows, diseases, &filter);

    let datasets = diseases
        .iter()
        .map(|disease| {
            let by_year: BTreeMap<String, u64> =
                totals_by(rows, GroupBy::Year, &filter.clone().with_disease(disease.as_str()))
                    .into_iter()
                    .map(|t| (t.key, t.total))
                    .collect();
            ChartDataset {
                label: disease.clone(),
                data: labels
                    .iter()
                    .map(|year| by_year.get(year).copied().unwrap_or(0) as f64)
                    .collect(),
            }
        })
        .collect();

    ChartSeries { labels, datasets }
}

/// Bar chart of ranked states.
#[must_use]
pub fn state_bar_series(ranked: &[StateSummary], metric: Metric) -> ChartSeries {
    ChartSeries {
        labels: ranked.iter().map(|s| s.state.clone()).collect(),
        datasets: vec![ChartDataset {
            label: metric.label().to_string(),
            data: ranked.iter().map(|s| metric.value(s)).collect(),
        }],
    }
}

/// Per-state metric values in first-seen order.
#[must_use]
pub fn metric_values(summaries: &StateSummaries, metric: Metric) -> Vec<f64> {
    summaries.iter().map(|s| metric.value(s)).collect()
}

/// Scatter points of `x` against `y`.
///
/// States whose `x` value is unknown (zero) are left out.
#[must_use]
pub fn scatter_points(summaries: &StateSummaries, x: ScatterAxis, y: Metric) -> Vec<ScatterPoint> {
    summaries
        .iter()
        .filter(|s| x.value(s) > 0.0)
        .map(|s| ScatterPoint {
            state: s.state.clone(),
            x: x.value(s),
            y: y.value(s),
        })
        .collect()
}

/// Box summaries of per-state values, one per disease.
#[must_use]
pub fn distribution_by_disease(
    rows: &[ObservationRow],
    diseases: &[String],
    filter: &RowFilter,
    metric: Metric,
    policy: AccumulationPolicy,
) -> Vec<DiseaseDistribution> {
    diseases
        .iter()
        .map(|disease| {
            let summaries = aggregate(rows, &filter.clone().with_disease(disease.as_str()), policy);
            DiseaseDistribution {
                disease: disease.clone(),
                summary: box_summary(&metric_values(&summaries, metric)),
            }
        })
        .collect()
}

/// Median bar chart standing in for a box plot.
///
/// Diseases without data plot as zero.
#[must_use]
pub fn median_fallback_series(distributions: &[DiseaseDistribution], metric: Metric) -> ChartSeries {
    ChartSeries {
        labels: distributions.iter().map(|d| d.disease.clone()).collect(),
        datasets: vec![ChartDataset {
            label: format!("Median {}", metric.label()),
            data: distributions
                .iter()
                .map(|d| d.summary.as_ref().map_or(0.0, |s| s.median))
                .collect(),
        }],
    }
}

/// Headline numbers for the state table.
///
/// The median state is the one at the lower-middle position of the
/// ascending ranking. Ties for highest and lowest go to the state seen
/// first.
#[must_use]
pub fn summary_table(summaries: &StateSummaries, metric: Metric) -> SummaryTable {
    let mut ascending: Vec<RankedValue> = summaries
        .iter()
        .map(|s| RankedValue {
            state: s.state.clone(),
            value: metric.value(s),
        })
        .collect();
    ascending.sort_by(|a, b| a.value.total_cmp(&b.value));

    let values: Vec<f64> = ascending.iter().map(|r| r.value).collect();

    let highest = ascending
        .iter()
        .rev()
        .reduce(|best, candidate| if candidate.value >= best.value { candidate } else { best })
        .cloned();

    let total_cases = summaries.iter().fold(0u64, |acc, s| acc.saturating_add(s.cases));
    // States with unknown population (0) stay out of both sides of the rate.
    let (known_cases, known_population) = summaries
        .iter()
        .filter(|s| s.population > 0.0)
        .fold((0u64, 0.0), |(cases, population), s| {
            (cases.saturating_add(s.cases), population + s.population)
        });

    SummaryTable {
        metric,
        total_cases,
        state_count: summaries.len(),
        overall_per100k: summary_rate_per_100k(known_cases, known_population),
        median_value: median(&values),
        median_state: ascending
            .len()
            .checked_sub(1)
            .map(|last| ascending[last / 2].clone()),
        highest,
        lowest: ascending.first().cloned(),
    }
}

#[cfg(test)]
mod tests {
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

    fn summaries(rows: &[ObservationRow]) -> StateSummaries {
        aggregate(rows, &RowFilter::all(), AccumulationPolicy::FirstSeen)
    }

    #[test]
    fn trend_uses_common_years_only() {
        let rows = vec![
            row("CA", "2018", "A", 1, 0.0),
            row("CA", "2019", "A", 2, 0.0),
            row("TX", "2019", "A", 3, 0.0),
            row("CA", "2020", "A", 4, 0.0),
            row("CA", "2019", "B", 10, 0.0),
            row("CA", "2020", "B", 20, 0.0),
            row("CA", "2021", "B", 30, 0.0),
        ];

        let series = trend_series(&rows, &["A".to_string(), "B".to_string()], &RowFilter::all());

        assert_eq!(series.labels, vec!["2019", "2020"]);
        assert_eq!(series.datasets.len(), 2);
        assert_eq!(series.datasets[0].label, "A");
        assert_eq!(series.datasets[0].data, vec![5.0, 4.0]);
        assert_eq!(series.datasets[1].data, vec![10.0, 20.0]);
    }

    #[test]
    fn trend_respects_state_filter() {
        let rows = vec![
            row("CA", "2019", "A", 2, 0.0),
            row("TX", "2019", "A", 3, 0.0),
        ];
        let series = trend_series(&rows, &["A".to_string()], &RowFilter::all().with_state("TX"));
        assert_eq!(series.datasets[0].data, vec![3.0]);
    }

    #[test]
    fn bar_series_follows_ranking() {
        let rows = vec![row("CA", "2020", "A", 5, 0.0), row("TX", "2020", "A", 9, 0.0)];
        let ranked = crate::ranking::rank(&summaries(&rows), epi_map_analytics_models::SortMode::CasesDesc);
        let series = state_bar_series(&ranked, Metric::Cases);
        assert_eq!(series.labels, vec!["TX", "CA"]);
        assert_eq!(series.datasets[0].data, vec![9.0, 5.0]);
    }

    #[test]
    fn scatter_skips_unknown_population() {
        let rows = vec![row("CA", "2020", "A", 5, 100.0), row("TX", "2020", "A", 9, 0.0)];
        let points = scatter_points(&summaries(&rows), ScatterAxis::Population, Metric::Per100k);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].state, "CA");
        assert!((points[0].y - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn distributions_and_median_fallback() {
        let rows = vec![
            row("CA", "2020", "A", 1, 0.0),
            row("TX", "2020", "A", 3, 0.0),
            row("NY", "2020", "A", 8, 0.0),
            row("CA", "2020", "B", 4, 0.0),
        ];
        let diseases = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let distributions = distribution_by_disease(
            &rows,
            &diseases,
            &RowFilter::all(),
            Metric::Cases,
            AccumulationPolicy::FirstSeen,
        );

        assert_eq!(distributions.len(), 3);
        assert_eq!(distributions[0].summary.as_ref().map(|s| s.count), Some(3));
        assert!(distributions[2].summary.is_none());

        let fallback = median_fallback_series(&distributions, Metric::Cases);
        assert_eq!(fallback.labels, diseases);
        assert_eq!(fallback.datasets[0].data, vec![3.0, 4.0, 0.0]);
    }

    #[test]
    fn summary_table_headlines() {
        let rows = vec![
            row("CA", "2020", "A", 10, 0.0),
            row("TX", "2020", "A", 40, 0.0),
            row("NY", "2020", "A", 20, 0.0),
            row("FL", "2020", "A", 30, 0.0),
        ];
        let table = summary_table(&summaries(&rows), Metric::Cases);

        assert_eq!(table.total_cases, 100);
        assert_eq!(table.state_count, 4);
        assert_eq!(table.median_value, Some(25.0));
        assert_eq!(table.median_state.map(|r| r.state), Some("NY".to_string()));
        assert_eq!(table.highest.map(|r| r.state), Some("TX".to_string()));
        assert_eq!(table.lowest.map(|r| r.state), Some("CA".to_string()));
    }

    #[test]
    fn summary_table_overall_rate() {
        let rows = vec![
            row("CA", "2020", "A", 30, 100_000.0),
            row("TX", "2020", "A", 10, 100_000.0),
            row("NY", "2020", "A", 5, 0.0),
        ];
        let table = summary_table(&summaries(&rows), Metric::Per100k);
        assert!((table.overall_per100k - 20.0).abs() < 1e-9);
        assert_eq!(table.total_cases, 45);
        assert_eq!(table.highest.map(|r| r.state), Some("CA".to_string()));
    }

    #[test]
    fn unknown_population_does_not_inflate_overall_rate() {
        let rows = vec![
            row("CA", "2020", "A", 10, 100_000.0),
            row("NY", "2020", "A", 1_000_000, 0.0),
        ];
        let table = summary_table(&summaries(&rows), Metric::Cases);
        assert!((table.overall_per100k - 10.0).abs() < 1e-9);

        let rows = vec![row("NY", "2020", "A", 5, 0.0)];
        let table = summary_table(&summaries(&rows), Metric::Cases);
        assert!(table.overall_per100k.abs() < f64::EPSILON);
    }

    #[test]
    fn summary_table_ties_go_to_first_seen() {
        let rows = vec![row("CA", "2020", "A", 10, 0.0), row("TX", "2020", "A", 10, 0.0)];
        let table = summary_table(&summaries(&rows), Metric::Cases);
        assert_eq!(table.highest.map(|r| r.state), Some("CA".to_string()));
        assert_eq!(table.lowest.map(|r| r.state), Some("CA".to_string()));
    }

    #[test]
    fn summary_table_of_nothing() {
        let table = summary_table(&StateSummaries::new(), Metric::Per100k);
        assert_eq!(table.state_count, 0);
        assert!(table.median_value.is_none());
        assert!(table.median_state.is_none());
        assert!(table.highest.is_none());
    }
}
