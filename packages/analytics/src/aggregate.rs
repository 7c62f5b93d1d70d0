//! Folding observation rows into per-key totals.

use std::collections::BTreeMap;

use epi_map_analytics_models::{CategoryTotal, GroupBy, RowFilter};
use epi_map_observation_models::{
    AccumulationPolicy, ObservationRow, StateSummaries, compare_years,
};

/// Aggregates participating rows into one summary per state.
///
/// Cases are summed. Population and density are chosen by `policy` and
/// never summed. Per-100k rates are computed once after folding. States
/// without a participating row are absent from the result, and rows
/// with an empty state are ignored.
#[must_use]
pub fn aggregate(
    rows: &[ObservationRow],
    filter: &RowFilter,
    policy: AccumulationPolicy,
) -> StateSummaries {
    let mut summaries = StateSummaries::new();

    for row in rows
        .iter()
        .filter(|row| !row.state.is_empty() && filter.matches(row))
    {
        let summary = summaries.entry(&row.state);
        summary.cases = summary.cases.saturating_add(row.cases);
        summary.population = policy.fold(summary.population, row.population);
        summary.density = policy.fold(summary.density, row.population_density);
    }

    summaries.finalize();

    log::trace!(
        "Aggregated {} rows into {} states (filter={filter:?}, policy={policy})",
        rows.len(),
        summaries.len()
    );

    summaries
}

/// Sums cases per grouping key, in first-seen order.
///
/// Rows with an empty key are skipped.
#[must_use]
pub fn totals_by(
    rows: &[ObservationRow],
    group_by: GroupBy,
    filter: &RowFilter,
) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for row in rows.iter().filter(|row| filter.matches(row)) {
        let key = group_by.key(row);
        if key.is_empty() {
            continue;
        }
        let idx = *index.entry(key).or_insert_with(|| {
            totals.push(CategoryTotal {
                key: key.to_string(),
                total: 0,
            });
            totals.len() - 1
        });
        totals[idx].total = totals[idx].total.saturating_add(row.cases);
    }

    totals
}

/// Case totals per year, in ascending year order.
#[must_use]
pub fn year_series(rows: &[ObservationRow], filter: &RowFilter) -> Vec<CategoryTotal> {
    let mut totals = totals_by(rows, GroupBy::Year, filter);
    totals.sort_by(|a, b| compare_years(&a.key, &b.key));
    totals
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
            population_density: population / 100.0,
        }
    }

    #[test]
    fn sums_cases_and_keeps_first_population() {
        let rows = vec![
            row("CA", "2020", "Flu", 100, 1000.0),
            row("CA", "2021", "Flu", 200, 1000.0),
        ];

        let summaries = aggregate(
            &rows,
            &RowFilter::all().with_disease("Flu"),
            AccumulationPolicy::FirstSeen,
        );

        assert_eq!(summaries.len(), 1);
        let ca = summaries.get("CA").unwrap();
        assert_eq!(ca.cases, 300);
        assert!((ca.population - 1000.0).abs() < f64::EPSILON);
        assert!((ca.per100k - 30_000.0).abs() < 1e-9);
    }

    #[test]
    fn first_seen_and_max_policies_differ() {
        let rows = vec![
            row("TX", "2020", "Flu", 1, 500.0),
            row("TX", "2021", "Flu", 1, 800.0),
        ];

        let first = aggregate(&rows, &RowFilter::all(), AccumulationPolicy::FirstSeen);
        let max = aggregate(&rows, &RowFilter::all(), AccumulationPolicy::Max);

        assert!((first.get("TX").unwrap().population - 500.0).abs() < f64::EPSILON);
        assert!((max.get("TX").unwrap().population - 800.0).abs() < f64::EPSILON);
        assert!((max.get("TX").unwrap().density - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_seen_fills_unknown_population_later() {
        let rows = vec![
            row("TX", "2020", "Flu", 1, 0.0),
            row("TX", "2021", "Flu", 1, 800.0),
            row("TX", "2022", "Flu", 1, 900.0),
        ];
        let summaries = aggregate(&rows, &RowFilter::all(), AccumulationPolicy::FirstSeen);
        assert!((summaries.get("TX").unwrap().population - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn filters_by_disease_and_year_string() {
        let rows = vec![
            row("CA", "2020", "Flu", 10, 100.0),
            row("CA", "2020", "Measles", 5, 100.0),
            row("NY", "2021", "Flu", 7, 100.0),
        ];

        let summaries = aggregate(
            &rows,
            &RowFilter::all().with_disease("Flu").with_year("2020"),
            AccumulationPolicy::FirstSeen,
        );

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries.get("CA").unwrap().cases, 10);
        assert!(!summaries.contains("NY"));
    }

    #[test]
    fn unknown_population_gives_zero_rate() {
        let rows = vec![row("CA", "2020", "Flu", 10, 0.0)];
        let summaries = aggregate(&rows, &RowFilter::all(), AccumulationPolicy::FirstSeen);
        assert!(summaries.get("CA").unwrap().per100k.abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let rows = vec![
            row("CA", "2020", "Flu", 10, 100.0),
            row("NY", "2020", "Flu", 3, 50.0),
            row("CA", "2021", "Flu", 4, 120.0),
        ];
        let filter = RowFilter::all().with_disease("Flu");

        let a = aggregate(&rows, &filter, AccumulationPolicy::FirstSeen);
        let b = aggregate(&rows, &filter, AccumulationPolicy::FirstSeen);
        assert_eq!(a, b);
    }

    #[test]
    fn skips_rows_without_state() {
        let rows = vec![row("", "2020", "Flu", 10, 100.0)];
        assert!(aggregate(&rows, &RowFilter::all(), AccumulationPolicy::FirstSeen).is_empty());
    }

    #[test]
    fn totals_keep_first_seen_order() {
        let rows = vec![
            row("CA", "2021", "Flu", 1, 0.0),
            row("CA", "2020", "Flu", 2, 0.0),
            row("CA", "2021", "Flu", 3, 0.0),
        ];
        let totals = totals_by(&rows, GroupBy::Year, &RowFilter::all());
        assert_eq!(
            totals,
            vec![
                CategoryTotal { key: "2021".to_string(), total: 4 },
                CategoryTotal { key: "2020".to_string(), total: 2 },
            ]
        );
    }

    #[test]
    fn year_series_sorts_numerically() {
        let rows = vec![
            row("CA", "2010", "Flu", 1, 0.0),
            row("CA", "999", "Flu", 2, 0.0),
            row("CA", "2002", "Flu", 3, 0.0),
        ];
        let years: Vec<String> = year_series(&rows, &RowFilter::all())
            .into_iter()
            .map(|t| t.key)
            .collect();
        assert_eq!(years, vec!["999", "2002", "2010"]);
    }
}
