//! Category extraction, top-N selection and year intersection.

use std::collections::BTreeSet;

use epi_map_analytics_models::{CategoryTotal, GroupBy, RowFilter};
use epi_map_observation_models::{ObservationRow, compare_years, parse_numeric};

use crate::aggregate::totals_by;

/// Distinct non-empty values of a column, sorted.
#[must_use]
pub fn unique_sorted(rows: &[ObservationRow], group_by: GroupBy) -> Vec<String> {
    unique_sorted_values(rows.iter().map(|row| group_by.key(row)))
}

/// Distinct non-empty values, sorted numerically when every value is a
/// number and lexicographically otherwise.
#[must_use]
pub fn unique_sorted_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let distinct: BTreeSet<&str> = values.into_iter().filter(|v| !v.is_empty()).collect();
    let mut values: Vec<String> = distinct.into_iter().map(str::to_string).collect();

    if values.iter().all(|v| parse_numeric(v).is_some()) {
        values.sort_by(|a, b| compare_years(a, b));
    }

    values
}

/// The `n` keys with the largest case totals, largest first.
///
/// Ties keep the order in which keys were first seen.
#[must_use]
pub fn top_n(
    rows: &[ObservationRow],
    group_by: GroupBy,
    n: usize,
    filter: &RowFilter,
) -> Vec<String> {
    top_n_totals(totals_by(rows, group_by, filter), n)
        .into_iter()
        .map(|t| t.key)
        .collect()
}

/// Sorts totals descending (stable) and keeps the first `n`.
#[must_use]
pub fn top_n_totals(mut totals: Vec<CategoryTotal>, n: usize) -> Vec<CategoryTotal> {
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals.truncate(n);
    totals
}

/// Years observed for every one of `diseases`, in ascending year order.
///
/// Years missing from any disease are excluded; nothing is padded or
/// interpolated. An empty disease list yields no years.
#[must_use]
pub fn common_years(
    rows: &[ObservationRow],
    diseases: &[String],
    filter: &RowFilter,
) -> Vec<String> {
    let sets: Vec<BTreeSet<&str>> = diseases
        .iter()
        .map(|disease| {
            rows.iter()
                .filter(|row| {
                    row.disease == *disease && !row.year.is_empty() && filter.matches(row)
                })
                .map(|row| row.year.as_str())
                .collect()
        })
        .collect();

    intersect_years(&sets)
}

/// Intersection of several year sets, in ascending year order.
#[must_use]
pub fn intersect_years(sets: &[BTreeSet<&str>]) -> Vec<String> {
    let Some((first, rest)) = sets.split_first() else {
        return Vec::new();
    };

    let mut years: Vec<String> = first
        .iter()
        .filter(|year| rest.iter().all(|set| set.contains(*year)))
        .map(|year| (*year).to_string())
        .collect();

    years.sort_by(|a, b| compare_years(a, b));
    years
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state: &str, year: &str, disease: &str, cases: u64) -> ObservationRow {
        ObservationRow {
            state: state.to_string(),
            year: year.to_string(),
            disease: disease.to_string(),
            cases,
            ..ObservationRow::default()
        }
    }

    #[test]
    fn unique_values_sort_numerically_when_all_numeric() {
        let values = unique_sorted_values(["2010", "999", "2010", "", "2002"]);
        assert_eq!(values, vec!["999", "2002", "2010"]);
    }

    #[test]
    fn unique_values_sort_lexicographically_when_mixed() {
        let values = unique_sorted_values(["Zika", "2010", "Anthrax", "Zika"]);
        assert_eq!(values, vec!["2010", "Anthrax", "Zika"]);
    }

    #[test]
    fn unique_sorted_reads_column() {
        let rows = vec![row("TX", "2020", "Flu", 1), row("CA", "2021", "Flu", 1)];
        assert_eq!(unique_sorted(&rows, GroupBy::State), vec!["CA", "TX"]);
        assert_eq!(unique_sorted(&rows, GroupBy::Disease), vec!["Flu"]);
    }

    #[test]
    fn top_two_by_total() {
        let rows = vec![
            row("A", "2020", "x", 50),
            row("B", "2020", "x", 200),
            row("C", "2020", "x", 10),
            row("D", "2020", "x", 300),
        ];
        assert_eq!(top_n(&rows, GroupBy::State, 2, &RowFilter::all()), vec!["D", "B"]);
    }

    #[test]
    fn top_n_ties_keep_first_seen_order() {
        let rows = vec![
            row("A", "2020", "Flu", 5),
            row("A", "2020", "Mumps", 5),
            row("A", "2020", "Measles", 9),
        ];
        assert_eq!(
            top_n(&rows, GroupBy::Disease, 3, &RowFilter::all()),
            vec!["Measles", "Flu", "Mumps"]
        );
    }

    #[test]
    fn top_n_larger_than_categories() {
        let rows = vec![row("A", "2020", "Flu", 5)];
        assert_eq!(top_n(&rows, GroupBy::Disease, 4, &RowFilter::all()), vec!["Flu"]);
    }

    #[test]
    fn intersects_years_across_diseases() {
        let rows = vec![
            row("CA", "2018", "A", 1),
            row("CA", "2019", "A", 1),
            row("CA", "2020", "A", 1),
            row("CA", "2019", "B", 1),
            row("CA", "2020", "B", 1),
            row("CA", "2021", "B", 1),
        ];
        let years = common_years(
            &rows,
            &["A".to_string(), "B".to_string()],
            &RowFilter::all(),
        );
        assert_eq!(years, vec!["2019", "2020"]);
    }

    #[test]
    fn unknown_disease_empties_intersection() {
        let rows = vec![row("CA", "2018", "A", 1)];
        let years = common_years(
            &rows,
            &["A".to_string(), "Nope".to_string()],
            &RowFilter::all(),
        );
        assert!(years.is_empty());
    }

    #[test]
    fn no_diseases_no_years() {
        let rows = vec![row("CA", "2018", "A", 1)];
        assert!(common_years(&rows, &[], &RowFilter::all()).is_empty());
    }
}
