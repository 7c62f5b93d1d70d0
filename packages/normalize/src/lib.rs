#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Maps loosely-typed dataset records onto [`ObservationRow`] values.
//!
//! Header spelling and casing are not guaranteed in source files, so each
//! canonical field is resolved through an [`AliasTable`]. Normalization is
//! total: [`normalize_record`] never fails and never filters. Dropping
//! rows without a state or year is the job of [`normalize_records`], the
//! caller-side boundary used by every loader.

pub mod aliases;
pub mod coerce;
pub mod records;

use epi_map_observation_models::ObservationRow;
use thiserror::Error;

pub use aliases::{AliasTable, CanonicalField, lookup};

use coerce::{coerce_count, coerce_number, coerce_text};

/// Errors that can occur while reading source records.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input was structurally unusable.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Converts one raw record into a canonical row.
///
/// Fields that cannot be resolved fall back to an empty string or zero.
/// A non-object input produces an empty (invalid) row.
#[must_use]
pub fn normalize_record(record: &serde_json::Value, aliases: &AliasTable) -> ObservationRow {
    let Some(map) = record.as_object() else {
        return ObservationRow::default();
    };

    let field = |f: CanonicalField| lookup(map, aliases.aliases(f));

    ObservationRow {
        state: coerce_text(field(CanonicalField::State)),
        year: coerce_text(field(CanonicalField::Year)),
        disease: coerce_text(field(CanonicalField::Disease)),
        cases: coerce_count(field(CanonicalField::Cases)),
        population: coerce_number(field(CanonicalField::Population)),
        population_density: coerce_number(field(CanonicalField::PopulationDensity)),
    }
}

/// Result of normalizing a batch of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Rows with both a state and a year.
    pub rows: Vec<ObservationRow>,
    /// Number of records dropped for lacking a state or year.
    pub dropped: usize,
}

/// Normalizes every record and drops rows without a state or year.
#[must_use]
pub fn normalize_records(records: &[serde_json::Value], aliases: &AliasTable) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for record in records {
        let row = normalize_record(record, aliases);
        if row.is_valid() {
            batch.rows.push(row);
        } else {
            batch.dropped += 1;
        }
    }

    if batch.dropped > 0 {
        log::warn!(
            "Dropped {} of {} records without a state or year",
            batch.dropped,
            records.len()
        );
    }
    log::debug!("Normalized {} rows", batch.rows.len());

    batch
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_canonical_headers() {
        let row = normalize_record(
            &json!({
                "state": "CA",
                "year": "2020",
                "disease": "Flu",
                "cases": "100",
                "population": "1000",
                "population_density": "250.5",
            }),
            &AliasTable::default(),
        );

        assert_eq!(row.state, "CA");
        assert_eq!(row.year, "2020");
        assert_eq!(row.disease, "Flu");
        assert_eq!(row.cases, 100);
        assert!((row.population - 1000.0).abs() < f64::EPSILON);
        assert!((row.population_density - 250.5).abs() < f64::EPSILON);
        assert!((row.per100k() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn normalizes_header_variants() {
        let row = normalize_record(
            &json!({
                "Location": "Texas",
                "YEAR": 2019,
                "Condition": "Measles",
                "Count": "1,200",
                "Population": 29_000_000,
                "Population Density": "111",
            }),
            &AliasTable::default(),
        );

        assert_eq!(row.state, "Texas");
        assert_eq!(row.year, "2019");
        assert_eq!(row.disease, "Measles");
        assert_eq!(row.cases, 1200);
        assert!((row.population - 29_000_000.0).abs() < f64::EPSILON);
        assert!((row.population_density - 111.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_object_produces_empty_row() {
        let row = normalize_record(&json!({}), &AliasTable::default());
        assert_eq!(row, ObservationRow::default());
        assert!(row.per100k().abs() < f64::EPSILON);
    }

    #[test]
    fn non_object_input_produces_empty_row() {
        for raw in [json!(null), json!(5), json!("state"), json!([1, 2])] {
            assert_eq!(
                normalize_record(&raw, &AliasTable::default()),
                ObservationRow::default()
            );
        }
    }

    #[test]
    fn per100k_matches_formula_for_any_population() {
        let aliases = AliasTable::default();
        for (cases, population) in [("10", "0"), ("10", "abc"), ("7", "3"), ("0", "50")] {
            let row = normalize_record(
                &json!({ "state": "X", "year": "1", "cases": cases, "population": population }),
                &aliases,
            );
            #[allow(clippy::cast_precision_loss)]
            let expected = if row.population > 0.0 {
                row.cases as f64 / row.population * 100_000.0
            } else {
                0.0
            };
            assert!((row.per100k() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn configured_aliases_are_used() {
        let aliases = AliasTable::default().with_extra(CanonicalField::Cases, ["reported_cases"]);
        let row = normalize_record(&json!({ "reported_cases": "9" }), &aliases);
        assert_eq!(row.cases, 9);
    }

    #[test]
    fn batch_drops_rows_without_state_or_year() {
        let records = vec![
            json!({ "state": "CA", "year": "2020", "cases": 1 }),
            json!({ "state": "", "year": "2020", "cases": 1 }),
            json!({ "state": "TX", "cases": 1 }),
            json!({}),
        ];

        let batch = normalize_records(&records, &AliasTable::default());
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.dropped, 3);
        assert_eq!(batch.rows[0].state, "CA");
    }

    #[test]
    fn reads_and_normalizes_csv() {
        let csv = "STATE,Year,disease,CASES,pop\nCA,2020,Flu,100,1000\n,2020,Flu,5,10\n";
        let records = records::read_records(csv.as_bytes()).unwrap();
        let batch = normalize_records(&records, &AliasTable::default());
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.dropped, 1);
        assert_eq!(batch.rows[0].cases, 100);
        assert!((batch.rows[0].population - 1000.0).abs() < f64::EPSILON);
    }
}
