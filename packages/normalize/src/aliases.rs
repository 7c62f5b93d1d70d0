//! Declarative alias table mapping canonical fields to source headers.
//!
//! Source datasets spell their headers in many ways (`state`, `State`,
//! `location`, `Population Density`, ...). Each [`CanonicalField`] has an
//! ordered list of accepted source keys, and a single generic [`lookup`]
//! resolves a field against a raw record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A field of the canonical observation schema.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CanonicalField {
    /// State or region name.
    State,
    /// Observation year.
    Year,
    /// Disease name.
    Disease,
    /// Case count.
    Cases,
    /// Population.
    Population,
    /// Population density.
    PopulationDensity,
}

// ── Built-in aliases ─────────────────────────────────────────────────────

const BUILTIN_ALIASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::State,
        &[
            "state",
            "State",
            "STATE",
            "state_name",
            "STATE_NAME",
            "location",
            "Location",
            "province",
            "Province",
            "region",
            "Region",
            "jurisdiction",
        ],
    ),
    (
        CanonicalField::Year,
        &["year", "Year", "YEAR", "yr", "report_year", "mmwr_year"],
    ),
    (
        CanonicalField::Disease,
        &[
            "disease",
            "Disease",
            "DISEASE",
            "disease_name",
            "condition",
            "Condition",
            "illness",
        ],
    ),
    (
        CanonicalField::Cases,
        &[
            "cases",
            "Cases",
            "CASES",
            "case_count",
            "total_cases",
            "count",
            "Count",
        ],
    ),
    (
        CanonicalField::Population,
        &[
            "population",
            "Population",
            "POPULATION",
            "total_population",
            "pop",
            "Pop",
        ],
    ),
    (
        CanonicalField::PopulationDensity,
        &[
            "population_density",
            "PopulationDensity",
            "populationDensity",
            "Population Density",
            "POPULATION_DENSITY",
            "pop_density",
            "density",
            "Density",
        ],
    ),
];

/// Ordered list of accepted source keys per canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    fields: BTreeMap<CanonicalField, Vec<String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let fields = BUILTIN_ALIASES
            .iter()
            .map(|(field, aliases)| {
                (
                    *field,
                    aliases.iter().map(|a| (*a).to_string()).collect::<Vec<_>>(),
                )
            })
            .collect();
        Self { fields }
    }
}

impl AliasTable {
    /// Returns the accepted source keys for `field`, in priority order.
    #[must_use]
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.fields.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Appends extra aliases for `field` after the existing ones.
    /// Aliases already present are skipped.
    #[must_use]
    pub fn with_extra<I, S>(mut self, field: CanonicalField, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.fields.entry(field).or_default();
        for alias in aliases {
            let alias = alias.into();
            if !list.contains(&alias) {
                list.push(alias);
            }
        }
        self
    }

    /// Appends every configured extra alias.
    #[must_use]
    pub fn with_extras(self, extras: &BTreeMap<CanonicalField, Vec<String>>) -> Self {
        extras
            .iter()
            .fold(self, |table, (field, aliases)| {
                table.with_extra(*field, aliases.iter().cloned())
            })
    }
}

/// Resolves the first alias present in `record` with a non-null value.
///
/// Exact keys are tried first, in alias order. If none match, keys are
/// compared again case-insensitively with `' '`, `'-'` and `'_'` treated
/// as the same character.
#[must_use]
pub fn lookup<'a>(
    record: &'a serde_json::Map<String, serde_json::Value>,
    aliases: &[String],
) -> Option<&'a serde_json::Value> {
    let present = |value: &&serde_json::Value| !value.is_null();

    if let Some(value) = aliases
        .iter()
        .find_map(|alias| record.get(alias).filter(present))
    {
        return Some(value);
    }

    aliases.iter().find_map(|alias| {
        let wanted = fold_key(alias);
        record
            .iter()
            .find(|(key, value)| !value.is_null() && fold_key(key) == wanted)
            .map(|(_, value)| value)
    })
}

fn fold_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator as _;

    use super::*;

    fn record(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn every_field_has_builtin_aliases() {
        let table = AliasTable::default();
        for field in CanonicalField::iter() {
            assert!(!table.aliases(field).is_empty(), "no aliases for {field}");
        }
    }

    #[test]
    fn exact_alias_order_wins() {
        let table = AliasTable::default();
        let rec = record(serde_json::json!({ "location": "Texas", "State": "California" }));
        let value = lookup(&rec, table.aliases(CanonicalField::State));
        assert_eq!(value.and_then(|v| v.as_str()), Some("California"));
    }

    #[test]
    fn null_values_are_skipped() {
        let table = AliasTable::default();
        let rec = record(serde_json::json!({ "state": null, "location": "Ohio" }));
        let value = lookup(&rec, table.aliases(CanonicalField::State));
        assert_eq!(value.and_then(|v| v.as_str()), Some("Ohio"));
    }

    #[test]
    fn empty_string_counts_as_present() {
        let table = AliasTable::default();
        let rec = record(serde_json::json!({ "state": "", "location": "Ohio" }));
        let value = lookup(&rec, table.aliases(CanonicalField::State));
        assert_eq!(value.and_then(|v| v.as_str()), Some(""));
    }

    #[test]
    fn falls_back_to_case_insensitive_keys() {
        let table = AliasTable::default();
        let rec = record(serde_json::json!({ "DiSeAsE": "Measles", "POPULATION-DENSITY": "12.5" }));
        assert_eq!(
            lookup(&rec, table.aliases(CanonicalField::Disease)).and_then(|v| v.as_str()),
            Some("Measles")
        );
        assert_eq!(
            lookup(&rec, table.aliases(CanonicalField::PopulationDensity))
                .and_then(|v| v.as_str()),
            Some("12.5")
        );
    }

    #[test]
    fn missing_field_returns_none() {
        let table = AliasTable::default();
        let rec = record(serde_json::json!({ "unrelated": 1 }));
        assert!(lookup(&rec, table.aliases(CanonicalField::Cases)).is_none());
    }

    #[test]
    fn extra_aliases_are_appended_once() {
        let table = AliasTable::default()
            .with_extra(CanonicalField::Cases, ["reported"])
            .with_extra(CanonicalField::Cases, ["reported", "cases"]);
        let aliases = table.aliases(CanonicalField::Cases);
        assert_eq!(aliases.last().map(String::as_str), Some("reported"));
        assert_eq!(aliases.iter().filter(|a| *a == "reported").count(), 1);
        assert_eq!(aliases.iter().filter(|a| *a == "cases").count(), 1);

        let rec = record(serde_json::json!({ "reported": 7 }));
        assert_eq!(
            lookup(&rec, table.aliases(CanonicalField::Cases)).and_then(serde_json::Value::as_u64),
            Some(7)
        );
    }
}
