#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical observation rows and per-state summary types.
//!
//! Every data source is normalized into [`ObservationRow`] values before
//! any aggregation happens. Aggregation produces [`StateSummaries`], an
//! insertion-ordered collection of [`StateSummary`] values that is
//! recomputed on every filter change and never persisted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Scale factor for per-capita rates.
pub const PER_100K: f64 = 100_000.0;

/// One (state, year, disease) observation with its demographic context.
///
/// Constructed once per dataset load and read-only afterwards. The
/// per-100k rate is always derived from `cases` and `population` via
/// [`Self::per100k`] and is never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRow {
    /// State or region name. Empty when the source had no usable value.
    pub state: String,
    /// Year as found in the source (kept as text, e.g. `"2020"`).
    pub year: String,
    /// Disease name, case-sensitive as stored.
    pub disease: String,
    /// Case count.
    pub cases: u64,
    /// Population. `0.0` means unknown.
    pub population: f64,
    /// Population density. `0.0` means unknown.
    pub population_density: f64,
}

impl ObservationRow {
    /// Cases per 100,000 residents, or `0.0` when population is unknown.
    #[must_use]
    pub fn per100k(&self) -> f64 {
        rate_per_100k(self.cases, self.population)
    }

    /// Returns `true` if the row has both a state and a year.
    ///
    /// Rows failing this check must be dropped before aggregation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.state.is_empty() && !self.year.is_empty()
    }
}

/// Cases per 100,000 residents for a single row.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rate_per_100k(cases: u64, population: f64) -> f64 {
    if population > 0.0 {
        cases as f64 / population * PER_100K
    } else {
        0.0
    }
}

/// Cases per 100,000 residents for an aggregated summary.
///
/// The denominator is clamped to at least 1 so a fractional population
/// can never blow the rate up.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summary_rate_per_100k(cases: u64, population: f64) -> f64 {
    if population > 0.0 {
        cases as f64 / population.max(1.0) * PER_100K
    } else {
        0.0
    }
}

/// How population and density are chosen when several rows fold into
/// one state summary.
///
/// Rows for the same state usually repeat the same population figure
/// across years, so these values are never summed.
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
pub enum AccumulationPolicy {
    /// The first known (non-zero) value wins and is never overwritten.
    #[default]
    FirstSeen,
    /// The largest value across all folded rows wins.
    Max,
}

impl AccumulationPolicy {
    /// Folds an incoming value into the current one.
    #[must_use]
    pub fn fold(self, current: f64, incoming: f64) -> f64 {
        match self {
            Self::FirstSeen => {
                if current > 0.0 {
                    current
                } else {
                    incoming
                }
            }
            Self::Max => current.max(incoming),
        }
    }
}

/// Aggregated totals for a single state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    /// State name.
    pub state: String,
    /// Sum of cases over all participating rows.
    pub cases: u64,
    /// Population chosen by the [`AccumulationPolicy`].
    pub population: f64,
    /// Population density chosen by the [`AccumulationPolicy`].
    pub density: f64,
    /// Cases per 100,000 residents, computed after folding.
    pub per100k: f64,
}

impl StateSummary {
    /// Creates an empty summary for `state`.
    #[must_use]
    pub fn new(state: &str) -> Self {
        Self {
            state: state.to_string(),
            ..Self::default()
        }
    }

    /// Recomputes [`Self::per100k`] from the folded totals.
    pub fn finalize(&mut self) {
        self.per100k = summary_rate_per_100k(self.cases, self.population);
    }
}

/// Per-state summaries keyed by state name, iterated in the order each
/// state was first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSummaries {
    entries: Vec<StateSummary>,
    index: BTreeMap<String, usize>,
}

impl StateSummaries {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summary for `state`, creating an empty one at the end
    /// of the iteration order if it does not exist yet.
    pub fn entry(&mut self, state: &str) -> &mut StateSummary {
        let idx = if let Some(&idx) = self.index.get(state) {
            idx
        } else {
            let idx = self.entries.len();
            self.entries.push(StateSummary::new(state));
            self.index.insert(state.to_string(), idx);
            idx
        };
        &mut self.entries[idx]
    }

    /// Looks up the summary for `state`.
    #[must_use]
    pub fn get(&self, state: &str) -> Option<&StateSummary> {
        self.index.get(state).map(|&idx| &self.entries[idx])
    }

    /// Returns `true` if `state` has a summary.
    #[must_use]
    pub fn contains(&self, state: &str) -> bool {
        self.index.contains_key(state)
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no state has a summary.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates summaries in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, StateSummary> {
        self.entries.iter()
    }

    /// Recomputes every per-100k rate.
    pub fn finalize(&mut self) {
        for summary in &mut self.entries {
            summary.finalize();
        }
    }

    /// Consumes the collection, returning summaries in first-seen order.
    #[must_use]
    pub fn into_vec(self) -> Vec<StateSummary> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a StateSummaries {
    type Item = &'a StateSummary;
    type IntoIter = std::slice::Iter<'a, StateSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for StateSummaries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

/// Parses a trimmed string as a finite number.
#[must_use]
pub fn parse_numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Orders two year strings: numerically when both parse as numbers,
/// lexicographically otherwise.
#[must_use]
pub fn compare_years(a: &str, b: &str) -> Ordering {
    match (parse_numeric(a), parse_numeric(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}
