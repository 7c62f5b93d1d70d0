//! Stable ranking of per-state summaries.

use std::cmp::Ordering;

use epi_map_analytics_models::SortMode;
use epi_map_observation_models::{StateSummaries, StateSummary};

/// Returns the summaries ordered by `mode`.
///
/// The sort is stable, so ties keep the first-seen order of `summaries`.
#[must_use]
pub fn rank(summaries: &StateSummaries, mode: SortMode) -> Vec<StateSummary> {
    let mut ranked: Vec<StateSummary> = summaries.iter().cloned().collect();
    sort_summaries(&mut ranked, mode);
    ranked
}

/// Sorts `summaries` in place by `mode` (stable).
pub fn sort_summaries(summaries: &mut [StateSummary], mode: SortMode) {
    summaries.sort_by(|a, b| compare(a, b, mode));
}

fn compare(a: &StateSummary, b: &StateSummary, mode: SortMode) -> Ordering {
    match mode {
        SortMode::CasesAsc => a.cases.cmp(&b.cases),
        SortMode::CasesDesc => b.cases.cmp(&a.cases),
        SortMode::AlphaAsc => compare_names(&a.state, &b.state),
        SortMode::AlphaDesc => compare_names(&b.state, &a.state),
        SortMode::PopulationDesc => b.population.total_cmp(&a.population),
        SortMode::DensityDesc => b.density.total_cmp(&a.density),
        SortMode::Per100kDesc => b.per100k.total_cmp(&a.per100k),
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
