//! Joins aggregated state summaries onto boundary features.

use std::collections::BTreeSet;

use epi_map_analytics::{bin_index, histogram, metric_values};
use epi_map_analytics_models::Metric;
use epi_map_geography_models::{Choropleth, JoinStats, StateMatch, props, same_state};
use epi_map_observation_models::{StateSummaries, StateSummary};
use geojson::FeatureCollection;
use serde_json::Value;

use crate::feature_name;

/// Finds the summary for a feature name.
///
/// Tries an exact name match, then a case-insensitive match, then the
/// state table (so "CA" pairs with "California").
#[must_use]
pub fn match_state<'a>(
    summaries: &'a StateSummaries,
    name: &str,
) -> Option<(&'a StateSummary, StateMatch)> {
    if let Some(summary) = summaries.get(name) {
        return Some((summary, StateMatch::Exact));
    }
    if let Some(summary) = summaries
        .iter()
        .find(|s| s.state.eq_ignore_ascii_case(name))
    {
        return Some((summary, StateMatch::CaseInsensitive));
    }
    summaries
        .iter()
        .find(|s| same_state(&s.state, name))
        .map(|summary| (summary, StateMatch::Table))
}

/// Copies `boundaries` and writes `value`, `cases`, `per100k`,
/// `hasData`, `colorClass` and `dataState` onto every feature.
///
/// Features without data are kept with `hasData: false` and null values
/// so the map can draw them in a "no data" style.
#[must_use]
pub fn join(
    boundaries: &FeatureCollection,
    summaries: &StateSummaries,
    metric: Metric,
) -> Choropleth {
    let legend = histogram(&metric_values(summaries, metric));
    let mut collection = boundaries.clone();
    let mut stats = JoinStats {
        features: collection.features.len(),
        ..JoinStats::default()
    };
    let mut claimed: BTreeSet<String> = BTreeSet::new();

    for feature in &mut collection.features {
        let name = feature_name(feature).map(str::to_string);
        let matched = name
            .as_deref()
            .and_then(|name| match_state(summaries, name));

        if let Some((summary, how)) = matched {
            let value = metric.value(summary);
            log::trace!("Feature {name:?} matched {} ({how})", summary.state);

            feature.set_property(props::VALUE, value);
            feature.set_property(props::CASES, summary.cases);
            feature.set_property(props::PER_100K, summary.per100k);
            feature.set_property(props::HAS_DATA, true);
            feature.set_property(
                props::COLOR_CLASS,
                bin_index(&legend, value).map_or(Value::Null, Value::from),
            );
            feature.set_property(props::DATA_STATE, summary.state.clone());

            stats.matched += 1;
            claimed.insert(summary.state.clone());
        } else {
            feature.set_property(props::VALUE, Value::Null);
            feature.set_property(props::CASES, Value::Null);
            feature.set_property(props::PER_100K, Value::Null);
            feature.set_property(props::HAS_DATA, false);
            feature.set_property(props::COLOR_CLASS, Value::Null);
            feature.set_property(props::DATA_STATE, Value::Null);

            stats.unmatched.push(name.unwrap_or_default());
        }
    }

    stats.orphaned_states = summaries
        .iter()
        .filter(|s| !claimed.contains(&s.state))
        .map(|s| s.state.clone())
        .collect();

    if !stats.unmatched.is_empty() {
        log::debug!(
            "{} of {} features have no data: {:?}",
            stats.unmatched.len(),
            stats.features,
            stats.unmatched
        );
    }

    Choropleth {
        metric,
        legend,
        collection,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use epi_map_analytics::aggregate;
    use epi_map_analytics_models::RowFilter;
    use epi_map_observation_models::{AccumulationPolicy, ObservationRow};

    use super::*;
    use crate::parse_boundaries;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "California" }, "geometry": null },
            { "type": "Feature", "properties": { "NAME": "texas" }, "geometry": null },
            { "type": "Feature", "properties": { "STATE_NAME": "New York" }, "geometry": null },
            { "type": "Feature", "properties": { "name": "Ohio" }, "geometry": null },
            { "type": "Feature", "properties": null, "geometry": null }
        ]
    }"#;

    fn summaries() -> StateSummaries {
        let rows: Vec<ObservationRow> = [
            ("California", 300, 1000.0),
            ("Texas", 50, 500.0),
            ("NY", 10, 0.0),
            ("Guam", 1, 0.0),
        ]
        .into_iter()
        .map(|(state, cases, population)| ObservationRow {
            state: state.to_string(),
            year: "2020".to_string(),
            disease: "Measles".to_string(),
            cases,
            population,
            population_density: 0.0,
        })
        .collect();
        aggregate(&rows, &RowFilter::all(), AccumulationPolicy::FirstSeen)
    }

    fn prop<'a>(map: &'a Choropleth, idx: usize, key: &str) -> Option<&'a Value> {
        map.collection.features[idx].property(key)
    }

    #[test]
    fn matches_by_exact_case_and_table() {
        let summaries = summaries();
        assert_eq!(
            match_state(&summaries, "California").map(|(s, m)| (s.state.as_str(), m)),
            Some(("California", StateMatch::Exact))
        );
        assert_eq!(
            match_state(&summaries, "TEXAS").map(|(s, m)| (s.state.as_str(), m)),
            Some(("Texas", StateMatch::CaseInsensitive))
        );
        assert_eq!(
            match_state(&summaries, "New York").map(|(s, m)| (s.state.as_str(), m)),
            Some(("NY", StateMatch::Table))
        );
        assert!(match_state(&summaries, "Ohio").is_none());
    }

    #[test]
    fn join_decorates_every_feature() {
        let boundaries = parse_boundaries(BOUNDARIES).unwrap();
        let map = join(&boundaries, &summaries(), Metric::Cases);

        assert_eq!(map.collection.features.len(), 5);
        assert_eq!(prop(&map, 0, props::CASES), Some(&Value::from(300u64)));
        assert_eq!(prop(&map, 0, props::HAS_DATA), Some(&Value::Bool(true)));
        assert_eq!(prop(&map, 1, props::DATA_STATE), Some(&Value::from("Texas")));
        assert_eq!(prop(&map, 2, props::DATA_STATE), Some(&Value::from("NY")));

        assert_eq!(prop(&map, 3, props::HAS_DATA), Some(&Value::Bool(false)));
        assert_eq!(prop(&map, 3, props::VALUE), Some(&Value::Null));
        assert_eq!(prop(&map, 4, props::HAS_DATA), Some(&Value::Bool(false)));
    }

    #[test]
    fn join_reports_stats_and_colors() {
        let boundaries = parse_boundaries(BOUNDARIES).unwrap();
        let map = join(&boundaries, &summaries(), Metric::Cases);

        assert_eq!(map.stats.features, 5);
        assert_eq!(map.stats.matched, 3);
        assert_eq!(map.stats.unmatched, vec!["Ohio".to_string(), String::new()]);
        assert_eq!(map.stats.orphaned_states, vec!["Guam".to_string()]);

        assert_eq!(map.legend.total(), 4);
        let top = prop(&map, 0, props::COLOR_CLASS).and_then(Value::as_u64);
        assert_eq!(top, Some(3));
    }

    #[test]
    fn join_on_empty_boundaries() {
        let map = join(&crate::empty_collection(), &summaries(), Metric::Per100k);
        assert!(map.collection.features.is_empty());
        assert_eq!(map.stats.orphaned_states.len(), 4);
    }
}
