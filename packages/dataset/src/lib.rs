#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads the observation dataset once and hands out a shared, immutable
//! handle to it.
//!
//! Loading never fails outright: a missing or malformed CSV produces an
//! empty [`Dataset`] together with a [`LoadNotice`] describing what went
//! wrong, so the dashboard can still come up and show the message.
//! Normalized rows are cached on disk (see [`cache`]) keyed by a
//! fingerprint of the source file.

pub mod cache;
pub mod config;
pub mod preferences;

use std::path::Path;
use std::sync::Arc;

use epi_map_geography::GeoError;
use epi_map_normalize::{AliasTable, NormalizeError, normalize_records, records::read_records};
use epi_map_observation_models::ObservationRow;
use geojson::FeatureCollection;
use serde::Serialize;
use thiserror::Error;

pub use config::{ConfigError, EpiMapConfig};
pub use epi_map_dataset_models::{LoadSource, Preferences, Theme};
pub use preferences::{load_preferences, save_preferences};

/// Errors that can occur while loading or persisting data.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV could not be read.
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Boundary loading failed.
    #[error("Geography error: {0}")]
    Geo(#[from] GeoError),
}

/// Shared, immutable view of the normalized rows.
///
/// Cloning is cheap; every clone points at the same rows.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Arc<[ObservationRow]>,
}

impl Dataset {
    /// Wraps `rows` in a shared handle.
    #[must_use]
    pub fn new(rows: Vec<ObservationRow>) -> Self {
        Self { rows: rows.into() }
    }

    /// The rows, in source order.
    #[must_use]
    pub fn rows(&self) -> &[ObservationRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// User-visible message describing a degraded load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadNotice {
    /// What went wrong.
    pub message: String,
}

impl LoadNotice {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of [`load_dataset`].
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    /// The rows.
    pub dataset: Dataset,
    /// Where they came from.
    pub source: LoadSource,
    /// Records dropped during normalization.
    pub dropped: usize,
    /// Set when the load was degraded.
    pub notice: Option<LoadNotice>,
}

impl LoadedDataset {
    fn empty(notice: LoadNotice) -> Self {
        Self {
            dataset: Dataset::default(),
            source: LoadSource::Empty,
            dropped: 0,
            notice: Some(notice),
        }
    }
}

/// Loads and normalizes the CSV at `path`.
///
/// When `cache_dir` is given, a matching cache is used instead of
/// parsing, and a fresh parse is written back. Cache failures are logged
/// and otherwise ignored. Any failure to read the CSV yields an empty
/// dataset with a notice.
#[must_use]
pub fn load_dataset(path: &Path, aliases: &AliasTable, cache_dir: Option<&Path>) -> LoadedDataset {
    match try_load_dataset(path, aliases, cache_dir) {
        Ok(loaded) => {
            log::info!(
                "Loaded {} rows from {} ({})",
                loaded.dataset.len(),
                path.display(),
                loaded.source
            );
            loaded
        }
        Err(e) => {
            log::warn!("Failed to load dataset {}: {e}", path.display());
            LoadedDataset::empty(LoadNotice::new(format!(
                "Could not load dataset {}: {e}",
                path.display()
            )))
        }
    }
}

fn try_load_dataset(
    path: &Path,
    aliases: &AliasTable,
    cache_dir: Option<&Path>,
) -> Result<LoadedDataset, DatasetError> {
    let bytes = std::fs::read(path)?;
    let fingerprint = cache::fingerprint(&bytes, aliases);

    if let Some(dir) = cache_dir
        && let Some(cached) = cache::read_cache(dir, &fingerprint)
    {
        return Ok(with_empty_notice(LoadedDataset {
            dataset: Dataset::new(cached.rows),
            source: LoadSource::Cache,
            dropped: cached.dropped,
            notice: None,
        }));
    }

    let records = read_records(bytes.as_slice())?;
    let batch = normalize_records(&records, aliases);

    if let Some(dir) = cache_dir
        && let Err(e) = cache::write_cache(dir, &fingerprint, &batch.rows, batch.dropped)
    {
        log::warn!("Failed to write dataset cache to {}: {e}", dir.display());
    }

    Ok(with_empty_notice(LoadedDataset {
        dataset: Dataset::new(batch.rows),
        source: LoadSource::Csv,
        dropped: batch.dropped,
        notice: None,
    }))
}

fn with_empty_notice(mut loaded: LoadedDataset) -> LoadedDataset {
    if loaded.dataset.is_empty() {
        loaded.notice = Some(LoadNotice::new(
            "The dataset contains no rows with both a state and a year",
        ));
    }
    loaded
}

/// Loads and normalizes the dataset described by `config`.
///
/// # Errors
///
/// * If the configured aliases name an unknown field
pub fn load_configured(config: &EpiMapConfig) -> Result<LoadedDataset, ConfigError> {
    let aliases = config.alias_table()?;
    let cache_dir = config.cache.enabled.then_some(config.cache.dir.as_path());
    Ok(load_dataset(&config.data.dataset, &aliases, cache_dir))
}

/// Loads the boundary file, falling back to an empty collection with a
/// notice when it is unset or unusable.
#[must_use]
pub fn load_boundaries_or_empty(path: Option<&Path>) -> (FeatureCollection, Option<LoadNotice>) {
    let Some(path) = path else {
        return (
            epi_map_geography::empty_collection(),
            Some(LoadNotice::new("No boundary file configured")),
        );
    };

    match epi_map_geography::load_boundaries(path) {
        Ok(collection) => (collection, None),
        Err(e) => {
            let e = DatasetError::from(e);
            log::warn!("Failed to load boundaries {}: {e}", path.display());
            (
                epi_map_geography::empty_collection(),
                Some(LoadNotice::new(format!(
                    "Could not load boundaries {}: {e}",
                    path.display()
                ))),
            )
        }
    }
}
