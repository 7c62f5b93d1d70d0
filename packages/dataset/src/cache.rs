//! Versioned on-disk cache of normalized rows.
//!
//! The cache file records the schema version and an MD5 fingerprint of
//! the inputs that produced it. A cache whose version or fingerprint
//! does not match is ignored and later overwritten.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use epi_map_normalize::{AliasTable, CanonicalField};
use epi_map_observation_models::ObservationRow;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use crate::DatasetError;

/// Bump whenever the cached row layout or normalization rules change.
pub const CACHE_SCHEMA_VERSION: u32 = 2;

/// File name of the dataset cache inside the cache directory.
pub const DATASET_CACHE_FILE: &str = "dataset.json";

/// Contents of `dataset.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedDataset {
    /// Schema version the file was written with.
    pub version: u32,
    /// Fingerprint of the source bytes and alias table.
    pub source_fingerprint: String,
    /// When the cache was written.
    pub cached_at: DateTime<Utc>,
    /// Records dropped while normalizing the source.
    pub dropped: usize,
    /// Normalized rows.
    pub rows: Vec<ObservationRow>,
}

/// MD5 hex digest of the CSV bytes followed by every alias, so that
/// changing either invalidates the cache.
#[must_use]
pub fn fingerprint(source: &[u8], aliases: &AliasTable) -> String {
    let mut context = md5::Context::new();
    context.consume(source);
    for field in CanonicalField::iter() {
        context.consume(field.as_ref().as_bytes());
        for alias in aliases.aliases(field) {
            context.consume([0u8]);
            context.consume(alias.as_bytes());
        }
        context.consume([0xffu8]);
    }
    format!("{:x}", context.finalize())
}

/// Path of the dataset cache inside `dir`.
#[must_use]
pub fn cache_path(dir: &Path) -> PathBuf {
    dir.join(DATASET_CACHE_FILE)
}

/// Returns the cache if it exists, has the current schema version and
/// was built from inputs with `fingerprint`.
///
/// Unreadable or stale caches are logged and treated as misses.
#[must_use]
pub fn read_cache(dir: &Path, fingerprint: &str) -> Option<CachedDataset> {
    let path = cache_path(dir);
    if !path.exists() {
        log::debug!("No dataset cache at {}", path.display());
        return None;
    }

    let cached = match read_cache_file(&path) {
        Ok(cached) => cached,
        Err(e) => {
            log::warn!("Ignoring unreadable dataset cache {}: {e}", path.display());
            return None;
        }
    };

    if cached.version != CACHE_SCHEMA_VERSION {
        log::debug!(
            "Dataset cache version {} != {CACHE_SCHEMA_VERSION}, rebuilding",
            cached.version
        );
        return None;
    }
    if cached.source_fingerprint != fingerprint {
        log::debug!("Dataset cache fingerprint changed, rebuilding");
        return None;
    }

    log::info!(
        "Using dataset cache from {} ({} rows, {} dropped)",
        cached.cached_at,
        cached.rows.len(),
        cached.dropped
    );
    Some(cached)
}

fn read_cache_file(path: &Path) -> Result<CachedDataset, DatasetError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Writes `rows` and the count of records `dropped` while normalizing
/// them to the dataset cache in `dir`, creating the directory
/// if needed. The file is written next to its final path and renamed
/// into place.
///
/// # Errors
///
/// * If the directory cannot be created
/// * If the file cannot be written
pub fn write_cache(
    dir: &Path,
    fingerprint: &str,
    rows: &[ObservationRow],
    dropped: usize,
) -> Result<(), DatasetError> {
    std::fs::create_dir_all(dir)?;

    let cached = CachedDataset {
        version: CACHE_SCHEMA_VERSION,
        source_fingerprint: fingerprint.to_string(),
        cached_at: Utc::now(),
        dropped,
        rows: rows.to_vec(),
    };

    let path = cache_path(dir);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec(&cached)?)?;
    std::fs::rename(&tmp, &path)?;

    log::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
