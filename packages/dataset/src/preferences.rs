//! Persisted user preferences (currently just the color theme).

use std::path::{Path, PathBuf};

use epi_map_dataset_models::{PREFERENCES_VERSION, Preferences};

use crate::DatasetError;

/// File name of the preferences file inside the cache directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Path of the preferences file inside `dir`.
#[must_use]
pub fn preferences_path(dir: &Path) -> PathBuf {
    dir.join(PREFERENCES_FILE)
}

/// Reads saved preferences from `dir`.
///
/// A missing, unreadable or outdated file yields the defaults.
#[must_use]
pub fn load_preferences(dir: &Path) -> Preferences {
    let path = preferences_path(dir);
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Preferences::default();
    };

    match serde_json::from_str::<Preferences>(&contents) {
        Ok(prefs) if prefs.version == PREFERENCES_VERSION => prefs,
        Ok(prefs) => {
            log::debug!(
                "Preferences version {} != {PREFERENCES_VERSION}, using defaults",
                prefs.version
            );
            Preferences::default()
        }
        Err(e) => {
            log::warn!("Ignoring unreadable preferences {}: {e}", path.display());
            Preferences::default()
        }
    }
}

/// Writes `prefs` to `dir`, creating the directory if needed.
///
/// # Errors
///
/// * If the directory cannot be created
/// * If the file cannot be written
pub fn save_preferences(dir: &Path, prefs: &Preferences) -> Result<(), DatasetError> {
    std::fs::create_dir_all(dir)?;
    let stored = Preferences::with_theme(prefs.theme);
    std::fs::write(preferences_path(dir), serde_json::to_vec_pretty(&stored)?)?;
    log::debug!("Saved theme {}", stored.theme);
    Ok(())
}
