#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types describing how the dataset was loaded and what the user has
//! chosen to keep between sessions.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Bump whenever the preferences layout changes.
pub const PREFERENCES_VERSION: u32 = 1;

/// Where the loaded rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoadSource {
    /// Parsed and normalized from the CSV.
    Csv,
    /// Read back from the on-disk cache.
    Cache,
    /// Nothing could be loaded.
    Empty,
}

/// Dashboard color theme.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Contents of `preferences.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Layout version the file was written with.
    pub version: u32,
    /// Selected theme.
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::with_theme(Theme::default())
    }
}

impl Preferences {
    /// Preferences with the given theme.
    #[must_use]
    pub const fn with_theme(theme: Theme) -> Self {
        Self {
            version: PREFERENCES_VERSION,
            theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parses_and_toggles() {
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().to_string(), "light");
        assert!("neon".parse::<Theme>().is_err());
    }

    #[test]
    fn load_source_names() {
        assert_eq!(LoadSource::Cache.to_string(), "cache");
        assert_eq!(
            serde_json::to_string(&LoadSource::Empty).unwrap(),
            "\"empty\""
        );
    }

    #[test]
    fn default_preferences_carry_current_version() {
        let prefs = Preferences::default();
        assert_eq!(prefs.version, PREFERENCES_VERSION);
        assert_eq!(prefs.theme, Theme::Light);
    }
}
