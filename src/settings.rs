//! World settings
//!
//! Loaded from JSON; every field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_FPS;
use crate::error::EngineResult;

/// World configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Simulation steps per second
    #[serde(rename = "FPS", alias = "fps")]
    pub fps: u32,
    /// Start paused
    pub paused: bool,
    /// Draw entities ordered by `zIndex`
    pub z_sort: bool,

    // === Composition ===
    /// World modules applied after the defaults
    pub included_modules: Vec<String>,
    /// World modules to leave out, defaults included
    pub excluded_modules: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            paused: false,
            z_sort: false,
            included_modules: Vec::new(),
            excluded_modules: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Like [`Settings::load`], falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Using default settings ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_defaults_from_empty_object() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fps, 30);
        assert!(!settings.paused);
    }

    #[test]
    fn test_field_names() {
        let settings = Settings::from_json(
            r#"{"FPS": 60, "zSort": true, "excludedModules": ["delay"]}"#,
        )
        .unwrap();
        assert_eq!(settings.fps, 60);
        assert!(settings.z_sort);
        assert_eq!(settings.excluded_modules, vec!["delay"]);

        let lower = Settings::from_json(r#"{"fps": 12}"#).unwrap();
        assert_eq!(lower.fps, 12);
    }

    #[test]
    fn test_round_trip_json() {
        let settings = Settings {
            paused: true,
            included_modules: vec!["collision".into()],
            ..Settings::default()
        };
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"FPS\""));
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_data_error() {
        let err = Settings::from_json(r#"{"FPS": "fast"}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidData(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("gamelib-settings-that-does-not-exist.json");
        assert!(matches!(Settings::load(&path), Err(EngineError::Io(_))));
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gamelib-settings-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"paused": true}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(settings.paused);
    }
}
