//! Durable client preferences: theme and the optional manually entered API key.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{GuardianError, Result};

pub const THEME_KEY: &str = "theme";
pub const API_KEY_KEY: &str = "gemini_api_key";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Self {
        match value {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Icon of the toggle button, showing the theme a click would switch to.
    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }
}

pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept in a small JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable preferences file");
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("first-aid-guardian").join("preferences.json"))
            .ok_or_else(|| {
                GuardianError::Preferences("Could not find config directory".to_string())
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)
            .map_err(|e| GuardianError::Preferences(format!("Failed to save preferences: {}", e)))
    }
}

pub fn load_theme(store: &dyn PreferenceStore) -> Theme {
    store
        .get(THEME_KEY)
        .map(|t| Theme::parse(&t))
        .unwrap_or_default()
}

pub fn load_api_key(store: &dyn PreferenceStore) -> Option<String> {
    store
        .get(API_KEY_KEY)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_toggle_and_icons() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.icon(), "☀️");
        assert_eq!(Theme::parse("sepia"), Theme::Light);
    }

    #[test]
    fn test_file_preferences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut prefs = FilePreferences::open(&path).unwrap();
        assert_eq!(load_theme(&prefs), Theme::Light);
        prefs.set(THEME_KEY, "dark").unwrap();
        prefs.set(API_KEY_KEY, " AIzaSecret ").unwrap();

        let reopened = FilePreferences::open(&path).unwrap();
        assert_eq!(load_theme(&reopened), Theme::Dark);
        assert_eq!(load_api_key(&reopened).as_deref(), Some("AIzaSecret"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        let prefs = FilePreferences::open(&path).unwrap();
        assert!(prefs.get(THEME_KEY).is_none());
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let mut prefs = MemoryPreferences::default();
        prefs.set(API_KEY_KEY, "   ").unwrap();
        assert!(load_api_key(&prefs).is_none());
    }
}
