use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::DEFAULT_REVEAL_DELAY;
use crate::voice::DEFAULT_LANGUAGE;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Client settings, usually filled from CLI flags with environment fallbacks.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Preference file; `None` selects the platform config directory.
    pub prefs_path: Option<PathBuf>,
    pub reveal_delay: Duration,
    pub language: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            prefs_path: None,
            reveal_delay: DEFAULT_REVEAL_DELAY,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}
