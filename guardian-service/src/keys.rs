//! Gemini API key pool with round-robin rotation.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Keys tried after the caller's own key, per request.
pub const MAX_ROTATED_KEYS: usize = 3;

const KEY_PREFIX: &str = "AIza";

#[derive(Debug, Default)]
pub struct KeyManager {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyManager {
    /// Collect keys from the process environment, ordered by variable name.
    pub fn from_env() -> Self {
        let mut vars: Vec<(String, String)> = std::env::vars().collect();
        vars.sort();
        Self::from_vars(vars)
    }

    /// Accept a value when its variable name mentions `gemini` or `api_key` (any case) and the
    /// value looks like a Gemini key.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let keys: Vec<String> = vars
            .into_iter()
            .filter(|(name, value)| {
                let name = name.to_lowercase();
                (name.contains("gemini") || name.contains("api_key")) && value.starts_with(KEY_PREFIX)
            })
            .map(|(_, value)| value)
            .collect();

        if keys.is_empty() {
            warn!("No Gemini API keys found in the environment; requests must supply their own key");
        } else {
            info!(key_count = keys.len(), "Loaded Gemini API keys");
        }

        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn with_keys(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn next_key(&self) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Some(self.keys[index].clone())
    }

    /// Keys to try for one request: the manual key first, then up to three pool keys.
    pub fn candidates(&self, manual_key: Option<&str>) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Some(key) = manual_key.map(str::trim).filter(|k| !k.is_empty()) {
            candidates.push(key.to_string());
        }
        for _ in 0..self.keys.len().min(MAX_ROTATED_KEYS) {
            if let Some(key) = self.next_key() {
                candidates.push(key);
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_only_gemini_looking_keys_are_collected() {
        let manager = KeyManager::from_vars(vec![
            var("GEMINI_KEY_1", "AIzaOne"),
            var("my_api_key", "AIzaTwo"),
            var("OPENAI_API_KEY", "sk-nope"),
            var("PATH", "AIzaNotAKeyName"),
            var("Gemini_Backup", ""),
        ]);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.next_key().as_deref(), Some("AIzaOne"));
        assert_eq!(manager.next_key().as_deref(), Some("AIzaTwo"));
    }

    #[test]
    fn test_rotation_wraps_around() {
        let manager = KeyManager::with_keys(vec!["a".into(), "b".into()]);
        let seen: Vec<String> = (0..5).filter_map(|_| manager.next_key()).collect();
        assert_eq!(seen, vec!["a", "b", "a", "b", "a"]);
    }

    #[test]
    fn test_candidates_put_manual_key_first_and_cap_rotation() {
        let manager = KeyManager::with_keys(vec![
            "k1".into(),
            "k2".into(),
            "k3".into(),
            "k4".into(),
        ]);
        let first = manager.candidates(Some(" manual "));
        assert_eq!(first, vec!["manual", "k1", "k2", "k3"]);

        let second = manager.candidates(None);
        assert_eq!(second, vec!["k4", "k1", "k2"]);
    }

    #[test]
    fn test_no_keys_anywhere_means_no_candidates() {
        let manager = KeyManager::default();
        assert!(manager.candidates(None).is_empty());
        assert!(manager.candidates(Some("   ")).is_empty());
        assert_eq!(manager.candidates(Some("mine")), vec!["mine"]);
    }
}
