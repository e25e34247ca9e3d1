//! Service configuration, read from the environment (a `.env` file is loaded first by `main`).

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, ServiceError};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_INVENTORY_PATH: &str = "first_aid_ai/inventory.json";
pub const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "knowledge_base.json";
pub const DEFAULT_STATIC_DIR: &str = "first_aid_ai/static";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub inventory_path: PathBuf,
    pub knowledge_base_path: PathBuf,
    pub static_dir: PathBuf,
    pub gemini_model: String,
    pub gemini_api_base: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            inventory_path: PathBuf::from(DEFAULT_INVENTORY_PATH),
            knowledge_base_path: PathBuf::from(DEFAULT_KNOWLEDGE_BASE_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build the configuration from an explicit variable set; unset variables keep their defaults.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let mut config = Self::default();

        if let Some(host) = vars.get("HOST") {
            config.host = host.clone();
        }
        if let Some(port) = vars.get("PORT") {
            config.port = port
                .parse()
                .map_err(|e| ServiceError::Config(format!("invalid PORT '{}': {}", port, e)))?;
        }
        if let Some(path) = vars.get("INVENTORY_PATH") {
            config.inventory_path = PathBuf::from(path);
        }
        if let Some(path) = vars.get("KNOWLEDGE_BASE_PATH") {
            config.knowledge_base_path = PathBuf::from(path);
        }
        if let Some(dir) = vars.get("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(model) = vars.get("GEMINI_MODEL") {
            config.gemini_model = model.clone();
        }
        if let Some(base) = vars.get("GEMINI_API_BASE") {
            config.gemini_api_base = base.trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_apply_when_nothing_is_set() {
        let config = ServiceConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.gemini_model, "gemini-flash-latest");
    }

    #[test]
    fn test_overrides_are_read() {
        let config = ServiceConfig::from_vars(vars(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("INVENTORY_PATH", "/tmp/inv.json"),
            ("GEMINI_API_BASE", "http://localhost:9999/"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.inventory_path, PathBuf::from("/tmp/inv.json"));
        assert_eq!(config.gemini_api_base, "http://localhost:9999");
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let err = ServiceConfig::from_vars(vars(&[("PORT", "fifty")])).unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }
}
