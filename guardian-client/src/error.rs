use thiserror::Error;

/// Errors surfaced by the session engine.
///
/// Every variant is handled at the point of failure (an error bubble, an alert, or a hidden
/// control); nothing here is meant to tear down the session.
#[derive(Error, Debug)]
pub enum GuardianError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Please provide Age and Gender to unlock the visualization.")]
    MissingPatientFields,

    #[error("Inventory index {index} out of range (list has {len} items)")]
    InventoryIndex { index: usize, len: usize },

    #[error("Could not access camera: {0}")]
    Camera(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GuardianError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GuardianError::Decode(err.to_string())
        } else {
            GuardianError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GuardianError {
    fn from(err: serde_json::Error) -> Self {
        GuardianError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GuardianError>;
