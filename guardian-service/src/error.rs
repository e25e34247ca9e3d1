use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No API Key provided. Please enter your Gemini API Key in the top header.")]
    NoApiKey,

    #[error("Failed after {attempts} attempts. Errors: {errors}")]
    AttemptsExhausted { attempts: usize, errors: String },

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Inventory store error: {0}")]
    Inventory(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
