pub mod advice;
pub mod config;
pub mod error;
pub mod inventory_store;
pub mod keys;
pub mod knowledge;
pub mod model;
pub mod service;
pub mod tasks;

pub use advice::{AdviceRequest, AdviceResponse, AdviceService, PatientDetails};
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use inventory_store::InventoryStore;
pub use keys::KeyManager;
pub use knowledge::{KnowledgeBase, Protocol};
pub use model::{GeminiClient, GenerativeModel, InlineImage, Part};
pub use service::{AppState, build_router, create_app};
