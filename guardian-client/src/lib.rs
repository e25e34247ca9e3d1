pub mod body_map;
pub mod capture;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod inventory;
pub mod models;
pub mod pipeline;
pub mod prefs;
pub mod session;
pub mod transport;
pub mod view;
pub mod voice;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{GuardianError, Result};
pub use interpreter::{ResponseDirectives, interpret};
pub use inventory::{InventoryClient, InventoryView};
pub use models::{ChatMessage, ChatReply, Gender, InventoryList, PatientProfile, Role};
pub use pipeline::{DEFAULT_REVEAL_DELAY, OutgoingMessage, PendingReveal};
pub use session::Session;
pub use transport::{ChatBackend, ChatRequest, HttpBackend, InventoryBackend};
