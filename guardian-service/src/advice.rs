//! Chat orchestration: retrieval, optional vision pass, prompt, and key failover.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Result, ServiceError};
use crate::inventory_store::InventoryStore;
use crate::keys::KeyManager;
use crate::knowledge::KnowledgeBase;
use crate::model::{GenerativeModel, InlineImage, Part};
use crate::tasks::{PromptContext, build_prompt, extract_visual_keywords, parse_history};

pub const DEFAULT_LANGUAGE: &str = "English";
pub const UNKNOWN_FIELD: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDetails {
    pub age: String,
    pub gender: String,
    pub location: String,
    pub duration: String,
}

impl Default for PatientDetails {
    fn default() -> Self {
        Self {
            age: UNKNOWN_FIELD.to_string(),
            gender: UNKNOWN_FIELD.to_string(),
            location: UNKNOWN_FIELD.to_string(),
            duration: UNKNOWN_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub message: String,
    pub language: String,
    pub api_key: Option<String>,
    pub patient: PatientDetails,
    /// Raw JSON list of prior turns, as sent by the client.
    pub history: String,
    pub image: Option<InlineImage>,
}

impl Default for AdviceRequest {
    fn default() -> Self {
        Self {
            message: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            api_key: None,
            patient: PatientDetails::default(),
            history: "[]".to_string(),
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceResponse {
    pub response: String,
    pub context_used: bool,
}

pub struct AdviceService {
    model: Arc<dyn GenerativeModel>,
    keys: Arc<KeyManager>,
    knowledge: Arc<KnowledgeBase>,
    inventory: Arc<InventoryStore>,
}

impl AdviceService {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        keys: Arc<KeyManager>,
        knowledge: Arc<KnowledgeBase>,
        inventory: Arc<InventoryStore>,
    ) -> Self {
        Self {
            model,
            keys,
            knowledge,
            inventory,
        }
    }

    pub async fn advise(&self, request: AdviceRequest) -> Result<AdviceResponse> {
        let history = parse_history(&request.history);
        let candidates = self.keys.candidates(request.api_key.as_deref());
        if candidates.is_empty() {
            warn!("Chat request without any usable API key");
            return Err(ServiceError::NoApiKey);
        }

        let matches = self.knowledge.relevant(&request.message);
        info!(
            candidates = candidates.len(),
            matches = matches.len(),
            history_turns = history.len(),
            has_image = request.image.is_some(),
            "Generating advice"
        );

        let mut errors = Vec::new();
        for (attempt, key) in candidates.iter().enumerate() {
            let medicines = self.inventory.medicines().await;

            let mut query = request.message.clone();
            if let Some(image) = &request.image {
                match extract_visual_keywords(self.model.as_ref(), key, image).await {
                    Ok(keywords) => query.push_str(&format!(" (Visuals: {})", keywords)),
                    Err(e) => debug!(error = %e, "Vision keyword pass failed; continuing without it"),
                }
            }

            let prompt = build_prompt(&PromptContext {
                history: &history,
                medicines: &medicines,
                matches: &matches,
                patient: &request.patient,
                language: &request.language,
            });

            let mut parts = vec![Part::Text(prompt), Part::Text(format!("User Query: {}", query))];
            if let Some(image) = &request.image {
                parts.push(Part::Image(image.clone()));
            }

            match self.model.generate(key, &parts).await {
                Ok(text) => {
                    info!(attempt = attempt + 1, "Advice generated");
                    return Ok(AdviceResponse {
                        response: text,
                        context_used: !matches.is_empty(),
                    });
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "Model call failed; trying next key");
                    errors.push(e.to_string());
                }
            }
        }

        Err(ServiceError::AttemptsExhausted {
            attempts: candidates.len(),
            errors: errors.join(", "),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Model fake: fails for listed keys, optionally fails the vision pass, records every call.
    #[derive(Default)]
    pub struct FakeModel {
        pub reply: String,
        pub failing_keys: Vec<String>,
        pub vision_keywords: Option<String>,
        pub calls: Mutex<Vec<(String, Vec<Part>)>>,
    }

    impl FakeModel {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for FakeModel {
        async fn generate(&self, api_key: &str, parts: &[Part]) -> anyhow::Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((api_key.to_string(), parts.to_vec()));

            if self.failing_keys.iter().any(|k| k == api_key) {
                return Err(anyhow!("API key {} rejected", api_key));
            }
            let is_vision_pass = matches!(parts.first(), Some(Part::Text(t)) if t.starts_with("Analyze this medical situation"));
            if is_vision_pass {
                return self
                    .vision_keywords
                    .clone()
                    .ok_or_else(|| anyhow!("vision unavailable"));
            }
            Ok(self.reply.clone())
        }
    }
}
