//! Generative model seam and the Gemini `generateContent` REST client.

use anyhow::anyhow;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

/// Image bytes sent inline with a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate text for `parts` using `api_key`. Errors carry a human-readable reason.
    async fn generate(&self, api_key: &str, parts: &[Part]) -> anyhow::Result<String>;
}

pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_base: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, api_key: &str, parts: &[Part]) -> anyhow::Result<String> {
        let payload = request_body(parts);
        debug!(model = %self.model, parts = parts.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let reason = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            return Err(anyhow!("Gemini request failed ({}): {}", status, reason));
        }

        let text = response_text(&body)?;
        info!(model = %self.model, characters = text.len(), "Gemini response received");
        Ok(text)
    }
}

fn request_body(parts: &[Part]) -> Value {
    let parts: Vec<Value> = parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::Image(image) => json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": STANDARD.encode(&image.data),
                }
            }),
        })
        .collect();

    json!({
        "contents": [
            {
                "role": "user",
                "parts": parts
            }
        ]
    })
}

/// Concatenated text of the first candidate.
fn response_text(body: &Value) -> anyhow::Result<String> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(anyhow!("Prompt blocked: {}", reason));
    }

    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| anyhow!("Gemini response has no candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.is_empty() {
        return Err(anyhow!("Gemini response contained no text"));
    }
    Ok(text)
}
