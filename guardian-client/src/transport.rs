//! Wire layer: the backend seams and their reqwest implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, error, info};

use crate::capture::CapturedImage;
use crate::error::{GuardianError, Result};
use crate::models::{ChatMessage, ChatReply, InventoryList, PatientProfile};

/// Everything one `/api/chat` call carries.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub language: String,
    pub api_key: String,
    pub profile: PatientProfile,
    pub image: Option<CapturedImage>,
    /// History as it stood before this message.
    pub history: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Text fields in the order they are appended to the form.
    pub fn text_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let mut fields = vec![
            ("message", self.message.clone()),
            ("language", self.language.clone()),
            ("api_key", self.api_key.clone()),
        ];
        fields.extend(self.profile.form_fields());
        fields.push(("history", serde_json::to_string(&self.history)?));
        Ok(fields)
    }

    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.text_fields()? {
            form = form.text(name, value);
        }
        if let Some(image) = self.image {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.mime_type)
                .map_err(|e| GuardianError::Capture(format!("Failed to create multipart: {}", e)))?;
            form = form.part("image", part);
        }
        Ok(form)
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply>;
}

#[async_trait]
pub trait InventoryBackend: Send + Sync {
    async fn fetch_inventory(&self) -> Result<InventoryList>;
    async fn store_inventory(&self, list: &InventoryList) -> Result<()>;
}

/// Talks to a running guardian service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let has_image = request.image.is_some();
        let history_len = request.history.len();
        let form = request.into_form()?;

        info!(has_image, history_len, "Sending chat request");
        let response = self
            .client
            .post(self.url("/api/chat"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, bytes = body.len(), "Chat response received");

        match ChatReply::from_body(&body) {
            Ok(reply) => Ok(reply),
            Err(e) if !status.is_success() => {
                error!(status = %status, "Chat request failed without an error body");
                Err(GuardianError::Server(format!("{} ({})", status, e)))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl InventoryBackend for HttpBackend {
    async fn fetch_inventory(&self) -> Result<InventoryList> {
        let response = self.client.get(self.url("/api/inventory")).send().await?;
        if !response.status().is_success() {
            return Err(GuardianError::Server(format!(
                "Inventory request failed with status: {}",
                response.status()
            )));
        }
        Ok(response.json::<InventoryList>().await?)
    }

    async fn store_inventory(&self, list: &InventoryList) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/inventory"))
            .json(list)
            .send()
            .await?;
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GuardianError::Server(format!(
                "Inventory update failed: {}",
                body
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    #[test]
    fn test_text_fields_follow_wire_contract() {
        let request = ChatRequest {
            message: "burn".to_string(),
            language: "Hindi".to_string(),
            api_key: String::new(),
            profile: PatientProfile {
                age: Some(9),
                gender: Some(Gender::Female),
                location: None,
                duration: None,
            },
            image: None,
            history: vec![ChatMessage::user("hi"), ChatMessage::model("Hello")],
        };
        let fields = request.text_fields().unwrap();
        let names: Vec<_> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["message", "language", "api_key", "age", "gender", "location", "duration", "history"]
        );
        assert_eq!(fields[4].1, "Female");
        assert_eq!(fields[5].1, "N/A");
        let history: Vec<ChatMessage> = serde_json::from_str(&fields[7].1).unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:5000/");
        assert_eq!(backend.url("/api/chat"), "http://localhost:5000/api/chat");
    }
}
