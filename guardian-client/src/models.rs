//! Data models shared by the session engine and the wire layer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{GuardianError, Result};

/// Value sent for any patient field the user left unset.
pub const UNKNOWN_FIELD: &str = "N/A";

/// Reply value the backend uses to signal a plain greeting.
pub const GREETING_SENTINEL: &str = "hello";

/// Author of a history entry. The assistant is called `model` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single entry of the conversation history, exactly as sent or received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        };
        f.write_str(label)
    }
}

/// Patient details entered in the side form. Read at send time, never validated beyond the
/// presence check that unlocks the body visualization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
    pub duration: Option<String>,
}

impl PatientProfile {
    pub fn age_field(&self) -> String {
        self.age
            .map(|a| a.to_string())
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
    }

    pub fn gender_field(&self) -> String {
        self.gender
            .map(|g| g.to_string())
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
    }

    /// Multipart field names paired with their values, unset fields replaced by `N/A`.
    pub fn form_fields(&self) -> [(&'static str, String); 4] {
        [
            ("age", self.age_field()),
            ("gender", self.gender_field()),
            ("location", text_or_unknown(self.location.as_deref())),
            ("duration", text_or_unknown(self.duration.as_deref())),
        ]
    }

    pub fn is_complete_for_unlock(&self) -> bool {
        self.age.is_some() && self.gender.is_some()
    }
}

fn text_or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN_FIELD.to_string(),
    }
}

/// Inventory document as stored by the backend. Replaced wholesale on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryList {
    #[serde(default)]
    pub medicines: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
}

/// Classified body of a `/api/chat` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Response(String),
    Error(String),
    Greeting,
}

impl ChatReply {
    /// Classify a raw response body. An `error` field wins over everything else; the greeting
    /// sentinel may arrive either as a bare JSON string or as the `response` value.
    pub fn from_body(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) if s == GREETING_SENTINEL => Ok(ChatReply::Greeting),
            Value::Object(map) => {
                if let Some(err) = map.get("error").filter(|e| !e.is_null()) {
                    let message = match err {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    return Ok(ChatReply::Error(message));
                }
                match map.get("response") {
                    Some(Value::String(s)) if s == GREETING_SENTINEL => Ok(ChatReply::Greeting),
                    Some(Value::String(s)) => Ok(ChatReply::Response(s.clone())),
                    _ => Err(GuardianError::Decode(
                        "chat reply has neither `response` nor `error`".to_string(),
                    )),
                }
            }
            other => Err(GuardianError::Decode(format!(
                "unexpected chat reply: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_serializes_with_wire_roles() {
        let history = vec![ChatMessage::user("burn on hand"), ChatMessage::model("Cool it.")];
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(
            json,
            r#"[{"role":"user","text":"burn on hand"},{"role":"model","text":"Cool it."}]"#
        );
    }

    #[test]
    fn test_unset_profile_fields_use_sentinel() {
        let profile = PatientProfile {
            age: Some(12),
            gender: None,
            location: Some("  ".to_string()),
            duration: Some("10 min".to_string()),
        };
        let fields = profile.form_fields();
        assert_eq!(fields[0], ("age", "12".to_string()));
        assert_eq!(fields[1], ("gender", "N/A".to_string()));
        assert_eq!(fields[2], ("location", "N/A".to_string()));
        assert_eq!(fields[3], ("duration", "10 min".to_string()));
        assert!(!profile.is_complete_for_unlock());
    }

    #[test]
    fn test_chat_reply_classification() {
        assert_eq!(
            ChatReply::from_body(r#"{"error": "quota"}"#).unwrap(),
            ChatReply::Error("quota".to_string())
        );
        assert_eq!(
            ChatReply::from_body(r#"{"response": "hello"}"#).unwrap(),
            ChatReply::Greeting
        );
        assert_eq!(ChatReply::from_body(r#""hello""#).unwrap(), ChatReply::Greeting);
        assert_eq!(
            ChatReply::from_body(r#"{"response": "Apply pressure", "context_used": true}"#)
                .unwrap(),
            ChatReply::Response("Apply pressure".to_string())
        );
        assert!(ChatReply::from_body(r#"{"status": "ok"}"#).is_err());
    }

    #[test]
    fn test_inventory_tolerates_missing_lists() {
        let list: InventoryList = serde_json::from_str("{}").unwrap();
        assert!(list.medicines.is_empty());
        let json = serde_json::to_string(&InventoryList {
            medicines: vec!["gauze".to_string()],
            equipment: vec![],
        })
        .unwrap();
        assert_eq!(json, r#"{"medicines":["gauze"],"equipment":[]}"#);
    }

    #[test]
    fn test_inventory_document_shape_survives_round_trip() {
        let stored = r#"{"medicines":[],"equipment":[]}"#;
        let mut list: InventoryList = serde_json::from_str(stored).unwrap();
        list.medicines.push("Gauze".to_string());
        let written = serde_json::to_value(&list).unwrap();
        assert_eq!(
            written,
            serde_json::json!({ "medicines": ["Gauze"], "equipment": [] })
        );
    }
}
