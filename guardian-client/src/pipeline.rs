//! Conversation pipeline: compose a chat request, show it optimistically, and present the reply.
//!
//! The work is split into three state transitions so that overlapping requests can be driven
//! and tested independently of any runtime:
//!
//! 1. [`Session::begin_send`] records the user turn, clears the input and pending image, and
//!    inserts a thinking placeholder.
//! 2. [`Session::complete_send`] removes that placeholder and classifies the reply.
//! 3. [`Session::finish_reveal`] runs after the reveal delay and updates every panel.
//!
//! [`Session::send_message`] chains the three for the common case.

use std::time::Duration;
use tracing::{info, warn};

use crate::error::GuardianError;
use crate::error::Result;
use crate::interpreter::{self, ResponseDirectives, discovery_cards};
use crate::models::{ChatMessage, ChatReply};
use crate::session::Session;
use crate::transport::{ChatBackend, ChatRequest};
use crate::view::{ActionPanel, DiscoveryPanel, GREETING_TEXT, LoadingId};

/// History label for a turn that carried only an image.
pub const IMAGE_ONLY_LABEL: &str = "[Image Shared]";

/// Pacing delay before an interpreted reply is revealed.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug)]
pub struct OutgoingMessage {
    pub request: ChatRequest,
    pub loading: LoadingId,
}

/// An interpreted reply waiting for its reveal.
#[derive(Debug)]
pub struct PendingReveal {
    pub loading: LoadingId,
    pub directives: ResponseDirectives,
}

impl Session {
    /// Returns `None` when there is neither text nor a pending image.
    pub fn begin_send(&mut self) -> Option<OutgoingMessage> {
        let text = self.input.trim().to_string();
        if text.is_empty() && !self.capture.has_pending() {
            return None;
        }

        let image = self.capture.take_for_send();
        let label = if text.is_empty() {
            IMAGE_ONLY_LABEL.to_string()
        } else {
            text.clone()
        };

        self.transcript.append_user(&label);

        let request = ChatRequest {
            message: text,
            language: self.language.clone(),
            api_key: self.api_key().unwrap_or_default().to_string(),
            profile: self.profile.clone(),
            image,
            history: self.history.clone(),
        };

        self.history.push(ChatMessage::user(label));
        self.input.clear();

        let loading = self.transcript.append_loading();
        self.refresh_profile_display();

        info!(
            has_image = request.image.is_some(),
            history_len = request.history.len(),
            "Message queued"
        );
        Some(OutgoingMessage { request, loading })
    }

    pub fn complete_send(
        &mut self,
        loading: LoadingId,
        result: Result<ChatReply>,
    ) -> Option<PendingReveal> {
        self.transcript.remove_loading(loading);

        match result {
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                self.transcript.append_assistant(&failure_text(&e));
                None
            }
            Ok(ChatReply::Error(message)) => {
                warn!(error = %message, "Server reported an error");
                self.transcript
                    .append_assistant(&format!("Error: {}", message));
                None
            }
            Ok(ChatReply::Greeting) => {
                self.transcript.append_assistant(GREETING_TEXT);
                None
            }
            Ok(ChatReply::Response(raw)) => {
                let directives = interpreter::interpret(&raw);
                self.history.push(ChatMessage::model(raw));
                let loading = self.transcript.append_loading();
                Some(PendingReveal {
                    loading,
                    directives,
                })
            }
        }
    }

    pub fn finish_reveal(&mut self, reveal: PendingReveal) {
        let PendingReveal {
            loading,
            directives,
        } = reveal;
        self.transcript.remove_loading(loading);
        self.transcript.append_assistant(&directives.cleaned_text);

        self.sync_visualization(directives.spot_id);
        self.actions = ActionPanel::from_steps(&directives.steps);
        self.discovery = DiscoveryPanel::from_cards(discovery_cards(&directives.search_terms));

        self.speak_text(&directives.cleaned_text);
    }

    /// Send the current input. Returns false when there was nothing to send.
    pub async fn send_message(&mut self, backend: &dyn ChatBackend, reveal_delay: Duration) -> bool {
        let Some(OutgoingMessage { request, loading }) = self.begin_send() else {
            return false;
        };
        let result = backend.send_chat(request).await;
        if let Some(reveal) = self.complete_send(loading, result) {
            tokio::time::sleep(reveal_delay).await;
            self.finish_reveal(reveal);
        }
        true
    }
}

fn failure_text(error: &GuardianError) -> String {
    match error {
        GuardianError::Network(reason) => format!("Network Error: {}", reason),
        GuardianError::Server(reason) => format!("Error: {}", reason),
        other => format!("Network Error: {}", other),
    }
}
