//! Render model for the chat panel, action panel, discovery panel and body indicator.
//!
//! Nothing here knows about a concrete UI toolkit; front ends read these structures and draw
//! them however they like.

use chrono::{DateTime, Utc};
use pulldown_cmark::{Parser, html};
use serde::Serialize;
use uuid::Uuid;

use crate::body_map::{Spot, ZoomOffset};
use crate::interpreter::{DiscoveryCard, NO_DISCOVERY_ITEMS};

pub const THINKING_TEXT: &str = "Dr. Guardian is thinking...";
pub const WELCOME_TEXT: &str = "Hello! I am the First Aid Guardian. I can help with school emergencies. Describe the situation or **Upload/Take a Photo** of the injury.";
pub const NEW_CASE_TEXT: &str = "New case started. How can I help you?";
pub const GREETING_TEXT: &str = "Hello! How can I help you today?";
pub const NO_PROCEDURES: &str = "No specific procedures identified.";
pub const PROCEDURES_PLACEHOLDER: &str = "Procedural steps will appear here.";
pub const IDLE_LABEL: &str = "All Systems Normal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleKind {
    User,
    Assistant,
    Loading,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bubble {
    pub id: Uuid,
    pub kind: BubbleKind,
    pub text: String,
    /// Markdown rendered to HTML, assistant bubbles only.
    pub html: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Handle for a "thinking" placeholder; removing it twice is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LoadingId(Uuid);

#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
}

impl Transcript {
    pub fn seeded(greeting: &str) -> Self {
        let mut transcript = Self::default();
        transcript.append_assistant(greeting);
        transcript
    }

    pub fn reset(&mut self, greeting: &str) {
        self.bubbles.clear();
        self.append_assistant(greeting);
    }

    pub fn append_user(&mut self, text: &str) {
        self.push(BubbleKind::User, text, None);
    }

    pub fn append_assistant(&mut self, text: &str) {
        self.push(BubbleKind::Assistant, text, Some(render_markdown(text)));
    }

    pub fn append_loading(&mut self) -> LoadingId {
        LoadingId(self.push(BubbleKind::Loading, THINKING_TEXT, None))
    }

    /// Returns whether the placeholder was still present.
    pub fn remove_loading(&mut self, id: LoadingId) -> bool {
        let before = self.bubbles.len();
        self.bubbles
            .retain(|b| !(b.kind == BubbleKind::Loading && b.id == id.0));
        before != self.bubbles.len()
    }

    pub fn loading_count(&self) -> usize {
        self.bubbles
            .iter()
            .filter(|b| b.kind == BubbleKind::Loading)
            .count()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn last(&self) -> Option<&Bubble> {
        self.bubbles.last()
    }

    fn push(&mut self, kind: BubbleKind, text: &str, html: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.bubbles.push(Bubble {
            id,
            kind,
            text: text.to_string(),
            html,
            timestamp: Utc::now(),
        });
        id
    }
}

pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new(text);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Marker drawn over the body diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    pub visible: bool,
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub zoom: Option<ZoomOffset>,
    /// Bumped each time the zoom animation must restart from scratch.
    pub animation_epoch: u64,
}

impl Default for Indicator {
    fn default() -> Self {
        Self {
            visible: false,
            x: 0.0,
            y: 0.0,
            label: IDLE_LABEL.to_string(),
            zoom: None,
            animation_epoch: 0,
        }
    }
}

impl Indicator {
    pub fn show(&mut self, spot: &Spot) {
        self.x = spot.x;
        self.y = spot.y;
        self.visible = true;
        self.label = format!("Target: {}", spot.title);
        self.zoom = Some(spot.zoom_offset());
        self.animation_epoch += 1;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn reset(&mut self) {
        let epoch = self.animation_epoch;
        *self = Self::default();
        self.animation_epoch = epoch;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionPanel {
    Empty(&'static str),
    Steps(Vec<String>),
}

impl Default for ActionPanel {
    fn default() -> Self {
        ActionPanel::Empty(PROCEDURES_PLACEHOLDER)
    }
}

impl ActionPanel {
    pub fn from_steps(steps: &[String]) -> Self {
        if steps.is_empty() {
            ActionPanel::Empty(NO_PROCEDURES)
        } else {
            ActionPanel::Steps(steps.to_vec())
        }
    }

    /// Lines to draw; never empty.
    pub fn lines(&self) -> Vec<String> {
        match self {
            ActionPanel::Empty(message) => vec![message.to_string()],
            ActionPanel::Steps(steps) => steps.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum DiscoveryPanel {
    #[default]
    Empty,
    Cards(Vec<DiscoveryCard>),
}

impl DiscoveryPanel {
    pub fn from_cards(cards: Vec<DiscoveryCard>) -> Self {
        if cards.is_empty() {
            DiscoveryPanel::Empty
        } else {
            DiscoveryPanel::Cards(cards)
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            DiscoveryPanel::Empty => vec![NO_DISCOVERY_ITEMS.to_string()],
            DiscoveryPanel::Cards(cards) => cards
                .iter()
                .map(|c| format!("{} {} <{}>", c.icon, c.label, c.search_url))
                .collect(),
        }
    }
}
