//! Extraction of directive tags from free-text assistant replies.
//!
//! Replies end with bracketed markers such as `[SPOT_ID: 7]`, `[PROCEDURE: a, b]` and
//! `[SEARCH: x, y]`. Only the first occurrence of each tag feeds the result, but every
//! occurrence is stripped from the text shown to the user.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static SPOT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[SPOT_ID:\s*(\d+)\]").expect("Invalid regex"));
static PROCEDURE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[PROCEDURE:\s*(.*?)\]").expect("Invalid regex"));
static SEARCH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[SEARCH:\s*(.*?)\]").expect("Invalid regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(?:SPOT_ID|PROCEDURE|SEARCH):.*?\]").expect("Invalid regex")
});

pub const NO_DISCOVERY_ITEMS: &str = "No items identified yet.";

/// Structured view of one assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseDirectives {
    pub cleaned_text: String,
    pub spot_id: Option<u32>,
    pub steps: Vec<String>,
    pub search_terms: Vec<String>,
}

impl ResponseDirectives {
    pub fn has_procedure(&self) -> bool {
        !self.steps.is_empty()
    }
}

pub fn interpret(reply: &str) -> ResponseDirectives {
    let spot_id = SPOT_TAG
        .captures(reply)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    let steps = first_payload(&PROCEDURE_TAG, reply)
        .map(split_list)
        .unwrap_or_default();

    let search_terms = first_payload(&SEARCH_TAG, reply)
        .map(split_list)
        .unwrap_or_default();

    let cleaned_text = ANY_TAG.replace_all(reply, "").trim().to_string();

    ResponseDirectives {
        cleaned_text,
        spot_id,
        steps,
        search_terms,
    }
}

fn first_payload<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn split_list(payload: &str) -> Vec<String> {
    payload
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A clickable card for an item the assistant suggested looking up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryCard {
    pub label: String,
    pub icon: &'static str,
    pub search_url: String,
}

pub fn discovery_cards(search_terms: &[String]) -> Vec<DiscoveryCard> {
    search_terms
        .iter()
        .map(|name| DiscoveryCard {
            label: name.clone(),
            icon: icon_for(name),
            search_url: format!(
                "https://www.google.com/search?q={}+medical+equipment+medicine&tbm=isch",
                urlencoding::encode(name)
            ),
        })
        .collect()
}

fn icon_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.contains("thermometer") {
        "🌡️"
    } else if lower.contains("bandage") || lower.contains("tape") {
        "🩹"
    } else if lower.contains("tablet") || lower.contains("pill") {
        "💊"
    } else {
        "📦"
    }
}
