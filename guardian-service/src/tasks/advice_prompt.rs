//! Prompt assembly for the first-aid advice call.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::advice::PatientDetails;
use crate::knowledge::Protocol;

/// Turns of prior conversation included in the prompt.
pub const HISTORY_WINDOW: usize = 6;

const SPOT_MAP: &str = "1: Head, 3: Face, 5: Neck, 8: Chest, 11: Abdomen, 13-18: Arms, 19-20: Hands, 21-28: Legs, 29-30: Feet";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    #[serde(default)]
    pub text: String,
}

impl HistoryTurn {
    fn speaker(&self) -> &'static str {
        if self.role == "user" {
            "Patient"
        } else {
            "Dr. Guardian"
        }
    }
}

/// Parse the `history` form field. Anything that is not a list of turns counts as no history.
pub fn parse_history(raw: &str) -> Vec<HistoryTurn> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unparseable conversation history");
        Vec::new()
    })
}

pub struct PromptContext<'a> {
    pub history: &'a [HistoryTurn],
    pub medicines: &'a Value,
    pub matches: &'a [&'a Protocol],
    pub patient: &'a PatientDetails,
    pub language: &'a str,
}

pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let history = history_section(ctx.history);
    let medicines = pretty(ctx.medicines);
    let context = pretty(&serde_json::to_value(ctx.matches).unwrap_or(Value::Null));
    let patient = ctx.patient;

    format!(
        "PERSONA: You are Dr. Guardian, a senior school nurse and emergency first-aid expert.
Your tone is professional, expert, and ultra-concise.
{history}
AVAILABLE INVENTORY (Medicines & Equipment):
{medicines}

CONTEXT DATA: {context}

PATIENT DETAILS:
- Age: {age}, Gender: {gender}, Location: {location}, Duration: {duration}

TASK:
1. Analyze visuals/query.
2. Use the provided CONTEXT DATA for steps.
3. CROSS-REFERENCE with AVAILABLE INVENTORY. Tell the user what to use from inventory.
4. If a critical item is missing but needed (e.g. bandage, antiseptic), WARN specifically.
5. Be direct. No filler phrases.
6. REFER TO PREVIOUS STEPS (History) if relevant. Avoid repeating instructions already given.

SPOT MAP: {spot_map}

FORMAT (MUST BE LAST LINES):
[SPOT_ID: <number>]
[PROCEDURE: <step_1>, <step_2>, ...]
[SEARCH: <missing_item_1>, <item_to_use_from_inventory>, ...]

LANGUAGE: You must strictly respond in {language}.
",
        age = patient.age,
        gender = patient.gender,
        location = patient.location,
        duration = patient.duration,
        spot_map = SPOT_MAP,
        language = ctx.language,
    )
}

fn history_section(history: &[HistoryTurn]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut section = String::from("\nCONVERSATION HISTORY:\n");
    for turn in &history[start..] {
        section.push_str(&format!("{}: {}\n", turn.speaker(), turn.text));
    }
    section
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn turn(role: &str, text: &str) -> HistoryTurn {
        HistoryTurn {
            role: role.to_string(),
            text: text.to_string(),
        }
    }

    fn patient() -> PatientDetails {
        PatientDetails {
            age: "12".to_string(),
            gender: "Male".to_string(),
            location: "Playground".to_string(),
            duration: "N/A".to_string(),
        }
    }

    #[test]
    fn test_history_parsing_tolerates_garbage() {
        assert_eq!(
            parse_history(r#"[{"role":"user","text":"hi"}]"#),
            vec![turn("user", "hi")]
        );
        assert!(parse_history("not json").is_empty());
        assert!(parse_history(r#"{"role":"user"}"#).is_empty());
    }

    #[test]
    fn test_only_the_last_six_turns_are_labelled() {
        let history: Vec<HistoryTurn> = (0..8)
            .map(|i| {
                let role = if i % 2 == 0 { "user" } else { "model" };
                turn(role, &format!("turn {}", i))
            })
            .collect();
        let medicines = json!([]);
        let patient = patient();
        let prompt = build_prompt(&PromptContext {
            history: &history,
            medicines: &medicines,
            matches: &[],
            patient: &patient,
            language: "Hindi",
        });

        assert!(!prompt.contains("turn 1"));
        assert!(prompt.contains("Patient: turn 2"));
        assert!(prompt.contains("Dr. Guardian: turn 7"));
        assert!(prompt.contains("LANGUAGE: You must strictly respond in Hindi."));
    }

    #[test]
    fn test_prompt_carries_inventory_context_and_patient() {
        let medicines = json!(["Paracetamol"]);
        let protocol = Protocol {
            title: "Burns".to_string(),
            keywords: vec!["hot".to_string()],
            details: serde_json::Map::new(),
        };
        let matches = [&protocol];
        let patient = patient();
        let prompt = build_prompt(&PromptContext {
            history: &[],
            medicines: &medicines,
            matches: &matches,
            patient: &patient,
            language: "English",
        });

        assert!(prompt.starts_with("PERSONA: You are Dr. Guardian"));
        assert!(!prompt.contains("CONVERSATION HISTORY"));
        assert!(prompt.contains("\"Paracetamol\""));
        assert!(prompt.contains("\"title\": \"Burns\""));
        assert!(prompt.contains("- Age: 12, Gender: Male, Location: Playground"));
        assert!(prompt.contains("[SPOT_ID: <number>]"));
        assert!(prompt.contains(SPOT_MAP));
    }
}
