//! First-aid protocol knowledge base and keyword retrieval.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{error, info, warn};

/// Protocols returned per query.
pub const MAX_MATCHES: usize = 3;

const TITLE_SCORE: usize = 5;
const KEYWORD_SCORE: usize = 1;

/// One protocol. Fields beyond title and keywords (steps, red_flags, grade_level, ...) are kept
/// as-is so they reach the prompt unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub protocols: Vec<Protocol>,
}

impl KnowledgeBase {
    /// Load from disk. A missing or malformed file yields an empty base.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Knowledge base not readable; continuing without it");
                return Self::default();
            }
        };
        match serde_json::from_str::<KnowledgeBase>(&content) {
            Ok(base) => {
                info!(path = %path.display(), protocols = base.protocols.len(), "Knowledge base loaded");
                base
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Knowledge base is not valid JSON");
                Self::default()
            }
        }
    }

    pub fn from_protocols(protocols: Vec<Protocol>) -> Self {
        Self { protocols }
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Best matches for `query`, highest score first, ties in file order.
    pub fn relevant(&self, query: &str) -> Vec<&Protocol> {
        let query = query.to_lowercase();
        let mut scored: Vec<(usize, &Protocol)> = self
            .protocols
            .iter()
            .map(|protocol| (score(protocol, &query), protocol))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(MAX_MATCHES)
            .map(|(_, protocol)| protocol)
            .collect()
    }
}

fn score(protocol: &Protocol, query: &str) -> usize {
    let title = protocol.title.trim().to_lowercase();
    let mut score = 0;
    if !title.is_empty() && query.contains(&title) {
        score += TITLE_SCORE;
    }
    score += protocol
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && query.contains(k.as_str()))
        .count()
        * KEYWORD_SCORE;
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn protocol(title: &str, keywords: &[&str]) -> Protocol {
        Protocol {
            title: title.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            details: Map::new(),
        }
    }

    fn titles<'a>(matches: &[&'a Protocol]) -> Vec<&'a str> {
        matches.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_title_match_outranks_keywords() {
        let base = KnowledgeBase::from_protocols(vec![
            protocol("Cuts", &["bleeding", "knife"]),
            protocol("Burns", &["hot"]),
        ]);
        let matches = base.relevant("Burns from a hot knife, some bleeding");
        assert_eq!(titles(&matches), vec!["Burns", "Cuts"]);
    }

    #[test]
    fn test_at_most_three_matches_and_no_zero_scores() {
        let base = KnowledgeBase::from_protocols(vec![
            protocol("Cramp", &["pain"]),
            protocol("Strain", &["pain", "swelling"]),
            protocol("Graze", &["pain"]),
            protocol("Bruise", &["pain"]),
            protocol("Fever", &["temperature"]),
        ]);
        let matches = base.relevant("PAIN and swelling");
        assert_eq!(titles(&matches), vec!["Strain", "Cramp", "Graze"]);
    }

    #[test]
    fn test_empty_keywords_and_titles_never_match() {
        let base = KnowledgeBase::from_protocols(vec![protocol("", &["", "  "])]);
        assert!(base.relevant("anything").is_empty());
    }

    #[test]
    fn test_extra_protocol_fields_survive_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"protocols": [{{"title": "Sprain", "keywords": ["ankle"], "steps": ["Rest", "Ice"], "grade_level": 2}}]}}"#
        )
        .unwrap();

        let base = KnowledgeBase::load(file.path());
        assert_eq!(base.len(), 1);
        let sprain = &base.protocols[0];
        assert_eq!(sprain.details["steps"], serde_json::json!(["Rest", "Ice"]));
        assert_eq!(sprain.details["grade_level"], serde_json::json!(2));
    }

    #[test]
    fn test_missing_or_broken_file_gives_empty_base() {
        let dir = tempfile::tempdir().unwrap();
        assert!(KnowledgeBase::load(&dir.path().join("absent.json")).is_empty());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(KnowledgeBase::load(&broken).is_empty());
    }
}
