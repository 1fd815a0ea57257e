use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{MODERATOR, RESPONDENT};

/// A speaker label prefix and the speaker it maps to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub speaker: String,
}

impl PrefixRule {
    fn new(prefix: &str, speaker: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            speaker: speaker.to_string(),
        }
    }
}

/// A topic category and the keywords that signal it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicLexicon {
    pub topic: String,
    pub keywords: Vec<String>,
}

/// Every keyword table the heuristics consult.
///
/// All matching against these tables is case-insensitive substring matching,
/// so short entries such as "like" also hit inside longer words ("unlike").
/// A JSON file may override any subset of tables; missing ones keep defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// First-cell tokens that open a new transcript section in a single sheet
    pub section_markers: Vec<String>,
    /// Label prefixes recognized at the start of a spreadsheet cell
    pub tabular_prefixes: Vec<PrefixRule>,
    /// Label prefixes recognized at the start of a text line
    pub text_prefixes: Vec<PrefixRule>,
    pub speaker_columns: Vec<String>,
    pub content_columns: Vec<String>,
    pub timestamp_columns: Vec<String>,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub uncertainty: Vec<String>,
    pub hesitation: Vec<String>,
    /// Filler markers used for hesitation flags and frequency
    pub hesitation_markers: Vec<String>,
    pub formal: Vec<String>,
    pub informal: Vec<String>,
    pub topics: Vec<TopicLexicon>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn topic(name: &str, keywords: &[&str]) -> TopicLexicon {
    TopicLexicon {
        topic: name.to_string(),
        keywords: words(keywords),
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            section_markers: words(&["transcript", "interview", "session", "participant", "user"]),
            tabular_prefixes: vec![
                PrefixRule::new("M:", MODERATOR),
                PrefixRule::new("R:", RESPONDENT),
            ],
            text_prefixes: vec![
                PrefixRule::new("Moderator:", MODERATOR),
                PrefixRule::new("Interviewer:", MODERATOR),
                PrefixRule::new("Respondent:", RESPONDENT),
                PrefixRule::new("Participant:", RESPONDENT),
                PrefixRule::new("M:", MODERATOR),
                PrefixRule::new("Q:", MODERATOR),
                PrefixRule::new("R:", RESPONDENT),
                PrefixRule::new("A:", RESPONDENT),
            ],
            speaker_columns: words(&["speaker", "participant", "user", "person"]),
            content_columns: words(&["content", "text", "message", "response"]),
            timestamp_columns: words(&["timestamp", "time", "duration"]),
            positive: words(&[
                "love", "great", "awesome", "amazing", "excellent", "wonderful", "fantastic",
                "happy", "excited",
            ]),
            negative: words(&[
                "hate", "terrible", "awful", "horrible", "frustrated", "angry", "annoyed",
                "disappointed", "confused",
            ]),
            uncertainty: words(&[
                "maybe", "perhaps", "might", "could", "not sure", "think so", "probably",
                "possibly",
            ]),
            hesitation: words(&[
                "um", "uh", "like", "you know", "well", "so", "actually", "basically",
            ]),
            hesitation_markers: words(&["um", "uh", "like"]),
            formal: words(&[
                "therefore",
                "however",
                "furthermore",
                "consequently",
                "nevertheless",
            ]),
            informal: words(&["gonna", "wanna", "gotta", "kinda", "sorta", "yeah", "okay"]),
            topics: vec![
                topic(
                    "technology",
                    &["app", "software", "website", "digital", "online", "computer", "phone", "device"],
                ),
                topic(
                    "work",
                    &["job", "work", "career", "office", "company", "business", "professional"],
                ),
                topic(
                    "personal",
                    &["family", "home", "personal", "life", "myself", "feel", "think"],
                ),
                topic(
                    "problems",
                    &["problem", "issue", "difficult", "hard", "struggle", "confused", "don't understand"],
                ),
                topic(
                    "preferences",
                    &["like", "prefer", "love", "hate", "enjoy", "dislike", "favorite"],
                ),
            ],
        }
    }
}

impl Lexicon {
    /// Load overrides from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file: {:?}", path))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse lexicon JSON")
    }

    /// Whether a cell's lower-cased text contains any section marker
    pub fn is_section_marker(&self, cell: &str) -> bool {
        contains_any(&cell.to_lowercase(), &self.section_markers)
    }
}

/// Case-sensitive substring test against a keyword list; callers lower-case first
pub fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

/// Number of distinct keywords present in the haystack
pub fn count_present(haystack: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|k| haystack.contains(k.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let lexicon = Lexicon::from_json(r#"{"section_markers": ["episode"]}"#).unwrap();
        assert_eq!(lexicon.section_markers, vec!["episode"]);
        assert_eq!(lexicon.formal, Lexicon::default().formal);
        assert_eq!(lexicon.topics.len(), 5);
    }

    #[test]
    fn test_section_marker_is_case_insensitive() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_section_marker("INTERVIEW 2"));
        assert!(lexicon.is_section_marker("User research notes"));
        assert!(!lexicon.is_section_marker("M: hello"));
    }

    #[test]
    fn test_count_present_counts_each_keyword_once() {
        let keywords = words(&["job", "work"]);
        assert_eq!(count_present("work work work and a job", &keywords), 2);
        assert_eq!(count_present("nothing here", &keywords), 0);
    }
}
