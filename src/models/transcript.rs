use serde::{Deserialize, Serialize};

use super::{ConversationContext, SourceOrigin};

pub const MODERATOR: &str = "Moderator";
pub const RESPONDENT: &str = "Respondent";
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// One attributed utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerTurn {
    pub speaker: String,
    /// Never empty after trimming
    pub content: String,
    /// Sequence position, in pseudo-milliseconds unless a timestamp column supplied one
    pub timestamp: i64,
}

impl SpeakerTurn {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
            timestamp,
        }
    }

    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Layout convention detected in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptFormat {
    Standard,
    ModeratorRespondent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub filename: String,
    pub total_turns: usize,
    /// Rough pacing estimate, turns times a per-origin constant
    pub estimated_duration: usize,
    pub format: TranscriptFormat,
    /// Distinct speakers in first-appearance order
    pub speakers: Vec<String>,
    pub origin: SourceOrigin,
}

/// Canonical parsed transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub raw_text: String,
    pub speaker_turns: Vec<SpeakerTurn>,
    pub metadata: TranscriptMetadata,
    /// Respondent-only analysis, set by the respondent filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_context: Option<ConversationContext>,
}

impl TranscriptRecord {
    pub fn is_moderator_respondent(&self) -> bool {
        self.metadata.format == TranscriptFormat::ModeratorRespondent
    }

    /// Reassign the turn list, keeping the count and speaker set in sync
    pub fn set_turns(&mut self, turns: Vec<SpeakerTurn>) {
        self.metadata.total_turns = turns.len();
        self.metadata.speakers = distinct_speakers(&turns);
        self.speaker_turns = turns;
    }
}

/// De-duplicate speakers, keeping first-appearance order
pub fn distinct_speakers(turns: &[SpeakerTurn]) -> Vec<String> {
    let mut speakers: Vec<String> = Vec::new();
    for turn in turns {
        if !speakers.contains(&turn.speaker) {
            speakers.push(turn.speaker.clone());
        }
    }
    speakers
}

/// Render turns as `speaker: content` lines
pub fn render_speaker_lines(turns: &[SpeakerTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.speaker, t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_speakers_keeps_order() {
        let turns = vec![
            SpeakerTurn::new(RESPONDENT, "a", 0),
            SpeakerTurn::new(MODERATOR, "b", 1000),
            SpeakerTurn::new(RESPONDENT, "c", 2000),
        ];
        assert_eq!(distinct_speakers(&turns), vec![RESPONDENT, MODERATOR]);
    }

    #[test]
    fn test_render_speaker_lines() {
        let turns = vec![
            SpeakerTurn::new(MODERATOR, "Hi", 0),
            SpeakerTurn::new(RESPONDENT, "Hello there", 1000),
        ];
        assert_eq!(
            render_speaker_lines(&turns),
            "Moderator: Hi\nRespondent: Hello there"
        );
    }

    #[test]
    fn test_format_serializes_snake_case() {
        let json = serde_json::to_string(&TranscriptFormat::ModeratorRespondent).unwrap();
        assert_eq!(json, "\"moderator_respondent\"");
    }
}
