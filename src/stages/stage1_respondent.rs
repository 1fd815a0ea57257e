use tracing::debug;

use crate::heuristics::{analyze_language_style, extract_key_topics, response_pattern, Lexicon};
use crate::models::{ConversationContext, SpeakerTurn, TranscriptRecord, RESPONDENT};

/// Focus a moderator/respondent record on the respondent's own speech.
///
/// Standard-format records are returned unchanged. Otherwise turns are
/// filtered to the respondent, `raw_text` becomes their content alone, and a
/// conversation context is attached.
pub fn apply_respondent_filter(mut record: TranscriptRecord, lexicon: &Lexicon) -> TranscriptRecord {
    if !record.is_moderator_respondent() {
        return record;
    }

    let respondent_turns: Vec<SpeakerTurn> = record
        .speaker_turns
        .iter()
        .filter(|t| t.speaker == RESPONDENT)
        .cloned()
        .collect();

    debug!(
        "{}: kept {} of {} turns for the respondent",
        record.metadata.filename,
        respondent_turns.len(),
        record.speaker_turns.len()
    );

    record.raw_text = respondent_turns
        .iter()
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    record.conversation_context = Some(build_conversation_context(&respondent_turns, lexicon));
    record.set_turns(respondent_turns);
    record
}

/// Per-turn patterns plus aggregate style and topics over the given turns
pub fn build_conversation_context(turns: &[SpeakerTurn], lexicon: &Lexicon) -> ConversationContext {
    ConversationContext {
        total_turns: turns.len(),
        response_patterns: turns.iter().map(|t| response_pattern(t, lexicon)).collect(),
        language_style: analyze_language_style(turns, lexicon),
        key_topics: extract_key_topics(turns, lexicon),
    }
}
