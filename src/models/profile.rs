use serde::{Deserialize, Serialize};

/// Keyword bucket hit by a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalIndicator {
    Positive,
    Negative,
    Uncertainty,
    Hesitation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormalityLevel {
    Formal,
    Informal,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseCount {
    pub phrase: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyComplexity {
    /// Type-token ratio
    pub unique_word_ratio: f64,
    pub average_word_length: f64,
    pub vocabulary_size: usize,
}

/// Aggregate style metrics over a set of turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinguisticProfile {
    /// Mean whitespace tokens per turn
    pub average_sentence_length: f64,
    pub formality_level: FormalityLevel,
    pub question_frequency: f64,
    pub hesitation_frequency: f64,
    /// At most ten bigrams, descending by count
    pub common_phrases: Vec<PhraseCount>,
    pub vocabulary_complexity: VocabularyComplexity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSignal {
    pub topic: String,
    pub mentions: usize,
}

/// Per-turn respondent metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePattern {
    pub content: String,
    /// Character count
    pub length: usize,
    pub word_count: usize,
    pub has_questions: bool,
    pub has_hesitation: bool,
    pub emotional_indicators: Vec<EmotionalIndicator>,
}

/// Respondent-focused context attached to moderator/respondent records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub total_turns: usize,
    pub response_patterns: Vec<ResponsePattern>,
    pub language_style: LinguisticProfile,
    pub key_topics: Vec<TopicSignal>,
}
