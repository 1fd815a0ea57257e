use std::collections::{HashMap, HashSet};

use crate::models::{
    EmotionalIndicator, FormalityLevel, LinguisticProfile, PhraseCount, ResponsePattern,
    SpeakerTurn, TopicSignal, VocabularyComplexity,
};

use super::lexicon::{contains_any, count_present};
use super::Lexicon;

const MAX_COMMON_PHRASES: usize = 10;

/// Keyword buckets present anywhere in the text (substring, case-insensitive)
pub fn extract_emotional_indicators(text: &str, lexicon: &Lexicon) -> Vec<EmotionalIndicator> {
    let lower = text.to_lowercase();
    [
        (EmotionalIndicator::Positive, &lexicon.positive),
        (EmotionalIndicator::Negative, &lexicon.negative),
        (EmotionalIndicator::Uncertainty, &lexicon.uncertainty),
        (EmotionalIndicator::Hesitation, &lexicon.hesitation),
    ]
    .into_iter()
    .filter(|(_, keywords)| contains_any(&lower, keywords))
    .map(|(indicator, _)| indicator)
    .collect()
}

/// Whether the text contains a filler marker such as "um"
pub fn has_hesitation(text: &str, lexicon: &Lexicon) -> bool {
    contains_any(&text.to_lowercase(), &lexicon.hesitation_markers)
}

/// Per-turn metrics for respondent analysis
pub fn response_pattern(turn: &SpeakerTurn, lexicon: &Lexicon) -> ResponsePattern {
    ResponsePattern {
        content: turn.content.clone(),
        length: turn.content.chars().count(),
        word_count: turn.word_count(),
        has_questions: turn.content.contains('?'),
        has_hesitation: has_hesitation(&turn.content, lexicon),
        emotional_indicators: extract_emotional_indicators(&turn.content, lexicon),
    }
}

/// Aggregate style metrics over a turn set
pub fn analyze_language_style(turns: &[SpeakerTurn], lexicon: &Lexicon) -> LinguisticProfile {
    let all_content = joined_content(turns);
    let words: Vec<&str> = all_content.split_whitespace().collect();
    let turn_count = turns.len();

    let questions = turns.iter().filter(|t| t.content.contains('?')).count();
    let hesitations = turns
        .iter()
        .filter(|t| has_hesitation(&t.content, lexicon))
        .count();

    LinguisticProfile {
        average_sentence_length: ratio(words.len(), turn_count),
        formality_level: formality_level(&all_content, lexicon),
        question_frequency: ratio(questions, turn_count),
        hesitation_frequency: ratio(hesitations, turn_count),
        common_phrases: common_phrases(turns),
        vocabulary_complexity: vocabulary_complexity(&words),
    }
}

/// Compare formal and informal keyword hits over the text
pub fn formality_level(text: &str, lexicon: &Lexicon) -> FormalityLevel {
    let lower = text.to_lowercase();
    let formal = count_present(&lower, &lexicon.formal);
    let informal = count_present(&lower, &lexicon.informal);

    if informal > formal {
        FormalityLevel::Informal
    } else if formal > informal {
        FormalityLevel::Formal
    } else {
        FormalityLevel::Neutral
    }
}

/// Most frequent adjacent-word pairs within turns.
///
/// Ordered by descending count; equal counts keep first-occurrence order.
pub fn common_phrases(turns: &[SpeakerTurn]) -> Vec<PhraseCount> {
    let mut counts: Vec<PhraseCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for turn in turns {
        let lower = turn.content.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        for pair in words.windows(2) {
            let phrase = format!("{} {}", pair[0], pair[1]);
            match positions.get(&phrase) {
                Some(&i) => counts[i].count += 1,
                None => {
                    positions.insert(phrase.clone(), counts.len());
                    counts.push(PhraseCount { phrase, count: 1 });
                }
            }
        }
    }

    // stable sort keeps first-occurrence order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(MAX_COMMON_PHRASES);
    counts
}

pub fn vocabulary_complexity(words: &[&str]) -> VocabularyComplexity {
    let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();

    VocabularyComplexity {
        unique_word_ratio: ratio(unique.len(), words.len()),
        average_word_length: ratio(total_chars, words.len()),
        vocabulary_size: unique.len(),
    }
}

/// Topic categories with at least one keyword present, most mentioned first
pub fn extract_key_topics(turns: &[SpeakerTurn], lexicon: &Lexicon) -> Vec<TopicSignal> {
    let all_content = joined_content(turns).to_lowercase();

    let mut topics: Vec<TopicSignal> = lexicon
        .topics
        .iter()
        .map(|t| TopicSignal {
            topic: t.topic.clone(),
            mentions: count_present(&all_content, &t.keywords),
        })
        .filter(|t| t.mentions > 0)
        .collect();

    topics.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    topics
}

fn joined_content(turns: &[SpeakerTurn]) -> String {
    turns
        .iter()
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
