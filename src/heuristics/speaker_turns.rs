use crate::models::{
    first_non_empty, Row, RowLayout, SpeakerTurn, TranscriptCandidate, UNKNOWN_SPEAKER,
};

use super::{Lexicon, PrefixRule};

/// Signature shared by every named strategy.
///
/// `None` means the strategy's precondition does not hold and the next one
/// should be tried. `Some` means the strategy claims the candidate, even if
/// it ends up producing no turns.
pub type StrategyFn = fn(&[Row], &Lexicon) -> Option<Vec<SpeakerTurn>>;

/// A named link in the extraction cascade
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    /// Whether turns from this strategy carry moderator/respondent labels
    pub labeled: bool,
    pub run: StrategyFn,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("labeled", &self.labeled)
            .finish()
    }
}

pub const FIRST_COLUMN_PREFIX: Strategy = Strategy {
    name: "first_column_prefix",
    labeled: true,
    run: first_column_prefix,
};

pub const LINE_PREFIX: Strategy = Strategy {
    name: "line_prefix",
    labeled: true,
    run: line_prefix,
};

pub const ANY_COLUMN_PREFIX: Strategy = Strategy {
    name: "any_column_prefix",
    labeled: true,
    run: any_column_prefix,
};

pub const HEADER_COLUMNS: Strategy = Strategy {
    name: "header_columns",
    labeled: false,
    run: header_columns,
};

pub const UNIFORM_FALLBACK: &str = "uniform";

/// Cascade for spreadsheet and CSV rows
pub const TABULAR_STRATEGIES: &[Strategy] =
    &[FIRST_COLUMN_PREFIX, ANY_COLUMN_PREFIX, HEADER_COLUMNS];

/// Cascade for plain-text lines
pub const TEXT_STRATEGIES: &[Strategy] = &[LINE_PREFIX];

/// Turns recovered from one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub turns: Vec<SpeakerTurn>,
    /// Name of the strategy that produced the turns
    pub strategy: &'static str,
    pub is_moderator_respondent: bool,
}

/// Run the strategy cascade for the candidate's row layout.
///
/// The first strategy whose precondition holds is used. If it yields no
/// turns, the uniform fallback runs over the same rows.
pub fn extract_speaker_turns(candidate: &TranscriptCandidate, lexicon: &Lexicon) -> Extraction {
    let strategies = match candidate.layout {
        RowLayout::Lines => TEXT_STRATEGIES,
        RowLayout::Cells => TABULAR_STRATEGIES,
    };
    run_cascade(strategies, &candidate.rows, lexicon)
}

pub fn run_cascade(strategies: &[Strategy], rows: &[Row], lexicon: &Lexicon) -> Extraction {
    let selected = strategies
        .iter()
        .find_map(|s| (s.run)(rows, lexicon).map(|turns| (s, turns)));

    match selected {
        Some((strategy, turns)) if !turns.is_empty() => Extraction {
            turns,
            strategy: strategy.name,
            is_moderator_respondent: strategy.labeled,
        },
        _ => Extraction {
            turns: uniform_fallback(rows),
            strategy: UNIFORM_FALLBACK,
            is_moderator_respondent: false,
        },
    }
}

/// `M:`/`R:` labels at the start of the first cell
fn first_column_prefix(rows: &[Row], lexicon: &Lexicon) -> Option<Vec<SpeakerTurn>> {
    fold_first_cell_prefixes(rows, &lexicon.tabular_prefixes)
}

/// Any of the text labels (`Moderator:`, `Q:`, `A:` ...) at the start of a line
fn line_prefix(rows: &[Row], lexicon: &Lexicon) -> Option<Vec<SpeakerTurn>> {
    fold_first_cell_prefixes(rows, &lexicon.text_prefixes)
}

fn fold_first_cell_prefixes(rows: &[Row], rules: &[PrefixRule]) -> Option<Vec<SpeakerTurn>> {
    let applies = rows
        .iter()
        .any(|row| match_prefix(first_cell(row), rules).is_some());
    if !applies {
        return None;
    }

    let (turns, _) = rows.iter().enumerate().fold(
        (Vec::new(), None::<String>),
        |(mut turns, last_speaker), (index, row)| {
            let cell = first_cell(row);
            let (speaker, content) = match match_prefix(cell, rules) {
                Some((speaker, content)) => (speaker.to_string(), content),
                None => (inherit(&last_speaker), cell),
            };
            push_turn(&mut turns, &speaker, content, row_timestamp(index));
            (turns, Some(speaker))
        },
    );

    Some(turns)
}

/// Labels found in any column; the leftmost labeled cell wins
fn any_column_prefix(rows: &[Row], lexicon: &Lexicon) -> Option<Vec<SpeakerTurn>> {
    let rules = &lexicon.tabular_prefixes;
    let applies = rows.iter().any(|row| {
        row.iter()
            .flatten()
            .any(|cell| match_prefix(cell, rules).is_some())
    });
    if !applies {
        return None;
    }

    let (turns, _) = rows.iter().enumerate().fold(
        (Vec::new(), None::<String>),
        |(mut turns, last_speaker), (index, row)| {
            let labeled = row
                .iter()
                .flatten()
                .find_map(|cell| match_prefix(cell, rules));
            let (speaker, content) = match labeled {
                Some((speaker, content)) => (speaker.to_string(), content),
                None => (inherit(&last_speaker), first_non_empty(row).unwrap_or("")),
            };
            push_turn(&mut turns, &speaker, content, row_timestamp(index));
            (turns, Some(speaker))
        },
    );

    Some(turns)
}

/// First non-empty row is a header; columns are located by name
fn header_columns(rows: &[Row], lexicon: &Lexicon) -> Option<Vec<SpeakerTurn>> {
    let header_index = rows.iter().position(|row| first_non_empty(row).is_some())?;
    let header = &rows[header_index];

    let speaker_col = find_column(header, &lexicon.speaker_columns);
    let content_col = find_column(header, &lexicon.content_columns);
    let timestamp_col = find_column(header, &lexicon.timestamp_columns);

    let mut turns = Vec::new();
    for (index, row) in rows[header_index + 1..].iter().enumerate() {
        let speaker = speaker_col
            .and_then(|c| cell_at(row, c))
            .map(str::to_string)
            .unwrap_or_else(|| synthetic_speaker(index));
        let content = content_col
            .and_then(|c| cell_at(row, c))
            .or_else(|| first_non_empty(row))
            .unwrap_or("");
        let timestamp = timestamp_col
            .and_then(|c| cell_at(row, c))
            .and_then(parse_timestamp)
            .unwrap_or_else(|| row_timestamp(index));
        push_turn(&mut turns, &speaker, content, timestamp);
    }

    Some(turns)
}

/// One turn per row, numbered speakers
pub fn uniform_fallback(rows: &[Row]) -> Vec<SpeakerTurn> {
    let mut turns = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let content = first_non_empty(row).unwrap_or("");
        push_turn(&mut turns, &synthetic_speaker(index), content, row_timestamp(index));
    }
    turns
}

/// Match a speaker label at the start of a trimmed cell, returning the
/// speaker and the trimmed remainder
fn match_prefix<'a>(cell: &'a str, rules: &'a [PrefixRule]) -> Option<(&'a str, &'a str)> {
    let cell = cell.trim();
    rules.iter().find_map(|rule| {
        cell.strip_prefix(rule.prefix.as_str())
            .map(|rest| (rule.speaker.as_str(), rest.trim()))
    })
}

fn find_column(header: &Row, names: &[String]) -> Option<usize> {
    header.iter().position(|cell| {
        cell.as_deref()
            .map(|c| c.to_lowercase())
            .is_some_and(|c| names.iter().any(|n| c.contains(n.as_str())))
    })
}

fn first_cell(row: &Row) -> &str {
    row.first().and_then(|c| c.as_deref()).unwrap_or("")
}

fn cell_at(row: &Row, index: usize) -> Option<&str> {
    row.get(index).and_then(|c| c.as_deref())
}

fn inherit(last_speaker: &Option<String>) -> String {
    last_speaker
        .clone()
        .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string())
}

fn synthetic_speaker(index: usize) -> String {
    format!("Speaker_{}", index + 1)
}

fn row_timestamp(index: usize) -> i64 {
    index as i64 * 1000
}

fn parse_timestamp(cell: &str) -> Option<i64> {
    cell.parse::<i64>()
        .ok()
        .or_else(|| cell.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
}

/// Append a turn unless its content is blank
fn push_turn(turns: &mut Vec<SpeakerTurn>, speaker: &str, content: &str, timestamp: i64) {
    let content = content.trim();
    if !content.is_empty() {
        turns.push(SpeakerTurn::new(speaker, content, timestamp));
    }
}
