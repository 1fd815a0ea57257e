use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::heuristics::{extract_speaker_turns, segment_workbook, Lexicon};
use crate::io::route_source;
use crate::models::{
    distinct_speakers, render_speaker_lines, RawSource, RoutedSource, SourceOrigin,
    TranscriptCandidate, TranscriptFormat, TranscriptMetadata, TranscriptRecord,
};

/// Seconds-per-turn pacing for line-oriented text
pub const TEXT_SECONDS_PER_TURN: usize = 2;
/// Seconds-per-turn pacing for spreadsheet rows
pub const TABULAR_SECONDS_PER_TURN: usize = 3;

/// Records recovered from one file, with bookkeeping for discarded candidates
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource {
    pub records: Vec<TranscriptRecord>,
    pub candidate_count: usize,
    pub discarded_candidates: usize,
}

/// Parse a raw file into transcript records.
///
/// Routes the file, splits it into candidates, extracts turns from each and
/// assembles the survivors. Text and CSV files are one candidate each; only
/// workbooks are split by sheet or section. Fails with `NoTranscriptFound` when nothing
/// survives.
pub fn parse_source(source: &RawSource, lexicon: &Lexicon) -> Result<ParsedSource, IngestError> {
    let routed = route_source(source)?;

    let (candidates, original_text) = match routed {
        RoutedSource::Text(text) => {
            let candidate = TranscriptCandidate::from_text(&source.name, &text);
            (vec![candidate], Some(text))
        }
        RoutedSource::Delimited { text, rows } => {
            let candidate = TranscriptCandidate::from_delimited(&source.name, &rows);
            (vec![candidate], Some(text))
        }
        RoutedSource::Workbook(workbook) => {
            (segment_workbook(&workbook, &source.name, lexicon), None)
        }
    };

    info!("{}: {} transcript candidate(s)", source.name, candidates.len());

    let candidate_count = candidates.len();
    let records: Vec<TranscriptRecord> = candidates
        .iter()
        .filter_map(|candidate| {
            let record = assemble_record(candidate, original_text.as_deref(), lexicon);
            if record.is_none() {
                warn!("Discarding candidate {}: no speaker turns found", candidate.label);
            }
            record
        })
        .collect();

    if records.is_empty() {
        return Err(IngestError::NoTranscriptFound {
            name: source.name.clone(),
        });
    }

    Ok(ParsedSource {
        discarded_candidates: candidate_count - records.len(),
        candidate_count,
        records,
    })
}

/// Turn one candidate into a record, or `None` if it yields no turns.
///
/// Text-origin candidates (plain text and CSV) keep the original text as
/// `raw_text`; workbook ones get a `speaker: content` reconstruction.
pub fn assemble_record(
    candidate: &TranscriptCandidate,
    original_text: Option<&str>,
    lexicon: &Lexicon,
) -> Option<TranscriptRecord> {
    let extraction = extract_speaker_turns(candidate, lexicon);
    if extraction.turns.is_empty() {
        return None;
    }

    debug!(
        "{}: {} turns via {}",
        candidate.label,
        extraction.turns.len(),
        extraction.strategy
    );

    let (raw_text, seconds_per_turn) = match candidate.origin {
        SourceOrigin::Text => (
            original_text.unwrap_or_default().to_string(),
            TEXT_SECONDS_PER_TURN,
        ),
        SourceOrigin::Tabular => (
            render_speaker_lines(&extraction.turns),
            TABULAR_SECONDS_PER_TURN,
        ),
    };

    let format = if extraction.is_moderator_respondent {
        TranscriptFormat::ModeratorRespondent
    } else {
        TranscriptFormat::Standard
    };

    Some(TranscriptRecord {
        raw_text,
        metadata: TranscriptMetadata {
            filename: candidate.label.clone(),
            total_turns: extraction.turns.len(),
            estimated_duration: extraction.turns.len() * seconds_per_turn,
            format,
            speakers: distinct_speakers(&extraction.turns),
            origin: candidate.origin,
        },
        speaker_turns: extraction.turns,
        conversation_context: None,
    })
}
