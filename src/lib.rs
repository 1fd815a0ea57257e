pub mod api;
pub mod error;
pub mod heuristics;
pub mod io;
pub mod models;
pub mod stages;

pub use api::{PersonaApiClient, PersonaApiConfig, PersonaGenerator};
pub use error::{IngestError, SubmissionError};
pub use heuristics::{
    analyze_language_style, extract_emotional_indicators, extract_key_topics,
    extract_speaker_turns, segment_workbook, Lexicon,
};
pub use io::{load_source, render_payload_csv, route_source, BatchReport};
pub use models::{
    ConversationContext, Demographics, FileStatus, LinguisticProfile, RawSource, SpeakerTurn,
    SubmissionResult, TranscriptCandidate, TranscriptRecord,
};
pub use stages::{
    apply_respondent_filter, parse_source, BatchProcessor, BatchSummary, FileJob, ParsedSource,
    SubmissionConfig,
};
