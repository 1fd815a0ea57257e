use serde::{Deserialize, Serialize};

use super::TranscriptRecord;

/// Caller-supplied demographic defaults, used only to fill gaps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
}

/// Single-row body sent to the persona-generation service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaPayload {
    pub name: String,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub transcript: String,
}

impl PersonaPayload {
    /// Build the payload for the `index`-th (0-based) record of a file
    pub fn from_record(record: &TranscriptRecord, index: usize, defaults: &Demographics) -> Self {
        Self {
            name: format!("Agent {}", index + 1),
            age: defaults.age.clone(),
            gender: defaults.gender.clone(),
            role: defaults.occupation.clone(),
            company: defaults.company.clone(),
            location: defaults.location.clone(),
            transcript: record.raw_text.clone(),
        }
    }
}

/// A persona the collaborator reports as created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPersona {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    #[serde(default)]
    pub name: String,
}

/// Outcome of submitting one record
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub record: TranscriptRecord,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_persona_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-file processing state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Reading,
    Parsing,
    Submitting,
    Completed,
    PartiallyCompleted { succeeded: usize, total: usize },
    Failed { message: String },
}

impl FileStatus {
    /// Settled files are skipped when a batch is re-run
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            FileStatus::Completed | FileStatus::PartiallyCompleted { .. }
        )
    }

    /// User-facing summary line
    pub fn message(&self) -> String {
        match self {
            FileStatus::Pending => "pending".to_string(),
            FileStatus::Reading => "reading".to_string(),
            FileStatus::Parsing => "parsing".to_string(),
            FileStatus::Submitting => "submitting".to_string(),
            FileStatus::Completed => "completed".to_string(),
            FileStatus::PartiallyCompleted { succeeded, total } => {
                format!("partially completed ({}/{})", succeeded, total)
            }
            FileStatus::Failed { message } => format!("error: {}", message),
        }
    }
}
