use thiserror::Error;

/// Errors that abort parsing of a single file
#[derive(Error, Debug)]
pub enum IngestError {
    /// File type the router does not accept
    #[error("Unsupported file type: {name} (expected .txt, .csv or .xlsx)")]
    UnsupportedFormat { name: String },

    #[error("Failed to read workbook {name}: {message}")]
    UnreadableWorkbook { name: String, message: String },

    #[error("Failed to read delimited file {name}: {message}")]
    MalformedDelimited { name: String, message: String },

    /// Every candidate was discarded, or there were none
    #[error("No valid transcripts found in {name}")]
    NoTranscriptFound { name: String },

    #[error("Failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while handing records to the persona service
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// One record failed; siblings keep going
    #[error("Agent {index}: {message}")]
    PerRecord { index: usize, message: String },

    /// Nothing in the file was accepted
    #[error("Failed to create any personas: {}", .errors.join(", "))]
    BatchAllFailed { errors: Vec<String> },
}
