use serde::{Deserialize, Serialize};

/// A single normalized row: each cell is a trimmed, non-empty string or absent
pub type Row = Vec<Option<String>>;

/// An uploaded file as it arrived - never mutated by the pipeline
#[derive(Debug, Clone)]
pub struct RawSource {
    /// File name including extension
    pub name: String,
    /// Declared MIME type, if the caller knows one
    pub mime: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

impl RawSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Lower-cased extension of the file name, without the dot
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Where the rows of a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Plain or comma-delimited text, kept verbatim as the raw transcript
    Text,
    /// Cell grid from a workbook
    Tabular,
}

/// Shape of a candidate's rows, which picks the speaker-turn strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// One line of text per one-cell row
    Lines,
    /// Cells split into columns
    Cells,
}

/// One named sheet of normalized rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Ordered collection of sheets, already normalized to optional trimmed strings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Build a workbook with one sheet
    pub fn single(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            sheets: vec![Sheet {
                name: name.into(),
                rows,
            }],
        }
    }
}

/// Output of routing a raw file
#[derive(Debug, Clone)]
pub enum RoutedSource {
    /// Plain text, kept verbatim
    Text(String),
    /// Comma-delimited text, with its rows already split into cells
    Delimited { text: String, rows: Vec<Row> },
    /// Tabular grid from xlsx sheets
    Workbook(Workbook),
}

/// A chunk of rows suspected to hold one transcript
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptCandidate {
    /// File name, optionally qualified by sheet or section
    pub label: String,
    pub rows: Vec<Row>,
    pub origin: SourceOrigin,
    pub layout: RowLayout,
}

impl TranscriptCandidate {
    /// Build a spreadsheet candidate from already-filtered rows
    pub fn tabular(label: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            label: label.into(),
            rows,
            origin: SourceOrigin::Tabular,
            layout: RowLayout::Cells,
        }
    }

    /// Build a candidate for a whole delimited file: cell rows, text origin
    pub fn from_delimited(label: impl Into<String>, rows: &[Row]) -> Self {
        Self {
            label: label.into(),
            rows: rows.iter().filter(|r| row_has_content(r)).cloned().collect(),
            origin: SourceOrigin::Text,
            layout: RowLayout::Cells,
        }
    }

    /// Build a text candidate: every non-blank line becomes a one-cell row
    pub fn from_text(label: impl Into<String>, text: &str) -> Self {
        let rows = text
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| vec![Some(line.to_string())])
            .collect();

        Self {
            label: label.into(),
            rows,
            origin: SourceOrigin::Text,
            layout: RowLayout::Lines,
        }
    }
}

/// Whether a row has at least one present cell
pub fn row_has_content(row: &Row) -> bool {
    row.iter().any(|c| c.is_some())
}

/// First present cell of a row
pub fn first_non_empty(row: &Row) -> Option<&str> {
    row.iter().flatten().map(String::as_str).next()
}

/// Normalize a raw cell string: trim, and treat whitespace-only as absent
pub fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
