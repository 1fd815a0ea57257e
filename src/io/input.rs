use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use crate::error::IngestError;
use crate::models::{normalize_cell, RawSource, RoutedSource, Row, Sheet, Workbook};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const CSV_MIMES: &[&str] = &["text/csv", "application/csv", "text/x-csv", "application/x-csv"];

/// How a raw file will be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    /// Comma-delimited text, kept verbatim and also split into cells
    Delimited,
    Workbook,
}

/// Classify a file by extension, then by declared MIME type
pub fn classify(source: &RawSource) -> Result<SourceKind, IngestError> {
    let by_extension = match source.extension().as_deref() {
        Some("txt") => Some(SourceKind::Text),
        Some("csv") => Some(SourceKind::Delimited),
        Some("xlsx") => Some(SourceKind::Workbook),
        _ => None,
    };

    let by_mime = source.mime.as_deref().and_then(|mime| match mime {
        "text/plain" => Some(SourceKind::Text),
        XLSX_MIME => Some(SourceKind::Workbook),
        m if CSV_MIMES.contains(&m) => Some(SourceKind::Delimited),
        _ => None,
    });

    by_extension
        .or(by_mime)
        .ok_or_else(|| IngestError::UnsupportedFormat {
            name: source.name.clone(),
        })
}

/// Route a raw file into text or a normalized workbook
pub fn route_source(source: &RawSource) -> Result<RoutedSource, IngestError> {
    let kind = classify(source)?;
    debug!("Routing {} as {:?}", source.name, kind);

    match kind {
        SourceKind::Text => Ok(RoutedSource::Text(decode_text(&source.bytes))),
        SourceKind::Delimited => {
            let text = decode_text(&source.bytes);
            let rows = read_delimited(&text, &source.name)?;
            Ok(RoutedSource::Delimited { text, rows })
        }
        SourceKind::Workbook => read_workbook(&source.bytes, &source.name).map(RoutedSource::Workbook),
    }
}

/// Read a file from disk into a RawSource
pub async fn load_source(path: &Path) -> Result<RawSource, IngestError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = tokio::fs::read(path).await.map_err(|source| IngestError::Io {
        name: name.clone(),
        source,
    })?;

    Ok(RawSource::new(name, bytes))
}

/// Lossy UTF-8 decode with any byte-order mark removed
pub fn decode_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let text: &str = &decoded;
    text.strip_prefix('\u{feff}').unwrap_or(text).to_string()
}

/// Split delimited text into rows of normalized cells
pub fn read_delimited(text: &str, name: &str) -> Result<Vec<Row>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::MalformedDelimited {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        rows.push(record.iter().map(normalize_cell).collect());
    }

    Ok(rows)
}

/// Decode an xlsx workbook, normalizing every cell to an optional trimmed string
pub fn read_workbook(bytes: &[u8], name: &str) -> Result<Workbook, IngestError> {
    let unreadable = |message: String| IngestError::UnreadableWorkbook {
        name: name.to_string(),
        message,
    };

    let mut xlsx: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| unreadable(e.to_string()))?;

    let mut sheets = Vec::new();
    for sheet_name in xlsx.sheet_names() {
        let range = xlsx
            .worksheet_range(&sheet_name)
            .map_err(|e| unreadable(e.to_string()))?;
        let rows: Vec<Row> = range
            .rows()
            .map(|cells| cells.iter().map(normalize_data_cell).collect())
            .collect();
        debug!("Sheet {}: {} rows", sheet_name, rows.len());
        sheets.push(Sheet {
            name: sheet_name,
            rows,
        });
    }

    Ok(Workbook { sheets })
}

/// Render a spreadsheet cell as trimmed text; blanks become absent
pub fn normalize_data_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => normalize_cell(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        let kind = |name: &str| classify(&RawSource::new(name, vec![])).unwrap();
        assert_eq!(kind("a.txt"), SourceKind::Text);
        assert_eq!(kind("b.CSV"), SourceKind::Delimited);
        assert_eq!(kind("c.xlsx"), SourceKind::Workbook);
    }

    #[test]
    fn test_classify_by_mime() {
        let source = RawSource::new("upload", vec![]).with_mime(XLSX_MIME);
        assert_eq!(classify(&source).unwrap(), SourceKind::Workbook);

        let source = RawSource::new("upload", vec![]).with_mime("text/x-csv");
        assert_eq!(classify(&source).unwrap(), SourceKind::Delimited);
    }

    #[test]
    fn test_unsupported_format() {
        let err = route_source(&RawSource::new("notes.pdf", vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat { name } if name == "notes.pdf"));
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let source = RawSource::new("a.txt", b"\xEF\xBB\xBFM: hi\r\nR: hey\n".to_vec());
        match route_source(&source).unwrap() {
            RoutedSource::Text(text) => assert_eq!(text, "M: hi\r\nR: hey\n"),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_delimited_rows_are_normalized() {
        let rows =
            read_delimited("speaker,content\nAlice,  Hello \n,\nBob,Hi,extra\n", "c.csv").unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], vec![Some("Alice".to_string()), Some("Hello".to_string())]);
        assert_eq!(rows[2], vec![None, None]);
        assert_eq!(rows[3].len(), 3);
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let rows = read_delimited("speaker,content\nAlice,\"Hello, there\"\n", "c.csv").unwrap();
        assert_eq!(
            rows[1][1].as_deref(),
            Some("Hello, there")
        );
    }

    #[test]
    fn test_csv_routes_as_delimited_text() {
        let source = RawSource::new("s.csv", b"speaker,content\nAlice,hi there\n".to_vec());
        match route_source(&source).unwrap() {
            RoutedSource::Delimited { text, rows } => {
                assert_eq!(text, "speaker,content\nAlice,hi there\n");
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[1][1].as_deref(), Some("hi there"));
            }
            other => panic!("expected delimited text, got {:?}", other),
        }
    }

    #[test]
    fn test_read_workbook_sheets_and_cells() {
        let mut xlsx = rust_xlsxwriter::Workbook::new();
        let sheet = xlsx.add_worksheet();
        sheet.set_name("Interview").unwrap();
        sheet.write_string(0, 0, "speaker").unwrap();
        sheet.write_string(0, 1, "content").unwrap();
        sheet.write_string(1, 0, "Alice").unwrap();
        sheet.write_number(1, 1, 42.0).unwrap();
        sheet.write_string(3, 0, "Bob").unwrap();
        sheet.write_string(3, 1, "  fine  ").unwrap();
        let notes = xlsx.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "hello").unwrap();
        let bytes = xlsx.save_to_buffer().unwrap();

        let workbook = read_workbook(&bytes, "study.xlsx").unwrap();

        let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Interview", "Notes"]);
        let rows = &workbook.sheets[0].rows;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], vec![Some("Alice".to_string()), Some("42".to_string())]);
        assert_eq!(rows[2], vec![None, None]);
        assert_eq!(rows[3][1].as_deref(), Some("fine"));
        assert_eq!(workbook.sheets[1].rows, vec![vec![Some("hello".to_string())]]);
    }

    #[test]
    fn test_invalid_workbook() {
        let err = read_workbook(b"not a zip", "bad.xlsx").unwrap_err();
        assert!(matches!(err, IngestError::UnreadableWorkbook { .. }));
    }

    #[test]
    fn test_normalize_data_cell() {
        assert_eq!(normalize_data_cell(&Data::Empty), None);
        assert_eq!(normalize_data_cell(&Data::Float(3.0)), Some("3".to_string()));
        assert_eq!(normalize_data_cell(&Data::Int(42)), Some("42".to_string()));
        assert_eq!(
            normalize_data_cell(&Data::String("  R: yes ".to_string())),
            Some("R: yes".to_string())
        );
        assert_eq!(normalize_data_cell(&Data::String("   ".to_string())), None);
    }

    #[tokio::test]
    async fn test_load_source_reads_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interview.txt");
        std::fs::write(&path, "M: hi").unwrap();

        let source = load_source(&path).await.unwrap();

        assert_eq!(source.name, "interview.txt");
        assert_eq!(source.bytes, b"M: hi");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_source(Path::new("/nonexistent/x.txt")).await.unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
