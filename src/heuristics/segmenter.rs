use tracing::debug;

use crate::models::{
    first_non_empty, row_has_content, Row, TranscriptCandidate, Workbook,
};

use super::Lexicon;

/// Split a workbook into transcript candidates.
///
/// Several sheets: one candidate per sheet, labeled `"<file> - <sheet>"`.
/// One sheet: rows are split at section markers; a single section (or none)
/// keeps the whole sheet as one candidate labeled with the file name.
pub fn segment_workbook(
    workbook: &Workbook,
    file_name: &str,
    lexicon: &Lexicon,
) -> Vec<TranscriptCandidate> {
    if workbook.sheets.len() > 1 {
        return workbook
            .sheets
            .iter()
            .map(|sheet| {
                TranscriptCandidate::tabular(
                    format!("{} - {}", file_name, sheet.name),
                    non_empty_rows(&sheet.rows),
                )
            })
            .collect();
    }

    let Some(sheet) = workbook.sheets.first() else {
        return Vec::new();
    };

    let sections = split_sections(&sheet.rows, lexicon);
    debug!("Sheet {} split into {} section(s)", sheet.name, sections.len());

    match sections.len() {
        0 => Vec::new(),
        1 => sections
            .into_iter()
            .map(|rows| TranscriptCandidate::tabular(file_name, rows))
            .collect(),
        _ => sections
            .into_iter()
            .enumerate()
            .map(|(i, rows)| {
                TranscriptCandidate::tabular(format!("{} - Transcript {}", file_name, i + 1), rows)
            })
            .collect(),
    }
}

/// Group rows into sections, opening a new one at every marker row
fn split_sections(rows: &[Row], lexicon: &Lexicon) -> Vec<Vec<Row>> {
    let mut sections = Vec::new();
    let mut current: Vec<Row> = Vec::new();

    for row in rows.iter().filter(|r| row_has_content(r)) {
        let is_boundary = first_non_empty(row).is_some_and(|cell| lexicon.is_section_marker(cell));
        if is_boundary && !current.is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        current.push(row.clone());
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

fn non_empty_rows(rows: &[Row]) -> Vec<Row> {
    rows.iter().filter(|r| row_has_content(r)).cloned().collect()
}
