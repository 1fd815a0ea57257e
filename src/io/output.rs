use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;

use crate::models::{FileStatus, PersonaPayload};
use crate::stages::FileJob;

pub const PAYLOAD_HEADER: &str = "name,age,gender,role,company,location,transcript";

/// Render a payload as a header line plus one data row.
///
/// Text fields are quoted; a numeric age is written bare.
pub fn render_payload_csv(payload: &PersonaPayload) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    writer
        .write_record([
            payload.name.clone(),
            field(&payload.age),
            field(&payload.gender),
            field(&payload.role),
            field(&payload.company),
            field(&payload.location),
            payload.transcript.clone(),
        ])
        .context("Failed to write payload row")?;

    let row = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush payload row: {}", e))?;
    let row = String::from_utf8(row).context("Payload row is not valid UTF-8")?;

    Ok(format!("{}\n{}", PAYLOAD_HEADER, row))
}

/// Outcome of a batch, as written by `--report`
#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub completed: usize,
    pub partially_completed: usize,
    pub failed: usize,
    pub files: &'a [FileJob],
}

impl<'a> BatchReport<'a> {
    pub fn from_jobs(jobs: &'a [FileJob]) -> Self {
        let mut report = Self {
            generated_at: Utc::now(),
            completed: 0,
            partially_completed: 0,
            failed: 0,
            files: jobs,
        };

        for job in jobs {
            match job.status {
                FileStatus::Completed => report.completed += 1,
                FileStatus::PartiallyCompleted { .. } => report.partially_completed += 1,
                FileStatus::Failed { .. } => report.failed += 1,
                _ => {}
            }
        }

        report
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}
