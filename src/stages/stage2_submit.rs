use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::PersonaGenerator;
use crate::error::SubmissionError;
use crate::heuristics::Lexicon;
use crate::io::load_source;
use crate::models::{
    Demographics, FileStatus, PersonaPayload, SubmissionResult, TranscriptRecord,
};

use super::{apply_respondent_filter, parse_source};

/// Configuration for submission pacing and payload defaults
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    /// Pause between consecutive submissions within a file
    pub submission_delay: Duration,
    /// Pause between files in a batch
    pub file_delay: Duration,
    /// Demographic defaults for every payload
    pub demographics: Demographics,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            submission_delay: Duration::from_millis(500),
            file_delay: Duration::from_millis(1000),
            demographics: Demographics::default(),
        }
    }
}

/// Enforces a pause between consecutive operations.
///
/// The pause is measured from the end of the previous operation, recorded
/// with `done`. The first `wait` returns immediately.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last_done: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_done: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(last_done) = self.last_done {
            tokio::time::sleep_until(last_done + self.delay).await;
        }
    }

    /// Mark the guarded operation as finished
    pub fn done(&mut self) {
        self.last_done = Some(Instant::now());
    }
}

/// Results of submitting every record of one file
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub results: Vec<SubmissionResult>,
    pub errors: Vec<String>,
}

impl SubmissionOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

/// Submit records one at a time, isolating failures.
///
/// A failed record is logged and collected into `errors`; the remaining
/// records are still submitted.
pub async fn submit_records<G: PersonaGenerator + ?Sized>(
    generator: &G,
    records: Vec<TranscriptRecord>,
    demographics: &Demographics,
    pacer: &mut Pacer,
) -> SubmissionOutcome {
    let total = records.len();
    let mut results = Vec::with_capacity(total);
    let mut errors = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        pacer.wait().await;
        info!("Creating persona {}/{} from {}", index + 1, total, record.metadata.filename);

        let payload = PersonaPayload::from_record(&record, index, demographics);
        let outcome = match generator.generate(&payload, index).await {
            Ok(personas) if personas.is_empty() => {
                Err(anyhow::anyhow!("persona service returned no personas"))
            }
            other => other,
        };
        pacer.done();

        match outcome {
            Ok(personas) => {
                let first = &personas[0];
                results.push(SubmissionResult {
                    created_persona_id: Some(first.agent_id.clone()),
                    persona_name: Some(first.name.clone()),
                    record,
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                let err = SubmissionError::PerRecord {
                    index: index + 1,
                    message: e.to_string(),
                };
                warn!("{}", err);
                errors.push(err.to_string());
                results.push(SubmissionResult {
                    record,
                    success: false,
                    created_persona_id: None,
                    persona_name: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    SubmissionOutcome { results, errors }
}

/// One file moving through the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct FileJob {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub status: FileStatus,
    pub message: String,
    pub candidate_count: usize,
    pub discarded_candidates: usize,
    pub results: Vec<SubmissionResult>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl FileJob {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            id: Uuid::new_v4(),
            name,
            path,
            status: FileStatus::Pending,
            message: FileStatus::Pending.message(),
            candidate_count: 0,
            discarded_candidates: 0,
            results: Vec::new(),
            errors: Vec::new(),
            finished_at: None,
        }
    }

    fn transition(&mut self, status: FileStatus) {
        info!("{}: {} -> {}", self.name, self.status.message(), status.message());
        self.message = status.message();
        self.status = status;
    }

    fn reset(&mut self) {
        self.candidate_count = 0;
        self.discarded_candidates = 0;
        self.results.clear();
        self.errors.clear();
        self.finished_at = None;
    }

    fn finish(&mut self, status: FileStatus) {
        self.transition(status);
        self.finished_at = Some(Utc::now());
    }
}

/// Final state for a file given its submission tally
pub fn settle_status(succeeded: usize, candidate_count: usize, errors: &[String]) -> FileStatus {
    if succeeded == 0 {
        FileStatus::Failed {
            message: SubmissionError::BatchAllFailed {
                errors: errors.to_vec(),
            }
            .to_string(),
        }
    } else if succeeded < candidate_count {
        FileStatus::PartiallyCompleted {
            succeeded,
            total: candidate_count,
        }
    } else {
        FileStatus::Completed
    }
}

/// Tally of one `BatchProcessor::run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub partially_completed: usize,
    pub failed: usize,
    /// Files already settled by an earlier run
    pub skipped: usize,
}

/// Runs a batch of files strictly one after another
pub struct BatchProcessor<G: PersonaGenerator> {
    generator: G,
    lexicon: Lexicon,
    config: SubmissionConfig,
    jobs: Vec<FileJob>,
}

impl<G: PersonaGenerator> BatchProcessor<G> {
    pub fn new(generator: G, lexicon: Lexicon, config: SubmissionConfig) -> Self {
        Self {
            generator,
            lexicon,
            config,
            jobs: Vec::new(),
        }
    }

    pub fn add_file(&mut self, path: PathBuf) -> Uuid {
        let job = FileJob::new(path);
        let id = job.id;
        self.jobs.push(job);
        id
    }

    pub fn jobs(&self) -> &[FileJob] {
        &self.jobs
    }

    /// Process every file that has not settled yet.
    ///
    /// Completed and partially completed files are skipped, so calling this
    /// again retries only pending and failed files.
    pub async fn run(&mut self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut file_pacer = Pacer::new(self.config.file_delay);

        for i in 0..self.jobs.len() {
            if self.jobs[i].status.is_settled() {
                summary.skipped += 1;
                continue;
            }
            file_pacer.wait().await;

            let mut job = self.jobs[i].clone();
            self.process_file(&mut job).await;
            file_pacer.done();
            match job.status {
                FileStatus::Completed => summary.completed += 1,
                FileStatus::PartiallyCompleted { .. } => summary.partially_completed += 1,
                _ => summary.failed += 1,
            }
            self.jobs[i] = job;
        }

        info!(
            "Batch finished: {} completed, {} partial, {} failed, {} skipped",
            summary.completed, summary.partially_completed, summary.failed, summary.skipped
        );
        summary
    }

    async fn process_file(&self, job: &mut FileJob) {
        job.reset();

        job.transition(FileStatus::Reading);
        let source = match load_source(&job.path).await {
            Ok(source) => source,
            Err(e) => return fail(job, e.to_string()),
        };

        job.transition(FileStatus::Parsing);
        let parsed = match parse_source(&source, &self.lexicon) {
            Ok(parsed) => parsed,
            Err(e) => return fail(job, e.to_string()),
        };
        job.candidate_count = parsed.candidate_count;
        job.discarded_candidates = parsed.discarded_candidates;
        info!(
            "{}: found {} transcript(s), {} discarded",
            job.name,
            parsed.records.len(),
            parsed.discarded_candidates
        );

        let records: Vec<TranscriptRecord> = parsed
            .records
            .into_iter()
            .map(|r| apply_respondent_filter(r, &self.lexicon))
            .collect();

        job.transition(FileStatus::Submitting);
        let mut pacer = Pacer::new(self.config.submission_delay);
        let outcome = submit_records(
            &self.generator,
            records,
            &self.config.demographics,
            &mut pacer,
        )
        .await;

        let status = settle_status(outcome.succeeded(), job.candidate_count, &outcome.errors);
        job.results = outcome.results;
        job.errors = outcome.errors;
        job.finish(status);
    }
}

fn fail(job: &mut FileJob, message: String) {
    warn!("{}: {}", job.name, message);
    job.finish(FileStatus::Failed { message });
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::models::{CreatedPersona, RawSource};

    /// Records payloads and fails any whose index is listed
    #[derive(Default)]
    struct FakeGenerator {
        fail_indices: Vec<usize>,
        latency: Duration,
        calls: Mutex<Vec<PersonaPayload>>,
        started: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl PersonaGenerator for FakeGenerator {
        async fn generate(&self, payload: &PersonaPayload, index: usize) -> Result<Vec<CreatedPersona>> {
            self.calls.lock().unwrap().push(payload.clone());
            self.started.lock().unwrap().push(Instant::now());
            tokio::time::sleep(self.latency).await;
            if self.fail_indices.contains(&index) {
                anyhow::bail!("service unavailable");
            }
            Ok(vec![CreatedPersona {
                agent_id: format!("agent-{}", index),
                name: payload.name.clone(),
            }])
        }
    }

    fn quick_config() -> SubmissionConfig {
        SubmissionConfig {
            submission_delay: Duration::ZERO,
            file_delay: Duration::ZERO,
            demographics: Demographics {
                age: Some("29".to_string()),
                occupation: Some("Nurse".to_string()),
                ..Default::default()
            },
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Two interviews, one per sheet
    fn write_two_sheets(dir: &tempfile::TempDir) -> PathBuf {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        for (name, lines) in [
            ("P1", ["M: hi", "R: I use the app daily"]),
            ("P2", ["M: hey", "R: I work from home"]),
        ] {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name).unwrap();
            for (row, line) in lines.iter().enumerate() {
                sheet.write_string(row as u32, 0, *line).unwrap();
            }
        }
        let path = dir.path().join("two.xlsx");
        workbook.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_completed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.txt", "M: How is work?\nR: Um, busy but I like it");

        let mut batch = BatchProcessor::new(FakeGenerator::default(), Lexicon::default(), quick_config());
        batch.add_file(path);
        batch.run().await;
        let jobs = batch.jobs();

        assert_eq!(jobs[0].status, FileStatus::Completed);
        assert_eq!(jobs[0].results.len(), 1);
        assert_eq!(jobs[0].results[0].created_persona_id.as_deref(), Some("agent-0"));
        assert!(jobs[0].finished_at.is_some());

        let calls = batch.generator.calls.lock().unwrap();
        assert_eq!(calls[0].transcript, "Um, busy but I like it");
        assert_eq!(calls[0].role.as_deref(), Some("Nurse"));
        assert_eq!(calls[0].age.as_deref(), Some("29"));
        assert_eq!(calls[0].name, "Agent 1");
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_two_sheets(&dir);
        let generator = FakeGenerator {
            fail_indices: vec![0],
            ..Default::default()
        };

        let mut batch = BatchProcessor::new(generator, Lexicon::default(), quick_config());
        batch.add_file(path);
        batch.run().await;
        let jobs = batch.jobs();

        assert_eq!(
            jobs[0].status,
            FileStatus::PartiallyCompleted {
                succeeded: 1,
                total: 2
            }
        );
        assert_eq!(jobs[0].message, "partially completed (1/2)");
        assert_eq!(jobs[0].errors, vec!["Agent 1: service unavailable"]);
        assert!(!jobs[0].results[0].success);
        assert!(jobs[0].results[1].success);
        assert_eq!(batch.generator.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_all_submissions_failing_fails_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_two_sheets(&dir);
        let generator = FakeGenerator {
            fail_indices: vec![0, 1],
            ..Default::default()
        };

        let mut batch = BatchProcessor::new(generator, Lexicon::default(), quick_config());
        batch.add_file(path);
        batch.run().await;
        let jobs = batch.jobs();

        match &jobs[0].status {
            FileStatus::Failed { message } => {
                assert!(message.starts_with("Failed to create any personas"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(jobs[0].errors.len(), 2);
    }

    #[tokio::test]
    async fn test_parse_errors_do_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_file(&dir, "empty.txt", "\n\n");
        let unsupported = write_file(&dir, "slides.pdf", "%PDF");
        let good = write_file(&dir, "good.txt", "hello there");

        let mut batch = BatchProcessor::new(FakeGenerator::default(), Lexicon::default(), quick_config());
        batch.add_file(empty);
        batch.add_file(unsupported);
        batch.add_file(good);
        batch.run().await;
        let jobs = batch.jobs();

        assert!(jobs[0].message.starts_with("error: No valid transcripts found"));
        assert!(jobs[0].results.is_empty());
        assert!(jobs[1].message.starts_with("error: Unsupported file type"));
        assert_eq!(jobs[2].status, FileStatus::Completed);
        assert_eq!(batch.generator.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rerun_skips_settled_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "good.txt", "R: yes");
        let missing = dir.path().join("later.txt");

        let mut batch = BatchProcessor::new(FakeGenerator::default(), Lexicon::default(), quick_config());
        batch.add_file(good);
        batch.add_file(missing.clone());
        let first = batch.run().await;
        assert_eq!(first.failed, 1);
        assert!(matches!(batch.jobs()[1].status, FileStatus::Failed { .. }));

        std::fs::write(&missing, "R: now it exists").unwrap();
        let second = batch.run().await;
        assert_eq!(second.skipped, 1);
        assert_eq!(second.completed, 1);

        let jobs = batch.jobs();

        assert_eq!(jobs[0].status, FileStatus::Completed);
        assert_eq!(jobs[1].status, FileStatus::Completed);
        assert_eq!(batch.generator.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_settle_status() {
        assert_eq!(settle_status(2, 2, &[]), FileStatus::Completed);
        // a discarded candidate still counts toward the total
        assert_eq!(
            settle_status(1, 2, &[]),
            FileStatus::PartiallyCompleted {
                succeeded: 1,
                total: 2
            }
        );
        assert_eq!(
            settle_status(0, 1, &["Agent 1: timeout".to_string()]),
            FileStatus::Failed {
                message: "Failed to create any personas: Agent 1: timeout".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_pacer_spaces_calls() {
        let mut pacer = Pacer::new(Duration::from_millis(30));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(30));
        pacer.done();
        pacer.wait().await;
        pacer.done();
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_submission_pause_follows_slow_request() {
        let generator = FakeGenerator {
            latency: Duration::from_millis(60),
            ..Default::default()
        };
        let source = RawSource::new("a.txt", b"R: hi".to_vec());
        let record = parse_source(&source, &Lexicon::default()).unwrap().records.remove(0);

        let mut pacer = Pacer::new(Duration::from_millis(50));
        let outcome = submit_records(
            &generator,
            vec![record.clone(), record],
            &Demographics::default(),
            &mut pacer,
        )
        .await;

        assert_eq!(outcome.succeeded(), 2);
        let started = generator.started.lock().unwrap();
        // 60ms request plus the full 50ms pause
        assert!(started[1] - started[0] >= Duration::from_millis(110));
    }

    #[tokio::test]
    async fn test_file_pause_follows_slow_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_file(&dir, "first.txt", "R: one");
        let second = write_file(&dir, "second.txt", "R: two");
        let generator = FakeGenerator {
            latency: Duration::from_millis(60),
            ..Default::default()
        };
        let config = SubmissionConfig {
            file_delay: Duration::from_millis(50),
            ..quick_config()
        };

        let mut batch = BatchProcessor::new(generator, Lexicon::default(), config);
        batch.add_file(first);
        batch.add_file(second);
        let summary = batch.run().await;

        assert_eq!(summary.completed, 2);
        let started = batch.generator.started.lock().unwrap();
        assert!(started[1] - started[0] >= Duration::from_millis(110));
    }
}
