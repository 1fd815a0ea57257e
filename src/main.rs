use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use persona_transcripts::{
    analyze_language_style, apply_respondent_filter, extract_key_topics, load_source,
    parse_source, render_payload_csv, BatchProcessor, BatchReport, Demographics, Lexicon,
    PersonaApiClient, PersonaApiConfig, SubmissionConfig,
};
use persona_transcripts::models::PersonaPayload;

#[derive(Parser)]
#[command(name = "persona-transcripts")]
#[command(author, version, about = "Turn interview transcripts into persona submissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse transcript files and submit each transcript to the persona service
    Process {
        /// Transcript files (.txt, .csv or .xlsx), processed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Persona service base URL (overrides PERSONA_API_URL)
        #[arg(long)]
        api_url: Option<String>,

        /// Default age for generated personas
        #[arg(long)]
        age: Option<String>,

        /// Default gender for generated personas
        #[arg(long)]
        gender: Option<String>,

        /// Default occupation (sent as the persona role)
        #[arg(long)]
        occupation: Option<String>,

        /// Default location for generated personas
        #[arg(long)]
        location: Option<String>,

        /// Default company for generated personas
        #[arg(long)]
        company: Option<String>,

        /// Pause between submissions within a file, in milliseconds
        #[arg(long, default_value = "500")]
        submission_delay_ms: u64,

        /// Pause between files, in milliseconds
        #[arg(long, default_value = "1000")]
        file_delay_ms: u64,

        /// JSON file overriding keyword tables
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Write a JSON report of the batch
        #[arg(long)]
        report: Option<PathBuf>,

        /// Parse and print payloads without submitting
        #[arg(long)]
        dry_run: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse a transcript and print its structure and language profile
    Analyze {
        /// Transcript file (.txt, .csv or .xlsx)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file overriding keyword tables
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Print parsed records as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            files,
            api_url,
            age,
            gender,
            occupation,
            location,
            company,
            submission_delay_ms,
            file_delay_ms,
            lexicon,
            report,
            dry_run,
            verbose,
        } => {
            setup_logging(verbose);
            let lexicon = load_lexicon(lexicon.as_deref())?;
            let config = SubmissionConfig {
                submission_delay: Duration::from_millis(submission_delay_ms),
                file_delay: Duration::from_millis(file_delay_ms),
                demographics: Demographics {
                    age,
                    gender,
                    occupation,
                    location,
                    company,
                },
            };

            if dry_run {
                dry_run_files(&files, &lexicon, &config.demographics).await
            } else {
                process_files(files, api_url, lexicon, config, report).await
            }
        }
        Commands::Analyze {
            input,
            lexicon,
            json,
            verbose,
        } => {
            setup_logging(verbose);
            let lexicon = load_lexicon(lexicon.as_deref())?;
            analyze_file(&input, &lexicon, json).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_lexicon(path: Option<&Path>) -> Result<Lexicon> {
    match path {
        Some(path) => {
            info!("Loading lexicon from {:?}", path);
            Lexicon::from_json_file(path)
        }
        None => Ok(Lexicon::default()),
    }
}

async fn process_files(
    files: Vec<PathBuf>,
    api_url: Option<String>,
    lexicon: Lexicon,
    config: SubmissionConfig,
    report: Option<PathBuf>,
) -> Result<()> {
    let api_config = match api_url {
        Some(url) => PersonaApiConfig::new(url, std::env::var("PERSONA_API_TOKEN").ok()),
        None => PersonaApiConfig::from_env()?,
    };
    info!("Submitting to {}", api_config.upload_url());

    let mut batch = BatchProcessor::new(PersonaApiClient::new(api_config), lexicon, config);
    for file in files {
        batch.add_file(file);
    }

    let summary = batch.run().await;

    for job in batch.jobs() {
        println!("{}: {}", job.name, job.message);
        for error in &job.errors {
            println!("  {}", error);
        }
        if job.discarded_candidates > 0 {
            println!(
                "  {} of {} transcript candidate(s) had no usable turns",
                job.discarded_candidates, job.candidate_count
            );
        }
    }

    if let Some(path) = report {
        BatchReport::from_jobs(batch.jobs())
            .write_json(&path)
            .context("Failed to write batch report")?;
        info!("Report written to {:?}", path);
    }

    info!(
        "Complete: {} completed, {} partially completed, {} failed",
        summary.completed, summary.partially_completed, summary.failed
    );

    Ok(())
}

async fn dry_run_files(files: &[PathBuf], lexicon: &Lexicon, demographics: &Demographics) -> Result<()> {
    for file in files {
        let source = load_source(file).await?;
        let parsed = match parse_source(&source, lexicon) {
            Ok(parsed) => parsed,
            Err(e) => {
                println!("{}: error: {}", source.name, e);
                continue;
            }
        };

        for (index, record) in parsed.records.into_iter().enumerate() {
            let record = apply_respondent_filter(record, lexicon);
            let payload = PersonaPayload::from_record(&record, index, demographics);
            println!("# {} ({} turns)", record.metadata.filename, record.metadata.total_turns);
            println!("{}", render_payload_csv(&payload)?);
            println!();
        }
    }

    Ok(())
}

async fn analyze_file(input: &Path, lexicon: &Lexicon, json: bool) -> Result<()> {
    info!("Analyzing transcript from {:?}", input);
    let source = load_source(input).await?;
    let parsed = parse_source(&source, lexicon).context("Failed to parse transcript")?;

    if json {
        let records: Vec<_> = parsed
            .records
            .into_iter()
            .map(|r| apply_respondent_filter(r, lexicon))
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("Transcript Analysis");
    println!("===================");
    println!("Candidates: {}", parsed.candidate_count);
    println!("Discarded: {}", parsed.discarded_candidates);

    for record in &parsed.records {
        let meta = &record.metadata;
        println!();
        println!("{}", meta.filename);
        println!("{}", "-".repeat(meta.filename.len()));
        println!("Format: {:?}", meta.format);
        println!("Turns: {}", meta.total_turns);
        println!("Estimated duration: {}", meta.estimated_duration);
        println!("Speakers: {}", meta.speakers.join(", "));

        let style = analyze_language_style(&record.speaker_turns, lexicon);
        println!(
            "Avg words/turn: {:.1}, formality: {:?}, questions: {:.0}%, hesitation: {:.0}%",
            style.average_sentence_length,
            style.formality_level,
            style.question_frequency * 100.0,
            style.hesitation_frequency * 100.0
        );
        println!(
            "Vocabulary: {} words, type-token ratio {:.2}, avg length {:.1}",
            style.vocabulary_complexity.vocabulary_size,
            style.vocabulary_complexity.unique_word_ratio,
            style.vocabulary_complexity.average_word_length
        );

        let phrases: Vec<String> = style
            .common_phrases
            .iter()
            .take(5)
            .map(|p| format!("\"{}\" x{}", p.phrase, p.count))
            .collect();
        if !phrases.is_empty() {
            println!("Common phrases: {}", phrases.join(", "));
        }

        let topics: Vec<String> = extract_key_topics(&record.speaker_turns, lexicon)
            .iter()
            .map(|t| format!("{} ({})", t.topic, t.mentions))
            .collect();
        if !topics.is_empty() {
            println!("Topics: {}", topics.join(", "));
        }

        if record.is_moderator_respondent() {
            let filtered = apply_respondent_filter(record.clone(), lexicon);
            println!("Respondent turns: {}", filtered.metadata.total_turns);
        }
    }

    Ok(())
}
