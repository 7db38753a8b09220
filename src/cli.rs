//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values. The arguments stand in for
//! the feedback form: a professor selector, five rating sliders, a free
//! text box and a submit button.

use crate::models::{FeedbackRecord, Professor, Rating};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// ProfEval - professor performance evaluation system
///
/// Collect feedback for a professor and generate an evaluation report with
/// average ratings, areas for improvement, sentiment and a word cloud.
/// Feedback is stored in professor_feedback.csv in the current directory.
///
/// Examples:
///   profeval --professor "Prof. A"
///   profeval -p B --clarity 4 --engagement 5 --feedback "Great examples" --submit
///   profeval -p C --format json --output prof_c.json
///   profeval --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Professor to rate and report on (A, B, C or "Prof. A")
    #[arg(short, long, default_value = "Prof. A", value_name = "PROFESSOR")]
    pub professor: Professor,

    /// Clarity of explanations (1-5)
    #[arg(long, default_value_t = Rating::DEFAULT, value_parser = rating_parser())]
    pub clarity: u8,

    /// Student engagement (1-5)
    #[arg(long, default_value_t = Rating::DEFAULT, value_parser = rating_parser())]
    pub engagement: u8,

    /// Course structure (1-5)
    #[arg(long, default_value_t = Rating::DEFAULT, value_parser = rating_parser())]
    pub course_structure: u8,

    /// Responsiveness to questions (1-5)
    #[arg(long, default_value_t = Rating::DEFAULT, value_parser = rating_parser())]
    pub responsiveness: u8,

    /// Overall effectiveness (1-5)
    #[arg(long, default_value_t = Rating::DEFAULT, value_parser = rating_parser())]
    pub overall_effectiveness: u8,

    /// Open-ended feedback (optional)
    #[arg(short, long, value_name = "TEXT")]
    pub feedback: Option<String>,

    /// Submit the ratings and feedback before generating the report
    ///
    /// Without this flag the ratings are ignored and only the report is
    /// generated from the feedback already on file.
    #[arg(short, long)]
    pub submit: bool,

    /// Output file path for the report
    ///
    /// Default: from config or professor_report.md (.json with --format json)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Directory for chart files (bar chart, word cloud, chart spec)
    #[arg(long, value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Skip writing chart files
    #[arg(long)]
    pub no_charts: bool,

    /// Additional words to leave out of the word cloud (comma-separated)
    ///
    /// Example: --exclude lecture,lectures
    #[arg(long, value_name = "WORDS", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Maximum number of words in the word cloud
    #[arg(long, value_name = "COUNT")]
    pub max_words: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .profeval.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .profeval.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension of reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

fn rating_parser() -> clap::builder::RangedI64ValueParser<u8> {
    clap::value_parser!(u8).range(i64::from(Rating::MIN)..=i64::from(Rating::MAX))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.no_charts && self.charts_dir.is_some() {
            return Err("Cannot use both --no-charts and --charts-dir".to_string());
        }

        if self.max_words == Some(0) {
            return Err("Max words must be at least 1".to_string());
        }

        // Validate output path if provided
        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!(
                    "Output path is a directory: {}",
                    output.display()
                ));
            }
        }

        if let Some(ref exclude) = self.exclude {
            if exclude.iter().all(|w| w.trim().is_empty()) {
                return Err("--exclude needs at least one word".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Build the feedback record described by the form arguments.
    pub fn feedback_record(&self) -> Result<FeedbackRecord> {
        Ok(FeedbackRecord::new(
            self.professor,
            Rating::new(self.clarity)?,
            Rating::new(self.engagement)?,
            Rating::new(self.course_structure)?,
            Rating::new(self.responsiveness)?,
            Rating::new(self.overall_effectiveness)?,
            self.feedback.clone(),
        ))
    }
}
