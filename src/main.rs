//! ProfEval - Professor Performance Evaluation System
//!
//! A CLI tool that collects per-professor ratings and written feedback
//! into a CSV dataset and generates evaluation reports with average
//! ratings, areas for improvement, sentiment and a word cloud.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (malformed dataset, config, I/O failure, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod store;

use analysis::{ReportOptions, SentimentAnalyzer};
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::AggregateReport;
use report::ChartAssets;
use std::path::Path;
use store::{FeedbackTable, RecordStore, DATASET_FILE};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("ProfEval v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Evaluation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .profeval.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the report path, charts and excluded words.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one pass: load, optionally submit, aggregate, and render.
fn run(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the dataset
    let store = RecordStore::new(DATASET_FILE);
    let mut table = store
        .load()
        .with_context(|| format!("Failed to load feedback dataset {}", DATASET_FILE))?;
    info!("Loaded {} feedback records", table.len());

    // Step 2: Record the submission
    if args.submit {
        table = submit_feedback(&store, &table, &args)?;
    } else if args.feedback.is_some() {
        warn!("--feedback is ignored without --submit");
    }

    // Step 3: Aggregate for the selected professor
    let options = ReportOptions::from(&config.report);
    let analyzer = SentimentAnalyzer::new();
    let aggregate = analysis::build_report(&table, args.professor, &options, &analyzer);

    // Step 4: Render charts and the report
    let assets = if config.report.include_charts {
        report::write_chart_assets(&aggregate, &config)?
    } else {
        debug!("Chart output disabled");
        ChartAssets::default()
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&aggregate, &assets)?,
        OutputFormat::Markdown => report::generate_markdown_report(&aggregate, &assets),
    };

    let output_path = Path::new(&config.general.output);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        print_summary(&aggregate, &assets);
    }
    println!("\n✅ Report saved to: {}", output_path.display());
    println!(
        "Thank you for your feedback! It will help improve {}'s teaching performance.",
        aggregate.professor
    );

    Ok(())
}

/// Append the form's record and write the dataset back.
fn submit_feedback(store: &RecordStore, table: &FeedbackTable, args: &Args) -> Result<FeedbackTable> {
    let record = args.feedback_record()?;
    let updated = store.append(table, record);

    store
        .persist(&updated)
        .with_context(|| format!("Failed to save feedback to {}", store.path().display()))?;
    info!("Saved {} records to {}", updated.len(), store.path().display());

    println!("✅ Feedback submitted successfully!");
    if !args.quiet {
        println!("\n📋 Updated Feedback Data:");
        print!("{}", report::render_records_table(&updated));
    }

    Ok(updated)
}

/// Print the evaluation summary to the terminal.
fn print_summary(aggregate: &AggregateReport, assets: &ChartAssets) {
    let professor = aggregate.professor;

    println!("\n📊 Quantitative Evaluation for {}", professor);
    if aggregate.is_empty() {
        println!("   No feedback has been submitted for {} yet.", professor);
        return;
    }

    println!("   Feedback entries: {}", aggregate.record_count);
    for line in report::render_means_table(&aggregate.means).lines() {
        println!("   {}", line);
    }

    println!("\n🔧 Areas for Improvement for {}:", professor);
    for line in report::generate_improvement_list(&aggregate.needs_improvement).lines() {
        println!("   {}", line);
    }

    if let Some(ref sentiment) = aggregate.sentiment {
        println!(
            "\n💬 Average Sentiment Score for {}: {}",
            professor,
            report::format_sentiment(sentiment)
        );
        let top: Vec<&str> = aggregate
            .word_frequencies
            .iter()
            .take(5)
            .map(|w| w.word.as_str())
            .collect();
        if !top.is_empty() {
            println!("   Most mentioned: {}", top.join(", "));
        }
    }

    for path in [&assets.bar_chart, &assets.word_cloud, &assets.performance_spec]
        .into_iter()
        .flatten()
    {
        println!("   🖼  {}", path.display());
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
