//! Per-professor feedback aggregation.
//!
//! This module filters the feedback table down to one professor and
//! derives the statistics shown in the evaluation report.

use crate::analysis::sentiment::PolarityScorer;
use crate::analysis::wordfreq::{WordCounter, WordFilter};
use crate::models::{
    AggregateReport, Category, FeedbackRecord, Professor, RecordId, SentimentSummary,
};
use crate::store::FeedbackTable;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Categories with a mean strictly below this need improvement.
pub const IMPROVEMENT_THRESHOLD: f64 = 3.0;

/// Records of one professor, paired with their row ids.
pub type Selection<'a> = Vec<(RecordId, &'a FeedbackRecord)>;

/// Settings for building an aggregate report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Word counting for the word cloud.
    pub words: WordCounter,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            words: WordCounter::default().with_collocations(true),
        }
    }
}

impl From<&crate::config::ReportConfig> for ReportOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        let filter = WordFilter::new(&config.excluded_words);
        Self {
            words: WordCounter::new(filter, config.max_words)
                .with_collocations(config.collocations),
        }
    }
}

/// Select the records submitted for `professor`, in table order.
pub fn select(table: &FeedbackTable, professor: Professor) -> Selection<'_> {
    table
        .iter()
        .filter(|(_, record)| record.professor() == professor)
        .collect()
}

/// Mean rating per category. Empty when `subset` is empty.
pub fn means(subset: &[(RecordId, &FeedbackRecord)]) -> BTreeMap<Category, f64> {
    if subset.is_empty() {
        return BTreeMap::new();
    }

    let count = subset.len() as f64;
    Category::ALL
        .iter()
        .map(|&category| {
            let total: u32 = subset
                .iter()
                .map(|(_, record)| u32::from(record.rating(category).value()))
                .sum();
            (category, f64::from(total) / count)
        })
        .collect()
}

/// Categories whose mean is strictly below `threshold`.
pub fn below_threshold(means: &BTreeMap<Category, f64>, threshold: f64) -> BTreeSet<Category> {
    means
        .iter()
        .filter(|(_, mean)| **mean < threshold)
        .map(|(category, _)| *category)
        .collect()
}

/// Polarity of each record's feedback text; `None` when it has no text.
pub fn sentiment(
    subset: &[(RecordId, &FeedbackRecord)],
    scorer: &impl PolarityScorer,
) -> BTreeMap<RecordId, Option<f64>> {
    subset
        .iter()
        .map(|(id, record)| (*id, record.text().map(|text| scorer.polarity(text))))
        .collect()
}

/// Mean over the scored entries, or `None` if nothing was scored.
pub fn mean_sentiment(scores: &BTreeMap<RecordId, Option<f64>>) -> Option<f64> {
    let scored: Vec<f64> = scores.values().flatten().copied().collect();

    if scored.is_empty() {
        None
    } else {
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    }
}

/// All feedback texts of the subset joined by single spaces.
pub fn feedback_corpus(subset: &[(RecordId, &FeedbackRecord)]) -> String {
    subset
        .iter()
        .filter_map(|(_, record)| record.text())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the complete aggregate report for one professor.
pub fn build_report(
    table: &FeedbackTable,
    professor: Professor,
    options: &ReportOptions,
    scorer: &impl PolarityScorer,
) -> AggregateReport {
    let subset = select(table, professor);
    let means = means(&subset);
    let needs_improvement = below_threshold(&means, IMPROVEMENT_THRESHOLD);

    let scores = sentiment(&subset, scorer);
    let sentiment = mean_sentiment(&scores).map(|mean| SentimentSummary {
        scored: scores.values().filter(|s| s.is_some()).count(),
        scores,
        mean,
    });

    // Word cloud is only drawn alongside the sentiment section
    let word_frequencies = if sentiment.is_some() {
        options.words.count(&feedback_corpus(&subset))
    } else {
        Vec::new()
    };

    debug!(
        "{}: {} records, {} flagged categories, {} distinct words",
        professor,
        subset.len(),
        needs_improvement.len(),
        word_frequencies.len()
    );

    AggregateReport {
        professor,
        generated_at: Utc::now(),
        record_count: subset.len(),
        means,
        needs_improvement,
        sentiment,
        word_frequencies,
    }
}
