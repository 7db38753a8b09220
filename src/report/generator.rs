//! Report generation.
//!
//! This module turns an aggregate report into a Markdown or JSON document
//! and renders the plain-text tables printed to the terminal.

use crate::analysis::IMPROVEMENT_THRESHOLD;
use crate::models::{AggregateReport, Category, SentimentSummary, WordFrequency, COLUMNS};
use crate::report::charts::{performance_spec, ChartAssets};
use crate::store::FeedbackTable;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Number of words listed in the text form of the word cloud.
const TOP_WORDS: usize = 10;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AggregateReport, assets: &ChartAssets) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Professor's Performance Evaluation Report\n\n");

    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_quantitative_section(report, assets));
    output.push_str(&generate_qualitative_section(report, assets));
    output.push_str(&generate_insights_section(report, assets));
    output.push_str(&generate_footer(report));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(report: &AggregateReport) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Professor:** {}\n", report.professor));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Feedback Entries:** {}\n",
        report.record_count
    ));
    if let Some(ref sentiment) = report.sentiment {
        section.push_str(&format!("- **Written Comments:** {}\n", sentiment.scored));
    }
    section.push('\n');

    section
}

/// Generate the ratings overview, bar chart and improvement list.
fn generate_quantitative_section(report: &AggregateReport, assets: &ChartAssets) -> String {
    let professor = report.professor;
    let mut section = String::new();

    section.push_str(&format!("## Quantitative Evaluation for {}\n\n", professor));

    if report.is_empty() {
        section.push_str(&format!(
            "No feedback has been submitted for {} yet.\n\n",
            professor
        ));
        return section;
    }

    section.push_str(&format!(
        "### Average Ratings Overview for {}\n\n",
        professor
    ));
    section.push_str("| Category | Average Rating |\n");
    section.push_str("|:---|:---:|\n");
    for (category, mean) in &report.means {
        section.push_str(&format!("| {} | {:.2} |\n", category, mean));
    }
    section.push('\n');

    if let Some(ref path) = assets.bar_chart {
        section.push_str(&format!(
            "### Average Ratings Bar Chart for {}\n\n",
            professor
        ));
        section.push_str(&image_link(
            &format!("Average Ratings Across Categories for {}", professor),
            path,
        ));
    }

    section.push_str(&format!("### Areas for Improvement for {}:\n\n", professor));
    section.push_str(&generate_improvement_list(&report.needs_improvement));
    section.push('\n');

    section
}

/// Bulleted list of categories below the threshold.
pub fn generate_improvement_list(categories: &BTreeSet<Category>) -> String {
    if categories.is_empty() {
        return format!(
            "All categories average at least {}.\n",
            IMPROVEMENT_THRESHOLD
        );
    }

    categories
        .iter()
        .map(|category| {
            format!(
                "- {}: Needs improvement (average rating < {}).\n",
                category, IMPROVEMENT_THRESHOLD
            )
        })
        .collect()
}

/// Generate the sentiment score and word cloud section.
fn generate_qualitative_section(report: &AggregateReport, assets: &ChartAssets) -> String {
    let professor = report.professor;
    let mut section = String::new();

    section.push_str(&format!("## Qualitative Evaluation for {}\n\n", professor));

    let Some(ref sentiment) = report.sentiment else {
        section.push_str(&format!(
            "No written feedback has been submitted for {} yet.\n\n",
            professor
        ));
        return section;
    };

    section.push_str(&format!(
        "### Average Sentiment Score for {}: {}\n\n",
        professor,
        format_sentiment(sentiment)
    ));

    if report.word_frequencies.is_empty() {
        return section;
    }

    section.push_str(&format!("### Word Cloud for {}'s Feedback\n\n", professor));
    if let Some(ref path) = assets.word_cloud {
        section.push_str(&image_link(&format!("Word cloud for {}", professor), path));
    }
    section.push_str(&generate_word_table(&report.word_frequencies));

    section
}

/// Mean sentiment with two decimals and the scale it is measured on.
pub fn format_sentiment(sentiment: &SentimentSummary) -> String {
    format!("{:.2} (Range: -1 to 1)", sentiment.mean)
}

fn generate_word_table(words: &[WordFrequency]) -> String {
    let mut table = String::new();

    table.push_str("| Word | Mentions |\n");
    table.push_str("|:---|:---:|\n");
    for word in words.iter().take(TOP_WORDS) {
        table.push_str(&format!("| {} | {} |\n", word.word, word.count));
    }
    table.push('\n');

    table
}

/// Generate the performance insights section with the chart specification.
fn generate_insights_section(report: &AggregateReport, assets: &ChartAssets) -> String {
    if report.means.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str(&format!(
        "## Performance Insights for {}\n\n",
        report.professor
    ));

    if let Some(ref path) = assets.performance_spec {
        section.push_str(&format!(
            "Vega-Lite chart: [{}]({})\n\n",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            link_target(path)
        ));
    }

    let spec = performance_spec(report.professor, &report.means);
    section.push_str("```json\n");
    section.push_str(&serde_json::to_string_pretty(&spec).unwrap_or_default());
    section.push_str("\n```\n\n");

    section
}

/// Generate the report footer.
fn generate_footer(report: &AggregateReport) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Thank you for your feedback! It will help improve {}'s teaching performance.*\n",
        report.professor
    ));

    footer
}

fn image_link(alt: &str, path: &Path) -> String {
    format!("![{}]({})\n\n", alt, link_target(path))
}

fn link_target(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a AggregateReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    performance_chart: Option<Value>,
    charts: &'a ChartAssets,
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AggregateReport, assets: &ChartAssets) -> Result<String> {
    let document = JsonReport {
        report,
        performance_chart: (!report.means.is_empty())
            .then(|| performance_spec(report.professor, &report.means)),
        charts: assets,
    };
    serde_json::to_string_pretty(&document).map_err(Into::into)
}

/// Category means as an aligned two-column table.
pub fn render_means_table(means: &BTreeMap<Category, f64>) -> String {
    let width = Category::ALL
        .iter()
        .map(|c| c.column().len())
        .max()
        .unwrap_or(0);

    means
        .iter()
        .map(|(category, mean)| format!("{:<width$}  {:.2}\n", category.column(), mean))
        .collect()
}

/// The whole feedback table, one aligned row per record.
pub fn render_records_table(table: &FeedbackTable) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(table.len() + 1);

    let mut header = vec![String::new()];
    header.extend(COLUMNS.iter().map(|c| c.to_string()));
    rows.push(header);

    for (id, record) in table.iter() {
        let mut row = vec![id.to_string(), record.professor().code().to_string()];
        row.extend(
            Category::ALL
                .iter()
                .map(|c| record.rating(*c).to_string()),
        );
        row.push(
            record
                .text()
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default(),
        );
        rows.push(row);
    }

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|i| rows.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
        .collect();

    let mut output = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        output.push_str(line.join("  ").trim_end());
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedbackRecord, Professor, Rating};
    use chrono::Utc;
    use std::path::PathBuf;

    fn flagged_report() -> AggregateReport {
        AggregateReport {
            professor: Professor::A,
            generated_at: Utc::now(),
            record_count: 1,
            means: Category::ALL.iter().map(|c| (*c, 2.0)).collect(),
            needs_improvement: Category::ALL.iter().copied().collect(),
            sentiment: None,
            word_frequencies: Vec::new(),
        }
    }

    fn commented_report() -> AggregateReport {
        AggregateReport {
            professor: Professor::B,
            generated_at: Utc::now(),
            record_count: 2,
            means: Category::ALL.iter().map(|c| (*c, 3.0)).collect(),
            needs_improvement: BTreeSet::new(),
            sentiment: Some(SentimentSummary {
                scores: BTreeMap::from([(0, Some(0.6)), (1, None)]),
                mean: 0.6,
                scored: 1,
            }),
            word_frequencies: vec![WordFrequency {
                word: "explanations".to_string(),
                count: 1,
                weight: 1.0,
            }],
        }
    }

    fn empty_report() -> AggregateReport {
        AggregateReport {
            professor: Professor::C,
            generated_at: Utc::now(),
            record_count: 0,
            means: BTreeMap::new(),
            needs_improvement: BTreeSet::new(),
            sentiment: None,
            word_frequencies: Vec::new(),
        }
    }

    #[test]
    fn test_flagged_report_lists_every_category() {
        let markdown = generate_markdown_report(&flagged_report(), &ChartAssets::default());

        assert!(markdown.contains("## Quantitative Evaluation for Prof. A"));
        assert!(markdown.contains("| Clarity | 2.00 |"));
        assert!(markdown.contains("- Overall Effectiveness: Needs improvement (average rating < 3)."));
        assert_eq!(markdown.matches("Needs improvement").count(), 5);
        assert!(!markdown.contains("Average Sentiment Score"));
        assert!(!markdown.contains("Word Cloud"));
        assert!(markdown.contains("improve Prof. A's teaching performance"));
    }

    #[test]
    fn test_commented_report_shows_sentiment_and_words() {
        let assets = ChartAssets {
            bar_chart: Some(PathBuf::from("charts/ratings_bar.svg")),
            word_cloud: Some(PathBuf::from("charts/wordcloud.svg")),
            performance_spec: Some(PathBuf::from("charts/performance.vl.json")),
        };
        let markdown = generate_markdown_report(&commented_report(), &assets);

        assert!(markdown.contains("Average Sentiment Score for Prof. B: 0.60 (Range: -1 to 1)"));
        assert!(markdown.contains("![Word cloud for Prof. B](charts/wordcloud.svg)"));
        assert!(markdown.contains("(charts/ratings_bar.svg)"));
        assert!(markdown.contains("| explanations | 1 |"));
        assert!(markdown.contains("All categories average at least 3."));
        assert!(markdown.contains("\"Prof. B's Teaching Performance\""));
    }

    #[test]
    fn test_empty_report_skips_sections() {
        let markdown = generate_markdown_report(&empty_report(), &ChartAssets::default());

        assert!(markdown.contains("No feedback has been submitted for Prof. C yet."));
        assert!(!markdown.contains("Average Ratings Overview"));
        assert!(!markdown.contains("Performance Insights"));
        assert!(!markdown.contains("Average Sentiment Score"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&commented_report(), &ChartAssets::default()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["professor"], "B");
        assert_eq!(value["means"]["Course Structure"], 3.0);
        assert_eq!(value["sentiment"]["mean"], 0.6);
        assert_eq!(value["performance_chart"]["mark"], "bar");
    }

    #[test]
    fn test_json_report_without_feedback() {
        let json = generate_json_report(&empty_report(), &ChartAssets::default()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["record_count"], 0);
        assert!(value.get("sentiment").is_none());
        assert!(value.get("performance_chart").is_none());
    }

    #[test]
    fn test_render_means_table() {
        let table = render_means_table(&flagged_report().means);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Clarity "));
        assert!(lines[0].ends_with("2.00"));
    }

    #[test]
    fn test_render_records_table() {
        let r = Rating::new(4).unwrap();
        let table = FeedbackTable::from_records(vec![
            FeedbackRecord::new(Professor::A, r, r, r, r, r, Some("Clear\nand kind".to_string())),
            FeedbackRecord::new(Professor::B, r, r, r, r, r, None),
        ]);

        let rendered = render_records_table(&table);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Course Structure"));
        assert!(lines[1].starts_with("0  A"));
        assert!(lines[1].ends_with("Clear and kind"));
        assert!(lines[2].starts_with("1  B"));
    }
}
