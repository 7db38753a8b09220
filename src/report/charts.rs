//! Chart rendering.
//!
//! Produces the visual parts of the evaluation report: an SVG bar chart of
//! average ratings, an SVG word cloud of the written feedback, and a
//! Vega-Lite specification of the same averages for declarative chart
//! tooling.

use crate::analysis::IMPROVEMENT_THRESHOLD;
use crate::config::{ChartConfig, Config, WordCloudConfig};
use crate::models::{AggregateReport, Category, Professor, Rating, WordFrequency};
use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const BAR_CHART_FILE: &str = "ratings_bar.svg";
pub const WORD_CLOUD_FILE: &str = "wordcloud.svg";
pub const PERFORMANCE_SPEC_FILE: &str = "performance.vl.json";

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

const FONT: &str = "sans-serif";

/// Word colors, cycled by rank.
const PALETTE: [RGBColor; 8] = [
    RGBColor(0x44, 0x01, 0x54),
    RGBColor(0x3b, 0x52, 0x8b),
    RGBColor(0x21, 0x91, 0x8c),
    RGBColor(0x5e, 0xc9, 0x62),
    RGBColor(0xfd, 0xe7, 0x25),
    RGBColor(0x31, 0x68, 0x8e),
    RGBColor(0x35, 0xb7, 0x79),
    RGBColor(0x90, 0xd7, 0x43),
];

const DEFAULT_BAR_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);

/// Approximate glyph width as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.6;

/// Chart files written for a report. Missing entries were skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartAssets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_chart: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_cloud: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_spec: Option<PathBuf>,
}

/// Write every chart the report has data for into the configured directory.
pub fn write_chart_assets(report: &AggregateReport, config: &Config) -> Result<ChartAssets> {
    let dir = Path::new(&config.report.charts_dir);
    let mut assets = ChartAssets::default();

    if report.means.is_empty() && report.word_frequencies.is_empty() {
        debug!("No chart data for {}", report.professor);
        return Ok(assets);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create charts directory: {}", dir.display()))?;

    if !report.means.is_empty() {
        let title = format!(
            "Average Ratings Across Categories for {}",
            report.professor
        );
        let svg = render_bar_chart(&title, &report.means, &config.chart)?;
        assets.bar_chart = Some(write_asset(dir, BAR_CHART_FILE, &svg)?);

        let spec = performance_spec(report.professor, &report.means);
        let content = serde_json::to_string_pretty(&spec)?;
        assets.performance_spec = Some(write_asset(dir, PERFORMANCE_SPEC_FILE, &content)?);
    }

    if !report.word_frequencies.is_empty() {
        let svg = render_word_cloud(&report.word_frequencies, &config.wordcloud)?;
        assets.word_cloud = Some(write_asset(dir, WORD_CLOUD_FILE, &svg)?);
    }

    info!("Charts written to {}", dir.display());
    Ok(assets)
}

fn write_asset(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write chart: {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(path)
}

/// Parse a `#rrggbb` hex color or one of the names `white` and `black`.
pub fn parse_color(value: &str) -> Option<RGBColor> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "white" => return Some(WHITE),
        "black" => return Some(BLACK),
        _ => {}
    }

    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Render average ratings as an SVG bar chart on a fixed 0-5 scale.
///
/// A red line marks the improvement threshold.
pub fn render_bar_chart(
    title: &str,
    means: &BTreeMap<Category, f64>,
    style: &ChartConfig,
) -> Result<String> {
    let bar_color = parse_color(&style.bar_color).unwrap_or(DEFAULT_BAR_COLOR);
    let labels: Vec<&str> = means.keys().map(|c| c.column()).collect();
    let last = labels.len().saturating_sub(1) as u32;
    let value_style =
        TextStyle::from((FONT, 12.0).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 18))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d((0u32..last).into_segmented(), 0f64..f64::from(Rating::MAX))?;

        let category_label = |value: &SegmentValue<u32>| match value {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => labels
                .get(*i as usize)
                .map(|label| label.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&category_label)
            .y_labels(usize::from(Rating::MAX) + 1)
            .y_desc("Average Rating")
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(bar_color.filled())
                .margin(16)
                .data(means.values().enumerate().map(|(i, mean)| (i as u32, *mean))),
        )?;

        chart.draw_series(means.values().enumerate().map(|(i, mean)| {
            Text::new(
                format!("{mean:.2}"),
                (SegmentValue::CenterOf(i as u32), *mean),
                value_style.clone(),
            )
        }))?;

        chart.draw_series(LineSeries::new(
            [
                (SegmentValue::Exact(0), IMPROVEMENT_THRESHOLD),
                (SegmentValue::Last, IMPROVEMENT_THRESHOLD),
            ],
            RED.stroke_width(2),
        ))?;

        root.present()?;
    }

    Ok(svg)
}

/// Lay words out in rows, largest first, font size scaled by weight.
///
/// Words that no longer fit below the last row are dropped.
pub fn render_word_cloud(words: &[WordFrequency], style: &WordCloudConfig) -> Result<String> {
    let background = parse_color(&style.background).unwrap_or(WHITE);
    let width = f64::from(style.width);
    let height = f64::from(style.height);
    let min_font = f64::from(style.min_font_size);
    let max_font = f64::from(style.max_font_size.max(style.min_font_size));
    let padding = 10.0;
    let gap = 8.0;

    let mut svg = String::new();
    let mut placed = 0usize;
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&background)?;

        let (mut x, mut y, mut row_height) = (padding, padding, 0.0_f64);

        for (rank, word) in words.iter().enumerate() {
            let chars = word.word.chars().count().max(1) as f64;
            let mut font = min_font + (max_font - min_font) * word.weight.clamp(0.0, 1.0);

            // Shrink words wider than the canvas
            let available = width - 2.0 * padding;
            if font * GLYPH_WIDTH * chars > available {
                font = (available / (GLYPH_WIDTH * chars)).max(1.0);
            }
            let word_w = font * GLYPH_WIDTH * chars;

            if x + word_w > width - padding {
                x = padding;
                y += row_height + gap;
                row_height = 0.0;
            }
            if y + font > height - padding {
                break;
            }

            let color = PALETTE[rank % PALETTE.len()];
            root.draw(&Text::new(
                word.word.as_str(),
                (x.round() as i32, y.round() as i32),
                (FONT, font).into_font().color(&color),
            ))?;

            x += word_w + gap;
            row_height = row_height.max(font);
            placed += 1;
        }

        root.present()?;
    }

    debug!("Word cloud placed {} of {} words", placed, words.len());
    Ok(svg)
}

/// Vega-Lite bar chart of the means, one colored bar per criterion.
pub fn performance_spec(professor: Professor, means: &BTreeMap<Category, f64>) -> Value {
    let values: Vec<Value> = means
        .iter()
        .map(|(category, score)| json!({ "Criteria": category.column(), "Score": score }))
        .collect();

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": format!("{}'s Teaching Performance", professor),
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": { "field": "Criteria", "type": "nominal" },
            "y": { "field": "Score", "type": "quantitative" },
            "color": { "field": "Criteria", "type": "nominal" }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn sample_means() -> BTreeMap<Category, f64> {
        Category::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, 1.0 + i as f64))
            .collect()
    }

    fn word(word: &str, count: usize, weight: f64) -> WordFrequency {
        WordFrequency {
            word: word.to_string(),
            count,
            weight,
        }
    }

    fn sample_report(means: BTreeMap<Category, f64>, words: Vec<WordFrequency>) -> AggregateReport {
        AggregateReport {
            professor: Professor::B,
            generated_at: Utc::now(),
            record_count: if means.is_empty() { 0 } else { 2 },
            means,
            needs_improvement: BTreeSet::new(),
            sentiment: None,
            word_frequencies: words,
        }
    }

    #[test]
    fn test_bar_chart_has_one_bar_per_category() {
        let svg = render_bar_chart("Ratings", &sample_means(), &ChartConfig::default()).unwrap();
        let upper = svg.to_uppercase();

        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(upper.matches("#1F77B4").count() >= 5);
        assert!(svg.contains("Course Structure"));
        assert!(svg.contains("Average Rating"));
        assert!(svg.contains("5.00"));
        // threshold line
        assert!(upper.contains("#FF0000"));
    }

    #[test]
    fn test_bar_chart_uses_configured_color() {
        let style = ChartConfig {
            bar_color: "#ff8800".to_string(),
            ..ChartConfig::default()
        };
        let svg = render_bar_chart("Ratings", &sample_means(), &style).unwrap();
        assert!(svg.to_uppercase().matches("#FF8800").count() >= 5);
    }

    #[test]
    fn test_word_cloud_places_words() {
        let words = vec![word("clear", 4, 1.0), word("kind", 2, 0.5), word("office hours", 1, 0.25)];
        let svg = render_word_cloud(&words, &WordCloudConfig::default()).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.to_uppercase().contains("#FFFFFF"));
        assert!(svg.contains("clear"));
        assert!(svg.contains("kind"));
        assert!(svg.contains("office hours"));
        assert_eq!(svg.matches("<text").count(), 3);
    }

    #[test]
    fn test_word_cloud_drops_overflow() {
        let style = WordCloudConfig {
            width: 100,
            height: 40,
            ..WordCloudConfig::default()
        };
        let words: Vec<WordFrequency> = (0..50).map(|i| word(&format!("w{i}"), 1, 1.0)).collect();
        let svg = render_word_cloud(&words, &style).unwrap();

        assert!(svg.matches("<text").count() < 50);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#1f77b4").map(|c| c.rgb()), Some((0x1f, 0x77, 0xb4)));
        assert_eq!(parse_color(" White ").map(|c| c.rgb()), Some((255, 255, 255)));
        assert_eq!(parse_color("black").map(|c| c.rgb()), Some((0, 0, 0)));
        assert!(parse_color("1f77b4").is_none());
        assert!(parse_color("#12345").is_none());
        assert!(parse_color("#zzzzzz").is_none());
        assert!(parse_color("rebeccapurple").is_none());
    }

    #[test]
    fn test_performance_spec() {
        let spec = performance_spec(Professor::A, &sample_means());

        assert_eq!(spec["mark"], "bar");
        assert_eq!(spec["title"], "Prof. A's Teaching Performance");
        assert_eq!(spec["encoding"]["color"]["field"], "Criteria");
        assert_eq!(spec["data"]["values"].as_array().map(|v| v.len()), Some(5));
        assert_eq!(spec["data"]["values"][2]["Criteria"], "Course Structure");
        assert_eq!(spec["data"]["values"][2]["Score"], 3.0);
    }

    #[test]
    fn test_write_chart_assets() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.report.charts_dir = dir.path().join("charts").display().to_string();

        let report = sample_report(sample_means(), vec![word("clear", 1, 1.0)]);
        let assets = write_chart_assets(&report, &config).unwrap();

        for path in [&assets.bar_chart, &assets.word_cloud, &assets.performance_spec] {
            let path = path.as_ref().expect("asset should be written");
            assert!(path.exists());
        }
    }

    #[test]
    fn test_no_assets_without_data() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.report.charts_dir = dir.path().join("charts").display().to_string();

        let assets = write_chart_assets(&sample_report(BTreeMap::new(), Vec::new()), &config).unwrap();

        assert!(assets.bar_chart.is_none());
        assert!(assets.word_cloud.is_none());
        assert!(!dir.path().join("charts").exists());
    }
}
