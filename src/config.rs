//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.profeval.toml` files.

use crate::analysis::wordfreq::DEFAULT_EXCLUDED_WORDS;
use crate::cli::{Args, OutputFormat};
use crate::report::charts::parse_color;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".profeval.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Word cloud rendering settings.
    #[serde(default)]
    pub wordcloud: WordCloudConfig,

    /// Bar chart rendering settings.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "professor_report.md".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory chart files are written to.
    #[serde(default = "default_charts_dir")]
    pub charts_dir: String,

    /// Write chart files next to the report.
    #[serde(default = "default_true")]
    pub include_charts: bool,

    /// Words left out of the word cloud in addition to common stopwords.
    #[serde(default = "default_excluded_words")]
    pub excluded_words: Vec<String>,

    /// Maximum number of words in the word cloud.
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Count two-word phrases that usually occur together as one entry.
    #[serde(default = "default_true")]
    pub collocations: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            charts_dir: default_charts_dir(),
            include_charts: true,
            excluded_words: default_excluded_words(),
            max_words: default_max_words(),
            collocations: true,
        }
    }
}

fn default_charts_dir() -> String {
    "charts".to_string()
}

fn default_true() -> bool {
    true
}

fn default_excluded_words() -> Vec<String> {
    DEFAULT_EXCLUDED_WORDS
        .iter()
        .map(|w| w.to_string())
        .collect()
}

fn default_max_words() -> usize {
    200
}

/// Word cloud image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCloudConfig {
    #[serde(default = "default_cloud_width")]
    pub width: u32,

    #[serde(default = "default_cloud_height")]
    pub height: u32,

    /// `#rrggbb`, `white` or `black`.
    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_min_font_size")]
    pub min_font_size: u32,

    #[serde(default = "default_max_font_size")]
    pub max_font_size: u32,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            width: default_cloud_width(),
            height: default_cloud_height(),
            background: default_background(),
            min_font_size: default_min_font_size(),
            max_font_size: default_max_font_size(),
        }
    }
}

fn default_cloud_width() -> u32 {
    800
}

fn default_cloud_height() -> u32 {
    400
}

fn default_background() -> String {
    "white".to_string()
}

fn default_min_font_size() -> u32 {
    10
}

fn default_max_font_size() -> u32 {
    80
}

/// Average ratings bar chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: u32,

    #[serde(default = "default_chart_height")]
    pub height: u32,

    #[serde(default = "default_bar_color")]
    pub bar_color: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
            bar_color: default_bar_color(),
        }
    }
}

fn default_chart_width() -> u32 {
    640
}

fn default_chart_height() -> u32 {
    400
}

fn default_bar_color() -> String {
    "#1f77b4".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject values no report could be rendered with.
    pub fn validate(&self) -> Result<()> {
        if self.report.max_words == 0 {
            anyhow::bail!("report.max_words must be at least 1");
        }
        if self.wordcloud.width == 0 || self.wordcloud.height == 0 {
            anyhow::bail!("wordcloud width and height must be positive");
        }
        if self.wordcloud.min_font_size == 0
            || self.wordcloud.min_font_size > self.wordcloud.max_font_size
        {
            anyhow::bail!("wordcloud font sizes must satisfy 0 < min_font_size <= max_font_size");
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            anyhow::bail!("chart width and height must be positive");
        }
        if parse_color(&self.chart.bar_color).is_none() {
            anyhow::bail!("chart.bar_color '{}' is not a #rrggbb color", self.chart.bar_color);
        }
        if parse_color(&self.wordcloud.background).is_none() {
            anyhow::bail!(
                "wordcloud.background '{}' is not a #rrggbb color, white or black",
                self.wordcloud.background
            );
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        } else if args.format != OutputFormat::Markdown {
            // Configured path, with the extension of the chosen format
            self.general.output = Path::new(&self.general.output)
                .with_extension(args.format.extension())
                .display()
                .to_string();
        }

        if let Some(ref charts_dir) = args.charts_dir {
            self.report.charts_dir = charts_dir.display().to_string();
        }

        if args.no_charts {
            self.report.include_charts = false;
        }

        // Extra exclusions add to the configured list
        if let Some(ref exclude) = args.exclude {
            self.report.excluded_words.extend(exclude.iter().cloned());
        }

        if let Some(max_words) = args.max_words {
            self.report.max_words = max_words;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
