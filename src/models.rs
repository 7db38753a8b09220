//! Data models for professor feedback.
//!
//! This module contains the core data structures used throughout the
//! application: the submitted feedback record, its typed fields, and the
//! aggregate report derived from a set of records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Column headers of the persisted feedback table, in file order.
pub const COLUMNS: [&str; 7] = [
    "Professor",
    "Clarity",
    "Engagement",
    "Course Structure",
    "Responsiveness",
    "Overall Effectiveness",
    "Feedback Text",
];

/// Position of a record in the feedback table (zero-based row index).
pub type RecordId = usize;

/// Professor being evaluated.
///
/// Stored in the dataset by its short code (`A`), displayed with its
/// full label (`Prof. A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Professor {
    A,
    B,
    C,
}

impl Professor {
    /// Short code written to the dataset.
    pub fn code(&self) -> &'static str {
        match self {
            Professor::A => "A",
            Professor::B => "B",
            Professor::C => "C",
        }
    }

    /// Display label shown in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Professor::A => "Prof. A",
            Professor::B => "Prof. B",
            Professor::C => "Prof. C",
        }
    }
}

impl fmt::Display for Professor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error returned when a professor name is not one of the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown professor '{0}' (expected one of: Prof. A, Prof. B, Prof. C)")]
pub struct UnknownProfessor(pub String);

impl FromStr for Professor {
    type Err = UnknownProfessor;

    /// Accepts either the label (`Prof. A`) or the code (`A`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The code is the last whitespace-separated token of the label
        let code = s.split_whitespace().last().unwrap_or("");
        match code.to_ascii_uppercase().as_str() {
            "A" => Ok(Professor::A),
            "B" => Ok(Professor::B),
            "C" => Ok(Professor::C),
            _ => Err(UnknownProfessor(s.trim().to_string())),
        }
    }
}

/// Rated aspect of teaching, in dataset column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Clarity,
    Engagement,
    #[serde(rename = "Course Structure")]
    CourseStructure,
    Responsiveness,
    #[serde(rename = "Overall Effectiveness")]
    OverallEffectiveness,
}

impl Category {
    /// All categories, in column order.
    pub const ALL: [Category; 5] = [
        Category::Clarity,
        Category::Engagement,
        Category::CourseStructure,
        Category::Responsiveness,
        Category::OverallEffectiveness,
    ];

    /// Column header used in the dataset and in reports.
    pub fn column(&self) -> &'static str {
        match self {
            Category::Clarity => "Clarity",
            Category::Engagement => "Engagement",
            Category::CourseStructure => "Course Structure",
            Category::Responsiveness => "Responsiveness",
            Category::OverallEffectiveness => "Overall Effectiveness",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    /// Slider position before the user touches it.
    pub const DEFAULT: u8 = 3;

    pub fn new(value: u8) -> Result<Self, RatingOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingOutOfRange(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Error returned when a rating is outside 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rating {0} is out of range (expected 1-5)")]
pub struct RatingOutOfRange(pub u8);

impl TryFrom<u8> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One submitted feedback entry, as stored in the dataset.
///
/// Fields are private so every record, including those read back from the
/// dataset, passes through [`FeedbackRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordRow")]
pub struct FeedbackRecord {
    #[serde(rename = "Professor")]
    professor: Professor,
    #[serde(rename = "Clarity")]
    clarity: Rating,
    #[serde(rename = "Engagement")]
    engagement: Rating,
    #[serde(rename = "Course Structure")]
    course_structure: Rating,
    #[serde(rename = "Responsiveness")]
    responsiveness: Rating,
    #[serde(rename = "Overall Effectiveness")]
    overall_effectiveness: Rating,
    /// Open-ended feedback. `None` when nothing was written.
    #[serde(rename = "Feedback Text")]
    feedback_text: Option<String>,
}

/// A dataset row as read from disk, before normalization.
#[derive(Deserialize)]
struct RecordRow {
    #[serde(rename = "Professor")]
    professor: Professor,
    #[serde(rename = "Clarity")]
    clarity: Rating,
    #[serde(rename = "Engagement")]
    engagement: Rating,
    #[serde(rename = "Course Structure")]
    course_structure: Rating,
    #[serde(rename = "Responsiveness")]
    responsiveness: Rating,
    #[serde(rename = "Overall Effectiveness")]
    overall_effectiveness: Rating,
    #[serde(rename = "Feedback Text")]
    feedback_text: Option<String>,
}

impl From<RecordRow> for FeedbackRecord {
    fn from(row: RecordRow) -> Self {
        FeedbackRecord::new(
            row.professor,
            row.clarity,
            row.engagement,
            row.course_structure,
            row.responsiveness,
            row.overall_effectiveness,
            row.feedback_text,
        )
    }
}

impl FeedbackRecord {
    /// Creates a record, treating blank feedback text as absent.
    pub fn new(
        professor: Professor,
        clarity: Rating,
        engagement: Rating,
        course_structure: Rating,
        responsiveness: Rating,
        overall_effectiveness: Rating,
        feedback_text: Option<String>,
    ) -> Self {
        Self {
            professor,
            clarity,
            engagement,
            course_structure,
            responsiveness,
            overall_effectiveness,
            feedback_text: normalize_feedback_text(feedback_text),
        }
    }

    pub fn professor(&self) -> Professor {
        self.professor
    }

    /// Returns the rating given for a category.
    pub fn rating(&self, category: Category) -> Rating {
        match category {
            Category::Clarity => self.clarity,
            Category::Engagement => self.engagement,
            Category::CourseStructure => self.course_structure,
            Category::Responsiveness => self.responsiveness,
            Category::OverallEffectiveness => self.overall_effectiveness,
        }
    }

    /// Returns the feedback text, if any was written.
    pub fn text(&self) -> Option<&str> {
        self.feedback_text.as_deref()
    }
}

/// Blank or whitespace-only text carries no feedback.
pub fn normalize_feedback_text(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// Sentiment scores of one professor's written feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Polarity per record; `None` for records without text.
    pub scores: BTreeMap<RecordId, Option<f64>>,
    /// Mean polarity over the scored records, in [-1, 1].
    pub mean: f64,
    /// Number of records that contributed to the mean.
    pub scored: usize,
}

/// A word and how often it appears in the feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    /// Count relative to the most frequent word (0, 1].
    pub weight: f64,
}

/// Statistics derived from the feedback table for one professor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub professor: Professor,
    pub generated_at: DateTime<Utc>,
    /// Number of records submitted for this professor.
    pub record_count: usize,
    /// Mean rating per category. Empty when there are no records.
    pub means: BTreeMap<Category, f64>,
    /// Categories whose mean falls below the improvement threshold.
    pub needs_improvement: BTreeSet<Category>,
    /// Absent when no record has feedback text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentSummary>,
    /// Most frequent words of the feedback text, most frequent first.
    pub word_frequencies: Vec<WordFrequency>,
}

impl AggregateReport {
    /// True when no feedback exists for the professor.
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(value: u8) -> Rating {
        Rating::new(value).unwrap()
    }

    #[test]
    fn test_professor_parsing() {
        assert_eq!("Prof. A".parse::<Professor>(), Ok(Professor::A));
        assert_eq!("b".parse::<Professor>(), Ok(Professor::B));
        assert_eq!("  prof. c ".parse::<Professor>(), Ok(Professor::C));
        assert!("Prof. D".parse::<Professor>().is_err());
        assert!("".parse::<Professor>().is_err());
    }

    #[test]
    fn test_professor_code_and_label() {
        assert_eq!(Professor::A.code(), "A");
        assert_eq!(Professor::A.label(), "Prof. A");
        assert_eq!(Professor::C.to_string(), "Prof. C");
    }

    #[test]
    fn test_rating_range() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert_eq!(Rating::new(6), Err(RatingOutOfRange(6)));
        assert_eq!(Rating::default().value(), 3);
    }

    #[test]
    fn test_category_order_matches_columns() {
        let columns: Vec<&str> = Category::ALL.iter().map(|c| c.column()).collect();
        assert_eq!(columns, COLUMNS[1..6].to_vec());
        assert!(Category::Clarity < Category::OverallEffectiveness);
    }

    #[test]
    fn test_blank_feedback_is_absent() {
        let record = FeedbackRecord::new(
            Professor::A,
            rating(2),
            rating(2),
            rating(2),
            rating(2),
            rating(2),
            Some("   ".to_string()),
        );
        assert_eq!(record.text(), None);
    }

    #[test]
    fn test_rating_by_category() {
        let record = FeedbackRecord::new(
            Professor::B,
            rating(1),
            rating(2),
            rating(3),
            rating(4),
            rating(5),
            Some("clear".to_string()),
        );
        let values: Vec<u8> = Category::ALL
            .iter()
            .map(|c| record.rating(*c).value())
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
        assert_eq!(record.text(), Some("clear"));
        assert_eq!(record.professor(), Professor::B);
    }

    #[test]
    fn test_deserialized_blank_text_is_absent() {
        let row = r#"{"Professor":"A","Clarity":4,"Engagement":4,"Course Structure":4,"Responsiveness":4,"Overall Effectiveness":4,"Feedback Text":"  "}"#;
        let record: FeedbackRecord = serde_json::from_str(row).unwrap();

        assert_eq!(record.text(), None);
        assert_eq!(
            record,
            FeedbackRecord::new(Professor::A, rating(4), rating(4), rating(4), rating(4), rating(4), None)
        );
    }
}
