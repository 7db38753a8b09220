//! Analysis modules.
//!
//! Aggregation of ratings, sentiment scoring of written feedback, and
//! word frequency counting.

pub mod aggregator;
pub mod sentiment;
pub mod wordfreq;

pub use aggregator::*;
pub use sentiment::SentimentAnalyzer;
