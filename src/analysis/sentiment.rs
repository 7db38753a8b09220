//! Lexicon-based sentiment polarity.
//!
//! Each known adjective or verb carries a polarity in [-1, 1]. An
//! intensifier right before a word scales it, and a negation shortly before
//! it flips and dampens it. The polarity of a text is the mean over every
//! word it contains that appears in the lexicon.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Scores free text on a [-1, 1] polarity scale.
pub trait PolarityScorer {
    fn polarity(&self, text: &str) -> f64;
}

/// How far back a negation still applies, in tokens.
const NEGATION_WINDOW: usize = 2;

/// Multiplier applied to a word preceded by a negation.
const NEGATION_FACTOR: f64 = -0.5;

const LEXICON: &[(&str, f64)] = &[
    // positive
    ("amazing", 0.6),
    ("approachable", 0.5),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("brilliant", 0.9),
    ("calm", 0.3),
    ("caring", 0.5),
    ("clear", 0.1),
    ("clearly", 0.1),
    ("comfortable", 0.4),
    ("competent", 0.5),
    ("creative", 0.5),
    ("dedicated", 0.4),
    ("easy", 0.43),
    ("effective", 0.6),
    ("encouraging", 0.5),
    ("engaging", 0.4),
    ("enjoy", 0.4),
    ("enjoyable", 0.5),
    ("enjoyed", 0.4),
    ("enthusiastic", 0.5),
    ("excellent", 1.0),
    ("exceptional", 0.67),
    ("excited", 0.38),
    ("fair", 0.7),
    ("fantastic", 0.4),
    ("fascinating", 0.7),
    ("favorite", 0.5),
    ("fine", 0.42),
    ("friendly", 0.38),
    ("fun", 0.3),
    ("glad", 0.5),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("impressive", 1.0),
    ("informative", 0.5),
    ("insightful", 0.5),
    ("inspiring", 0.5),
    ("interesting", 0.5),
    ("kind", 0.6),
    ("knowledgeable", 0.5),
    ("like", 0.2),
    ("liked", 0.2),
    ("love", 0.5),
    ("loved", 0.7),
    ("nice", 0.6),
    ("organized", 0.3),
    ("outstanding", 0.5),
    ("passionate", 0.5),
    ("patient", 0.4),
    ("perfect", 1.0),
    ("pleasant", 0.73),
    ("positive", 0.23),
    ("prepared", 0.3),
    ("recommend", 0.3),
    ("respectful", 0.4),
    ("responsive", 0.4),
    ("smart", 0.21),
    ("solid", 0.2),
    ("structured", 0.2),
    ("superb", 1.0),
    ("supportive", 0.4),
    ("thorough", 0.3),
    ("thoughtful", 0.4),
    ("understanding", 0.3),
    ("useful", 0.3),
    ("valuable", 0.5),
    ("well", 0.2),
    ("wonderful", 1.0),
    // negative
    ("annoying", -0.8),
    ("arrogant", -0.6),
    ("awful", -1.0),
    ("bad", -0.7),
    ("boring", -1.0),
    ("careless", -0.5),
    ("chaotic", -0.5),
    ("confused", -0.4),
    ("confusing", -0.3),
    ("difficult", -0.5),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("disorganized", -0.5),
    ("dismissive", -0.5),
    ("dull", -0.3),
    ("frustrated", -0.7),
    ("frustrating", -0.4),
    ("hard", -0.29),
    ("hate", -0.8),
    ("hated", -0.9),
    ("horrible", -1.0),
    ("impatient", -0.5),
    ("inconsistent", -0.3),
    ("late", -0.3),
    ("lazy", -0.25),
    ("mean", -0.31),
    ("messy", -0.3),
    ("monotone", -0.4),
    ("negative", -0.3),
    ("poor", -0.4),
    ("poorly", -0.4),
    ("rude", -0.3),
    ("rushed", -0.3),
    ("sad", -0.5),
    ("slow", -0.3),
    ("stressful", -0.5),
    ("terrible", -1.0),
    ("tedious", -0.4),
    ("unclear", -0.2),
    ("unfair", -0.5),
    ("unhelpful", -0.5),
    ("unorganized", -0.5),
    ("unprepared", -0.4),
    ("unresponsive", -0.5),
    ("useless", -0.5),
    ("vague", -0.2),
    ("waste", -0.2),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("especially", 1.3),
    ("extremely", 1.5),
    ("highly", 1.4),
    ("incredibly", 1.5),
    ("quite", 1.1),
    ("rather", 0.9),
    ("really", 1.3),
    ("slightly", 0.6),
    ("so", 1.2),
    ("somewhat", 0.7),
    ("super", 1.3),
    ("too", 1.2),
    ("truly", 1.3),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &["not", "never", "no", "cannot", "nor", "hardly", "barely"];

/// Built-in sentiment analyzer backed by a fixed English lexicon.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_negation(token: &str) -> bool {
        NEGATIONS.contains(&token) || token.ends_with("n't")
    }

    /// Polarity of each lexicon word in the text after modifiers.
    fn assessments(&self, tokens: &[String]) -> Vec<f64> {
        let mut scores = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.lexicon.get(token.as_str()) else {
                continue;
            };

            let mut score = base;

            if i > 0 {
                if let Some(&factor) = self.intensifiers.get(tokens[i - 1].as_str()) {
                    score *= factor;
                }
            }

            let window_start = i.saturating_sub(NEGATION_WINDOW);
            if tokens[window_start..i].iter().any(|t| Self::is_negation(t)) {
                score *= NEGATION_FACTOR;
            }

            scores.push(score.clamp(-1.0, 1.0));
        }

        scores
    }
}

impl PolarityScorer for SentimentAnalyzer {
    fn polarity(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let scores = self.assessments(&tokens);

        if scores.is_empty() {
            return 0.0;
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\w[\w'\x{2019}]*").expect("Valid sentiment token regex"));
    &PATTERN
}

/// Lower-cased word tokens, keeping inner apostrophes ("didn't").
fn tokenize(text: &str) -> Vec<String> {
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().replace('\u{2019}', "'").to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polarity(text: &str) -> f64 {
        SentimentAnalyzer::new().polarity(text)
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Didn't explain, REALLY!"),
            vec!["didn't", "explain", "really"]
        );
        assert_eq!(tokenize("It’s fine"), vec!["it's", "fine"]);
        assert_eq!(tokenize("students' notes"), vec!["students'", "notes"]);
    }

    #[test]
    fn test_positive_text() {
        let score = polarity("great explanations and patient");
        assert!((-1.0..=1.0).contains(&score));
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_negative_text() {
        assert!(polarity("boring and confusing lectures") < 0.0);
    }

    #[test]
    fn test_neutral_text_scores_zero() {
        assert_eq!(polarity("the lectures are on tuesday"), 0.0);
        assert_eq!(polarity(""), 0.0);
    }

    #[test]
    fn test_intensifier_scales() {
        let plain = polarity("good");
        let intensified = polarity("very good");
        assert!(intensified > plain);
        assert!(intensified <= 1.0);
    }

    #[test]
    fn test_negation_flips() {
        assert!(polarity("not good") < 0.0);
        assert!(polarity("wasn't helpful") < 0.0);
        assert!(polarity("not bad") > 0.0);
    }

    #[test]
    fn test_negation_window_is_bounded() {
        // "not" is three tokens before "good"
        assert!(polarity("not at all a good") > 0.0);
    }

    #[test]
    fn test_result_is_clamped() {
        let score = polarity("absolutely excellent, absolutely perfect, absolutely superb");
        assert_eq!(score, 1.0);
    }
}
