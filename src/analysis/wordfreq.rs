//! Word frequency counting for the feedback word cloud.

use crate::models::WordFrequency;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Common English words never shown in the word cloud.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "cannot", "com", "could", "couldn't", "did", "didn't",
    "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "else", "ever", "few",
    "for", "from", "further", "get", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "he", "he'd", "he'll", "he's", "hence", "her", "here", "here's", "hers", "herself",
    "him", "himself", "his", "how", "how's", "however", "http", "i", "i'd", "i'll", "i'm",
    "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just", "k",
    "like", "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off",
    "on", "once", "only", "or", "other", "otherwise", "ought", "our", "ours", "ourselves", "out",
    "over", "own", "r", "same", "shall", "shan't", "she", "she'd", "she'll", "she's", "should",
    "shouldn't", "since", "so", "some", "such", "than", "that", "that's", "the", "their",
    "theirs", "them", "themselves", "then", "there", "there's", "therefore", "these", "they",
    "they'd", "they'll", "they're", "they've", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasn't", "we", "we'd", "we'll", "we're", "we've", "were",
    "weren't", "what", "what's", "when", "when's", "where", "where's", "which", "while", "who",
    "who's", "whom", "why", "why's", "with", "won't", "would", "wouldn't", "www", "you",
    "you'd", "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
];

/// Domain words excluded on top of the stopwords unless configured otherwise.
pub const DEFAULT_EXCLUDED_WORDS: &[&str] = &[
    "the",
    "and",
    "to",
    "of",
    "a",
    "in",
    "professor",
    "Prof",
    "Prof.",
    "class",
    "always",
    "material",
    "professors",
    "had",
    "made",
    "want",
    "he",
    "they",
    "she",
    "I",
];

/// Case-insensitive set of words to drop before counting.
#[derive(Debug, Clone)]
pub struct WordFilter {
    excluded: HashSet<String>,
}

impl Default for WordFilter {
    fn default() -> Self {
        let extra: Vec<String> = DEFAULT_EXCLUDED_WORDS.iter().map(|w| w.to_string()).collect();
        Self::new(&extra)
    }
}

impl WordFilter {
    /// Builtin stopwords plus `extra`.
    pub fn new(extra: &[String]) -> Self {
        let mut excluded: HashSet<String> = STOPWORDS.iter().map(|w| w.to_string()).collect();
        for word in extra {
            let word = word.trim().to_lowercase();
            if word.is_empty() {
                continue;
            }
            // "Prof." also excludes the token "prof"
            let bare = word.trim_end_matches('.').to_string();
            if !bare.is_empty() {
                excluded.insert(bare);
            }
            excluded.insert(word);
        }
        Self { excluded }
    }

    pub fn is_excluded(&self, word: &str) -> bool {
        self.excluded.contains(&word.to_lowercase())
    }
}

/// Collocation score a word pair must exceed to be counted as a phrase.
pub const COLLOCATION_THRESHOLD: f64 = 30.0;

/// Word tokens: a word character followed by word characters or apostrophes.
fn word_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\w[\w']*").expect("Valid word token regex"));
    &PATTERN
}

/// Counts feedback words for the word cloud.
#[derive(Debug, Clone)]
pub struct WordCounter {
    filter: WordFilter,
    max_words: usize,
    collocations: bool,
}

impl Default for WordCounter {
    fn default() -> Self {
        Self::new(WordFilter::default(), 200)
    }
}

impl WordCounter {
    /// A counter keeping at most `max_words` entries, without phrases.
    pub fn new(filter: WordFilter, max_words: usize) -> Self {
        Self {
            filter,
            max_words,
            collocations: false,
        }
    }

    /// Also count two-word phrases that occur together unusually often.
    pub fn with_collocations(mut self, enabled: bool) -> Self {
        self.collocations = enabled;
        self
    }

    /// Count words in `text`, most frequent first.
    ///
    /// Counting is case-insensitive; each word is reported in its most
    /// common spelling. A plural ending in `s` is merged into its singular
    /// when both occur.
    pub fn count(&self, text: &str) -> Vec<WordFrequency> {
        let tokens = tokenize(text);

        let counts: Vec<(String, i64)> = if self.collocations {
            self.unigrams_and_bigrams(&tokens)
        } else {
            let kept = tokens.into_iter().filter(|t| !self.filter.is_excluded(t));
            let (counts, _) = process_tokens(kept);
            counts
                .into_iter()
                .map(|(word, count)| (word, count as i64))
                .collect()
        };

        let mut words: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(word, count)| (word, count as usize))
            .collect();

        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(self.max_words);

        let max_count = words.first().map(|(_, count)| *count).unwrap_or(0);
        words
            .into_iter()
            .map(|(word, count)| WordFrequency {
                word,
                count,
                weight: count as f64 / max_count as f64,
            })
            .collect()
    }

    /// Unigram counts with collocated pairs moved into phrase entries.
    ///
    /// Pairs are taken from the unfiltered token stream, so an excluded word
    /// between two kept words breaks the pair.
    fn unigrams_and_bigrams(&self, tokens: &[String]) -> Vec<(String, i64)> {
        let unigrams: Vec<String> = tokens
            .iter()
            .filter(|t| !self.filter.is_excluded(t))
            .cloned()
            .collect();
        let bigrams = tokens
            .windows(2)
            .filter(|pair| !pair.iter().any(|t| self.filter.is_excluded(t)))
            .map(|pair| format!("{} {}", pair[0], pair[1]));

        let n_words = unigrams.len();
        let (unigram_counts, standard) = process_tokens(unigrams.into_iter());
        let (bigram_counts, _) = process_tokens(bigrams);

        let mut counts: HashMap<String, i64> = unigram_counts
            .iter()
            .map(|(word, count)| (word.clone(), *count as i64))
            .collect();

        for (phrase, count) in bigram_counts {
            let Some((first, second)) = phrase.split_once(' ') else {
                continue;
            };
            let (Some(word1), Some(word2)) = (
                standard.get(&first.to_lowercase()),
                standard.get(&second.to_lowercase()),
            ) else {
                continue;
            };
            let (Some(&count1), Some(&count2)) =
                (unigram_counts.get(word1), unigram_counts.get(word2))
            else {
                continue;
            };

            if collocation_score(count, count1, count2, n_words) > COLLOCATION_THRESHOLD {
                // A word may sit in several phrases, so its count can go negative
                *counts.entry(word1.clone()).or_default() -= count as i64;
                *counts.entry(word2.clone()).or_default() -= count as i64;
                counts.insert(phrase, count as i64);
            }
        }

        counts.into_iter().collect()
    }
}

/// Dunning log-likelihood ratio of `count12` co-occurrences of two words
/// seen `count1` and `count2` times among `n_words` tokens.
fn collocation_score(count12: usize, count1: usize, count2: usize, n_words: usize) -> f64 {
    if n_words <= count1 || n_words <= count2 {
        return 0.0;
    }

    let n = n_words as f64;
    let (c12, c1, c2) = (count12 as f64, count1 as f64, count2 as f64);
    let p = c2 / n;
    let p1 = c12 / c1;
    let p2 = (c2 - c12) / (n - c1);

    let score = log_likelihood(c12, c1, p) + log_likelihood(c2 - c12, n - c1, p)
        - log_likelihood(c12, c1, p1)
        - log_likelihood(c2 - c12, n - c1, p2);
    -2.0 * score
}

fn log_likelihood(k: f64, n: f64, x: f64) -> f64 {
    x.max(1e-10).ln() * k + (1.0 - x).max(1e-10).ln() * (n - k)
}

/// Word tokens with a trailing possessive `'s` removed and pure numbers
/// dropped.
fn tokenize(text: &str) -> Vec<String> {
    word_pattern()
        .find_iter(text)
        .map(|m| {
            let token = m.as_str();
            if token.to_lowercase().ends_with("'s") {
                &token[..token.len() - 2]
            } else {
                token
            }
        })
        .filter(|t| !t.is_empty() && !t.chars().all(|c| c.is_numeric()))
        .map(String::from)
        .collect()
}

/// Case-fold and plural-fold tokens.
///
/// Returns counts keyed by display spelling, and a map from every
/// lower-case form (folded plurals included) to its display spelling.
fn process_tokens(
    tokens: impl Iterator<Item = String>,
) -> (HashMap<String, usize>, HashMap<String, String>) {
    // lower-case form -> (spelling -> count)
    let mut forms: HashMap<String, HashMap<String, usize>> = HashMap::new();
    for token in tokens {
        *forms
            .entry(token.to_lowercase())
            .or_default()
            .entry(token)
            .or_default() += 1;
    }

    let merged = fold_plurals(&mut forms);

    let mut counts = HashMap::new();
    let mut standard = HashMap::new();
    for (lower, spellings) in forms {
        let total = spellings.values().sum();
        let spelling = most_common_spelling(spellings);
        counts.insert(spelling.clone(), total);
        standard.insert(lower, spelling);
    }
    for (plural, singular) in merged {
        if let Some(spelling) = standard.get(&singular).cloned() {
            standard.insert(plural, spelling);
        }
    }

    (counts, standard)
}

/// Merge plurals into singulars; returns plural -> singular for each merge.
fn fold_plurals(forms: &mut HashMap<String, HashMap<String, usize>>) -> Vec<(String, String)> {
    let plurals: Vec<String> = forms
        .keys()
        .filter(|k| k.len() > 1 && k.ends_with('s') && !k.ends_with("ss"))
        .filter(|k| forms.contains_key(&k[..k.len() - 1]))
        .cloned()
        .collect();

    let mut merged = Vec::with_capacity(plurals.len());
    for plural in plurals {
        let Some(spellings) = forms.remove(&plural) else {
            continue;
        };
        let singular_key = plural[..plural.len() - 1].to_string();
        let singular = forms.entry(singular_key.clone()).or_default();
        for (spelling, count) in spellings {
            // Credit the plural occurrences to the singular spelling
            let target = spelling[..spelling.len() - 1].to_string();
            *singular.entry(target).or_default() += count;
        }
        merged.push((plural, singular_key));
    }
    merged
}

fn most_common_spelling(spellings: HashMap<String, usize>) -> String {
    spellings
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(spelling, _)| spelling)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_frequencies(text: &str, filter: &WordFilter, max_words: usize) -> Vec<WordFrequency> {
        WordCounter::new(filter.clone(), max_words).count(text)
    }

    fn words(freqs: &[WordFrequency]) -> Vec<&str> {
        freqs.iter().map(|f| f.word.as_str()).collect()
    }

    #[test]
    fn test_excludes_stopwords_and_domain_words() {
        let filter = WordFilter::default();
        let freqs = word_frequencies(
            "Great explanations and patient. The professor made class fun, Prof. A rocks",
            &filter,
            200,
        );
        let found = words(&freqs);

        assert!(found.contains(&"Great"));
        assert!(found.contains(&"explanations"));
        assert!(found.contains(&"patient"));
        for excluded in ["and", "The", "professor", "made", "class", "Prof"] {
            assert!(!found.contains(&excluded), "{excluded} should be excluded");
        }
    }

    #[test]
    fn test_extra_exclusions_are_case_insensitive() {
        let filter = WordFilter::new(&["Lectures".to_string()]);
        let freqs = word_frequencies("lectures LECTURES helpful", &filter, 200);
        assert_eq!(words(&freqs), vec!["helpful"]);
        // builtin stopwords still apply with a custom list
        assert!(filter.is_excluded("the"));
        assert!(!filter.is_excluded("professor"));
    }

    #[test]
    fn test_counts_and_weights() {
        let filter = WordFilter::default();
        let freqs = word_frequencies("clear clear clear helpful helpful kind", &filter, 200);

        assert_eq!(words(&freqs), vec!["clear", "helpful", "kind"]);
        assert_eq!(freqs[0].count, 3);
        assert_eq!(freqs[0].weight, 1.0);
        assert!((freqs[1].weight - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_most_common_spelling_wins() {
        let filter = WordFilter::default();
        let freqs = word_frequencies("Python python Python", &filter, 200);
        assert_eq!(freqs.len(), 1);
        assert_eq!(freqs[0].word, "Python");
        assert_eq!(freqs[0].count, 3);
    }

    #[test]
    fn test_plurals_fold_into_singular() {
        let filter = WordFilter::default();
        let freqs = word_frequencies("example examples examples class", &filter, 200);
        assert_eq!(freqs.len(), 1);
        assert_eq!(freqs[0].word, "example");
        assert_eq!(freqs[0].count, 3);
    }

    #[test]
    fn test_possessive_and_numbers_dropped() {
        let filter = WordFilter::default();
        let freqs = word_frequencies("teacher's notes 2024 notes", &filter, 200);
        assert_eq!(words(&freqs), vec!["notes", "teacher"]);
    }

    #[test]
    fn test_max_words_truncates() {
        let filter = WordFilter::default();
        let freqs = word_frequencies("alpha beta beta gamma gamma gamma", &filter, 2);
        assert_eq!(words(&freqs), vec!["gamma", "beta"]);
    }

    #[test]
    fn test_all_excluded_yields_nothing() {
        let filter = WordFilter::default();
        assert!(word_frequencies("the and of", &filter, 200).is_empty());
        assert!(word_frequencies("", &filter, 200).is_empty());
    }

    #[test]
    fn test_tokenize_keeps_trailing_apostrophe() {
        assert_eq!(tokenize("students' ideas"), vec!["students'", "ideas"]);
        assert_eq!(tokenize("Don't stop, it's 42"), vec!["Don't", "stop", "it"]);
    }

    #[test]
    fn test_trailing_apostrophe_is_not_a_plural() {
        let filter = WordFilter::default();
        let freqs = word_frequencies("students' student", &filter, 200);
        let mut found = words(&freqs);
        found.sort_unstable();
        assert_eq!(found, vec!["student", "students'"]);
    }

    fn repeated(phrase: &str, times: usize) -> String {
        vec![phrase; times].join(" ")
    }

    #[test]
    fn test_collocations_become_phrases() {
        // "office hours" always occurs together among many unrelated words
        let mut text = repeated("office hours", 12);
        for filler in ["clear", "kind", "fair", "quick", "funny", "smart", "calm", "bright"] {
            text.push(' ');
            text.push_str(&repeated(filler, 3));
        }

        let counter = WordCounter::new(WordFilter::default(), 200).with_collocations(true);
        let freqs = counter.count(&text);
        let found = words(&freqs);

        assert_eq!(found.first(), Some(&"office hours"));
        assert_eq!(freqs[0].count, 12);
        assert!(!found.contains(&"office"));
        assert!(!found.contains(&"hours"));
        assert!(found.contains(&"clear"));
    }

    #[test]
    fn test_collocations_disabled_counts_single_words() {
        let text = repeated("office hours", 12);
        let freqs = WordCounter::new(WordFilter::default(), 200).count(&text);
        assert_eq!(words(&freqs), vec!["hours", "office"]);
    }

    #[test]
    fn test_excluded_word_breaks_pair() {
        let text = repeated("office and hours then", 12) + " clear kind fair quick funny";
        let counter = WordCounter::new(WordFilter::default(), 200).with_collocations(true);
        let found: Vec<String> = counter.count(&text).into_iter().map(|f| f.word).collect();

        assert!(found.iter().all(|w| !w.contains(' ')));
        assert!(found.contains(&"office".to_string()));
    }

    #[test]
    fn test_collocation_score() {
        assert_eq!(collocation_score(3, 3, 3, 3), 0.0);
        assert!(collocation_score(12, 12, 12, 60) > COLLOCATION_THRESHOLD);
        assert!(collocation_score(1, 10, 10, 60) < COLLOCATION_THRESHOLD);
    }
}
