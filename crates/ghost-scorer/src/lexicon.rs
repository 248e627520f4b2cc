//! Lexicon-based sentiment scorer.
//!
//! Weighted crypto vocabulary with negation and intensifier handling. Fully
//! deterministic and in-process, so it doubles as the default backend and
//! the test backend.

use crate::error::ScorerResult;
use crate::scorer::{clamp_score, truncate_chars, BoxFuture, SentimentScorer, DEFAULT_MAX_CHARS};
use std::collections::{HashMap, HashSet};

const WORDS: &[(&str, f64)] = &[
    // Positive
    ("moon", 0.9),
    ("mooning", 0.9),
    ("bullish", 0.85),
    ("rocket", 0.8),
    ("ath", 0.8), // all-time high
    ("pump", 0.7),
    ("pumping", 0.7),
    ("rally", 0.7),
    ("breakout", 0.7),
    ("profit", 0.7),
    ("gains", 0.7),
    ("lambo", 0.7),
    ("wagmi", 0.7),
    ("amazing", 0.7),
    ("winning", 0.7),
    ("hodl", 0.6),
    ("growth", 0.6),
    ("great", 0.6),
    ("love", 0.6),
    ("buy", 0.5),
    ("buying", 0.5),
    ("long", 0.5),
    ("rise", 0.5),
    ("strong", 0.5),
    ("accumulate", 0.5),
    ("huge", 0.5),
    ("up", 0.4),
    ("support", 0.4),
    // Negative
    ("rug", -0.95),
    ("rugged", -0.95),
    ("crash", -0.9),
    ("scam", -0.9),
    ("bearish", -0.85),
    ("dump", -0.8),
    ("dumping", -0.8),
    ("rekt", -0.8),
    ("panic", -0.8),
    ("dead", -0.8),
    ("terrible", -0.8),
    ("loss", -0.7),
    ("losing", -0.7),
    ("failed", -0.7),
    ("ngmi", -0.7),
    ("fud", -0.6), // fear, uncertainty, doubt
    ("fear", -0.6),
    ("drop", -0.6),
    ("hate", -0.6),
    ("sell", -0.5),
    ("selling", -0.5),
    ("short", -0.5),
    ("fall", -0.5),
    ("weak", -0.5),
    ("down", -0.4),
    ("correction", -0.4),
    ("resistance", -0.3),
];

const EMOJI: &[(char, f64)] = &[
    ('🚀', 0.8),
    ('🌕', 0.8),
    ('📈', 0.6),
    ('💎', 0.5),
    ('🔥', 0.5),
    ('📉', -0.6),
    ('💀', -0.6),
    ('🩸', -0.6),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("super", 1.5),
    ("totally", 1.5),
    ("absolutely", 1.8),
    ("extremely", 2.0),
    ("insanely", 2.0),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "dont", "don't", "doesnt", "doesn't", "isnt", "isn't", "arent",
    "aren't", "wont", "won't", "cant", "can't",
];

/// Negated terms flip sign at half strength.
const NEGATION_FACTOR: f64 = -0.5;

/// Dictionary sentiment scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    max_chars: usize,
    words: HashMap<&'static str, f64>,
    emoji: HashMap<char, f64>,
    intensifiers: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl LexiconScorer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            words: WORDS.iter().copied().collect(),
            emoji: EMOJI.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
        }
    }

    /// Score text synchronously.
    ///
    /// Mean of the matched term weights, clamped to [-1, 1]; 0.0 when no
    /// term matches.
    pub fn analyze(&self, text: &str) -> f64 {
        let text = truncate_chars(text, self.max_chars).to_lowercase();

        let mut total = 0.0;
        let mut matched = 0usize;

        for &weight in text.chars().filter_map(|c| self.emoji.get(&c)) {
            total += weight;
            matched += 1;
        }

        let mut negated = false;
        let mut intensity = 1.0;

        let tokens = text
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|t| t.trim_matches('\''))
            .filter(|t| !t.is_empty());

        for token in tokens {
            if self.negations.contains(token) {
                negated = true;
                continue;
            }
            if let Some(&factor) = self.intensifiers.get(token) {
                intensity = factor;
                continue;
            }
            if let Some(&weight) = self.words.get(token) {
                let mut term = weight * intensity;
                if negated {
                    term *= NEGATION_FACTOR;
                }
                total += term;
                matched += 1;
                negated = false;
                intensity = 1.0;
            }
        }

        if matched == 0 {
            return 0.0;
        }
        clamp_score(total / matched as f64)
    }
}

impl SentimentScorer for LexiconScorer {
    fn score<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ScorerResult<f64>> {
        Box::pin(std::future::ready(Ok(self.analyze(text))))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}
