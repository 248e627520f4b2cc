//! Sentiment scorer trait and shared helpers.

use crate::error::{ScorerError, ScorerResult};
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Longest text prefix (in characters) a scorer looks at.
pub const DEFAULT_MAX_CHARS: usize = 512;

/// Text → vibe score.
///
/// Implementations must return a value in [-1, 1], look at no more than a
/// bounded prefix of the text, and be deterministic for a given text.
pub trait SentimentScorer: Send + Sync {
    fn score<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ScorerResult<f64>>;

    /// Backend name for logs and metrics.
    fn name(&self) -> &'static str;
}

impl<T: SentimentScorer + ?Sized> SentimentScorer for Arc<T> {
    fn score<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ScorerResult<f64>> {
        (**self).score(text)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Clamp to [-1, 1]. NaN maps to neutral.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-1.0, 1.0)
    }
}

/// Signed score from a classifier label and its confidence.
///
/// `positive` → `+score`, `negative` → `-score`, `neutral` → `0.0`.
pub fn label_to_score(label: &str, score: f64) -> ScorerResult<f64> {
    if !score.is_finite() {
        return Err(ScorerError::InvalidResponse(format!(
            "non-finite score {score} for label {label}"
        )));
    }
    let signed = match label.to_ascii_lowercase().as_str() {
        "positive" => score,
        "negative" => -score,
        "neutral" => 0.0,
        _ => return Err(ScorerError::UnknownLabel(label.to_string())),
    };
    Ok(clamp_score(signed))
}
