//! Scorer configuration.

use crate::error::{ScorerError, ScorerResult};
use crate::http::HttpScorer;
use crate::lexicon::LexiconScorer;
use crate::scorer::{SentimentScorer, DEFAULT_MAX_CHARS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Scorer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    #[default]
    Lexicon,
    Http,
}

/// `[scorer]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    #[serde(default)]
    pub kind: ScorerKind,
    /// Classifier endpoint (required for `kind = "http"`).
    #[serde(default)]
    pub url: Option<String>,
    /// Longest text prefix sent to the scorer, in characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// HTTP request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_request_timeout_ms() -> u64 {
    5000
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            kind: ScorerKind::default(),
            url: None,
            max_chars: default_max_chars(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> ScorerResult<()> {
        if self.max_chars == 0 {
            return Err(ScorerError::ConfigError(
                "max_chars must be greater than 0".to_string(),
            ));
        }
        if self.kind == ScorerKind::Http && self.url.as_deref().map_or(true, str::is_empty) {
            return Err(ScorerError::ConfigError(
                "url is required when kind = \"http\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Construct the configured scorer backend.
pub fn build_scorer(config: &ScorerConfig) -> ScorerResult<Arc<dyn SentimentScorer>> {
    config.validate()?;
    let scorer: Arc<dyn SentimentScorer> = match config.kind {
        ScorerKind::Lexicon => Arc::new(LexiconScorer::new(config.max_chars)),
        ScorerKind::Http => {
            let url = config.url.clone().unwrap_or_default();
            Arc::new(HttpScorer::new(
                url,
                Some(Duration::from_millis(config.request_timeout_ms)),
                config.max_chars,
            )?)
        }
    };
    info!(backend = scorer.name(), max_chars = config.max_chars, "Sentiment scorer ready");
    Ok(scorer)
}
