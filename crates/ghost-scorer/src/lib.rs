//! Sentiment scoring for GhostMarket.
//!
//! Maps social post text to a vibe score in [-1, 1]. Two backends:
//! - [`LexiconScorer`]: deterministic weighted crypto lexicon, in-process
//! - [`HttpScorer`]: remote classifier returning `{label, score}`

pub mod config;
pub mod error;
pub mod http;
pub mod lexicon;
pub mod scorer;

pub use config::{build_scorer, ScorerConfig, ScorerKind};
pub use error::{ScorerError, ScorerResult};
pub use http::HttpScorer;
pub use lexicon::LexiconScorer;
pub use scorer::{
    clamp_score, label_to_score, truncate_chars, BoxFuture, SentimentScorer, DEFAULT_MAX_CHARS,
};
