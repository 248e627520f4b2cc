//! Message parsing for the price and sentiment topics.
//!
//! Wire formats (JSON, UTF-8):
//! - price: `{"asset": "bitcoin", "price_usd": 62500.0, "timestamp": 1740134400.0}`
//!   (`ticker` is accepted in place of `asset`, as produced by the price poller)
//! - sentiment: `{"text": "...", "tickers": ["bitcoin"], "timestamp": ...,
//!   "author": "...", "source": "telegram"}`
//!
//! Unknown or missing fields are parse errors. Tickers are canonicalized
//! through a configurable alias table ("btc" -> "bitcoin").

use crate::error::{FeedError, FeedResult};
use ghost_core::AssetId;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Characters stripped from ticker edges before alias lookup.
const TICKER_EDGE_PUNCTUATION: &[char] = &['!', '?', ',', '.', '(', ')', '$', '#'];

/// Accept/reject counters for parsed messages.
#[derive(Debug, Default)]
pub struct ParseStats {
    pub accepted_count: AtomicU64,
    pub rejected_count: AtomicU64,
}

impl ParseStats {
    pub fn record_accepted(&self) {
        self.accepted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }
}

/// Raw price message.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPriceMessage {
    #[serde(alias = "ticker")]
    pub asset: String,
    pub price_usd: f64,
    pub timestamp: f64,
}

/// Raw sentiment message.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSentimentMessage {
    pub text: String,
    pub tickers: Vec<String>,
    pub timestamp: f64,
    pub author: String,
    pub source: String,
}

/// Parsed price observation for a registered asset.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub asset: AssetId,
    pub price: f64,
    pub timestamp: f64,
}

/// Parsed sentiment post.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentPost {
    pub text: String,
    /// Recognized assets, canonicalized and de-duplicated, in message order.
    pub assets: Vec<AssetId>,
    /// Tickers that did not resolve to a tracked asset.
    pub unrecognized: Vec<String>,
    pub timestamp: f64,
    pub author: String,
    pub source: String,
}

/// Parser bound to the configured asset set and alias table.
#[derive(Debug)]
pub struct MessageParser {
    known: HashSet<AssetId>,
    /// Lowercase alias -> canonical asset.
    aliases: HashMap<String, AssetId>,
    price_stats: ParseStats,
    sentiment_stats: ParseStats,
}

impl MessageParser {
    /// Create a parser that recognizes exactly `assets`.
    pub fn new<I>(assets: I) -> Self
    where
        I: IntoIterator<Item = AssetId>,
    {
        Self {
            known: assets.into_iter().collect(),
            aliases: HashMap::new(),
            price_stats: ParseStats::default(),
            sentiment_stats: ParseStats::default(),
        }
    }

    /// Register an alias for a tracked asset (case-insensitive).
    ///
    /// Aliases pointing at untracked assets are ignored.
    pub fn add_alias(&mut self, alias: &str, asset: AssetId) {
        if !self.known.contains(&asset) {
            debug!(alias, %asset, "Ignoring alias for untracked asset");
            return;
        }
        self.aliases.insert(alias.trim().to_lowercase(), asset);
    }

    pub fn price_stats(&self) -> &ParseStats {
        &self.price_stats
    }

    pub fn sentiment_stats(&self) -> &ParseStats {
        &self.sentiment_stats
    }

    /// Resolve a raw ticker to a tracked asset via aliases or its own name.
    pub fn resolve_ticker(&self, raw: &str) -> Option<AssetId> {
        let cleaned = raw.trim().trim_matches(TICKER_EDGE_PUNCTUATION).to_lowercase();
        if cleaned.is_empty() {
            return None;
        }
        if let Some(asset) = self.aliases.get(&cleaned) {
            return Some(asset.clone());
        }
        AssetId::parse(&cleaned)
            .ok()
            .filter(|id| self.known.contains(id))
    }

    /// Parse a price message.
    pub fn parse_price(&self, payload: &[u8]) -> FeedResult<PriceUpdate> {
        let result = self.parse_price_inner(payload);
        match &result {
            Ok(_) => self.price_stats.record_accepted(),
            Err(_) => self.price_stats.record_rejected(),
        }
        result
    }

    fn parse_price_inner(&self, payload: &[u8]) -> FeedResult<PriceUpdate> {
        let raw: RawPriceMessage = serde_json::from_slice(payload)
            .map_err(|e| FeedError::ParseError(format!("Invalid price message: {e}")))?;

        if !raw.price_usd.is_finite() || raw.price_usd < 0.0 {
            return Err(FeedError::InvalidData(format!(
                "price_usd {} is not a finite non-negative number",
                raw.price_usd
            )));
        }
        if !raw.timestamp.is_finite() {
            return Err(FeedError::InvalidData(format!(
                "timestamp {} is not finite",
                raw.timestamp
            )));
        }

        let asset = self
            .resolve_ticker(&raw.asset)
            .ok_or_else(|| FeedError::UnknownAsset(raw.asset.clone()))?;

        Ok(PriceUpdate {
            asset,
            price: raw.price_usd,
            timestamp: raw.timestamp,
        })
    }

    /// Parse a sentiment message.
    ///
    /// Fails with `NoTickers` when the ticker list is empty and with
    /// `UnknownAsset` when none of the tickers is tracked.
    pub fn parse_sentiment(&self, payload: &[u8]) -> FeedResult<SentimentPost> {
        let result = self.parse_sentiment_inner(payload);
        match &result {
            Ok(_) => self.sentiment_stats.record_accepted(),
            Err(_) => self.sentiment_stats.record_rejected(),
        }
        result
    }

    fn parse_sentiment_inner(&self, payload: &[u8]) -> FeedResult<SentimentPost> {
        let raw: RawSentimentMessage = serde_json::from_slice(payload)
            .map_err(|e| FeedError::ParseError(format!("Invalid sentiment message: {e}")))?;

        if !raw.timestamp.is_finite() {
            return Err(FeedError::InvalidData(format!(
                "timestamp {} is not finite",
                raw.timestamp
            )));
        }
        if raw.tickers.is_empty() {
            return Err(FeedError::NoTickers);
        }

        let mut assets: Vec<AssetId> = Vec::with_capacity(raw.tickers.len());
        let mut unrecognized = Vec::new();
        for ticker in &raw.tickers {
            match self.resolve_ticker(ticker) {
                Some(asset) if !assets.contains(&asset) => assets.push(asset),
                Some(_) => {}
                None => unrecognized.push(ticker.clone()),
            }
        }

        if assets.is_empty() {
            return Err(FeedError::UnknownAsset(raw.tickers.join(",")));
        }

        Ok(SentimentPost {
            text: raw.text,
            assets,
            unrecognized,
            timestamp: raw.timestamp,
            author: raw.author,
            source: raw.source,
        })
    }
}
