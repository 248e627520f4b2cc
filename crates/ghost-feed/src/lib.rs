//! Price and vibe stream aggregation for GhostMarket.
//!
//! Parses raw price/sentiment messages and folds them into a per-asset
//! pair of time-windowed aggregators (price, vibe) held in an
//! [`AssetRegistry`].

pub mod asset_state;
pub mod error;
pub mod parser;
pub mod window;

pub use asset_state::{AssetRegistry, AssetSnapshot, AssetState};
pub use error::{FeedError, FeedResult};
pub use parser::{MessageParser, ParseStats, PriceUpdate, SentimentPost};
pub use window::{Admission, WindowedAggregator};
