//! Core domain types for the GhostMarket decoupling processor.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `AssetId`: canonical identifier of a tracked asset (e.g. "bitcoin")
//! - `DataPoint`: a timestamped scalar observation (price or vibe score)
//! - `AlertKind`: classification attached to a decoupling signal

pub mod asset;
pub mod error;
pub mod types;

pub use asset::AssetId;
pub use error::{CoreError, Result};
pub use types::{now_unix_seconds, AlertKind, DataPoint};
