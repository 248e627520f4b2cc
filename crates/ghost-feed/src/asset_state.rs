//! Per-asset window state.
//!
//! One [`AssetState`] (price window + vibe window) exists for every
//! configured asset. The set is fixed at startup: the registry never
//! creates entries on the fly for assets seen on the wire.

use crate::error::{FeedError, FeedResult};
use crate::window::{Admission, WindowedAggregator};
use ghost_core::AssetId;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Windows for a single tracked asset.
#[derive(Debug, Clone)]
pub struct AssetState {
    asset: AssetId,
    price: WindowedAggregator,
    vibe: WindowedAggregator,
}

impl AssetState {
    /// Create empty price and vibe windows of the same length.
    pub fn new(asset: AssetId, window: Duration) -> FeedResult<Self> {
        Ok(Self {
            asset,
            price: WindowedAggregator::new(window)?,
            vibe: WindowedAggregator::new(window)?,
        })
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn price(&self) -> &WindowedAggregator {
        &self.price
    }

    pub fn vibe(&self) -> &WindowedAggregator {
        &self.vibe
    }

    /// Record a price observation.
    pub fn record_price(&mut self, price: f64, timestamp: f64) -> FeedResult<Admission> {
        let admission = self.price.add(price, timestamp)?;
        debug!(
            asset = %self.asset,
            price,
            ?admission,
            window_avg = ?self.price.average(),
            "Price recorded"
        );
        Ok(admission)
    }

    /// Record a vibe (sentiment) score observation.
    pub fn record_vibe(&mut self, score: f64, timestamp: f64) -> FeedResult<Admission> {
        let admission = self.vibe.add(score, timestamp)?;
        debug!(
            asset = %self.asset,
            score,
            ?admission,
            window_avg = ?self.vibe.average(),
            "Vibe recorded"
        );
        Ok(admission)
    }

    /// Point-in-time view of both windows.
    ///
    /// Returns `None` until the price window holds at least one point.
    /// Vibe values stay optional; the caller decides how to treat a
    /// missing sentiment history.
    pub fn snapshot(&self) -> Option<AssetSnapshot> {
        let price_current = self.price.latest()?;
        let price_avg = self.price.average()?;
        Some(AssetSnapshot {
            asset: self.asset.clone(),
            price_current,
            price_avg,
            price_count: self.price.count(),
            vibe_current: self.vibe.latest(),
            vibe_avg: self.vibe.average(),
            vibe_count: self.vibe.count(),
        })
    }
}

/// Snapshot of an asset's windows used for signal evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSnapshot {
    pub asset: AssetId,
    pub price_current: f64,
    pub price_avg: f64,
    pub price_count: usize,
    pub vibe_current: Option<f64>,
    pub vibe_avg: Option<f64>,
    pub vibe_count: usize,
}

/// Owned registry of all tracked assets, in configuration order.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    states: Vec<AssetState>,
    index: HashMap<AssetId, usize>,
}

impl AssetRegistry {
    /// Build the registry for a fixed asset list.
    ///
    /// Fails on duplicate ids or an invalid window.
    pub fn new<I>(assets: I, window: Duration) -> FeedResult<Self>
    where
        I: IntoIterator<Item = AssetId>,
    {
        let mut states = Vec::new();
        let mut index = HashMap::new();

        for asset in assets {
            if index.contains_key(&asset) {
                return Err(FeedError::DuplicateAsset(asset.to_string()));
            }
            index.insert(asset.clone(), states.len());
            states.push(AssetState::new(asset, window)?);
        }

        Ok(Self { states, index })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.index.contains_key(asset)
    }

    pub fn get(&self, asset: &AssetId) -> Option<&AssetState> {
        self.index.get(asset).map(|&i| &self.states[i])
    }

    pub fn get_mut(&mut self, asset: &AssetId) -> Option<&mut AssetState> {
        self.index.get(asset).map(|&i| &mut self.states[i])
    }

    /// Asset ids in configuration order.
    pub fn ids(&self) -> impl Iterator<Item = &AssetId> {
        self.states.iter().map(AssetState::asset)
    }

    /// States in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetState> {
        self.states.iter()
    }

    /// Record a price for a registered asset.
    pub fn record_price(
        &mut self,
        asset: &AssetId,
        price: f64,
        timestamp: f64,
    ) -> FeedResult<Admission> {
        self.get_mut(asset)
            .ok_or_else(|| FeedError::UnknownAsset(asset.to_string()))?
            .record_price(price, timestamp)
    }

    /// Record a vibe score for a registered asset.
    pub fn record_vibe(
        &mut self,
        asset: &AssetId,
        score: f64,
        timestamp: f64,
    ) -> FeedResult<Admission> {
        self.get_mut(asset)
            .ok_or_else(|| FeedError::UnknownAsset(asset.to_string()))?
            .record_vibe(score, timestamp)
    }
}
