//! Market data collaborator interface.
//!
//! The engine never talks to an exchange directly. Data nodes ask a
//! [`MarketDataProvider`] for point-in-time snapshots and convert whatever it
//! returns into port values. Transport, caching and fallback policies live
//! behind the trait.

use crate::error::MarketDataError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A provider response, flagged when the provider served cached or fallback data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub data: T,
    #[serde(default)]
    pub stale: bool,
}

impl<T> Snapshot<T> {
    pub fn fresh(data: T) -> Self {
        Self { data, stale: false }
    }

    pub fn stale(data: T) -> Self {
        Self { data, stale: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub last: f64,
    pub bid: f64,
    pub ask: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub bid: f64,
    pub ask: f64,
}

impl Spread {
    pub fn width(&self) -> f64 {
        self.ask - self.bid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPair {
    pub name: String,
    pub price_decimals: u32,
    pub lot_decimals: u32,
    pub order_min: f64,
}

/// Source of market snapshots for data nodes.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn ticker(&self, pair: &str) -> Result<Snapshot<Ticker>, MarketDataError>;

    async fn depth(&self, pair: &str, count: u32) -> Result<Snapshot<OrderBook>, MarketDataError>;

    /// Candles for `pair` at `interval` minutes, oldest first.
    async fn ohlc(&self, pair: &str, interval: u32)
    -> Result<Snapshot<Vec<Candle>>, MarketDataError>;

    async fn spread(&self, pair: &str) -> Result<Snapshot<Spread>, MarketDataError>;

    async fn asset_pairs(&self) -> Result<Snapshot<Vec<AssetPair>>, MarketDataError>;
}
