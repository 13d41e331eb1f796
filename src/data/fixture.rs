use crate::error::{FixtureError, MarketDataError};
use crate::market::{
    AssetPair, BookLevel, Candle, MarketDataProvider, OrderBook, Snapshot, Spread, Ticker,
};
use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;

/// In-memory market data, loadable from JSON.
///
/// Pairs listed in `stale` are served as fallback snapshots; pairs listed in
/// `failing` make every request for them fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketFixture {
    pub tickers: AHashMap<String, Ticker>,
    pub spreads: AHashMap<String, Spread>,
    pub ohlc: AHashMap<String, Vec<Candle>>,
    pub depth: AHashMap<String, OrderBook>,
    pub asset_pairs: Vec<AssetPair>,
    pub stale: AHashSet<String>,
    pub failing: AHashSet<String>,
}

impl MarketFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixture data from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, FixtureError> {
        let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A small XBTUSD / ETHUSD market for demos and tests.
    pub fn sample() -> Self {
        let candles = [
            (89_650.0, 90_010.0, 89_420.0, 89_880.5),
            (89_880.5, 90_240.0, 89_700.0, 90_102.3),
            (90_102.3, 90_310.8, 89_955.1, 90_135.6),
        ]
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Candle {
            time: 1_760_000_000 + 60 * i as i64,
            open,
            high,
            low,
            close,
            volume: 12.5,
        })
        .collect();

        Self::new()
            .with_ticker("XBTUSD", 90_135.6, 90_135.5, 90_135.7)
            .with_ticker("ETHUSD", 3_120.42, 3_120.4, 3_120.45)
            .with_spread("XBTUSD", 90_135.5, 90_135.7)
            .with_spread("ETHUSD", 3_120.4, 3_120.45)
            .with_candles("XBTUSD", candles)
            .with_depth(
                "XBTUSD",
                OrderBook {
                    bids: vec![
                        BookLevel { price: 90_135.5, volume: 1.2 },
                        BookLevel { price: 90_134.0, volume: 0.8 },
                    ],
                    asks: vec![
                        BookLevel { price: 90_135.7, volume: 0.6 },
                        BookLevel { price: 90_137.2, volume: 1.4 },
                    ],
                },
            )
            .with_asset_pair(AssetPair {
                name: "XBTUSD".to_string(),
                price_decimals: 1,
                lot_decimals: 8,
                order_min: 0.0001,
            })
            .with_asset_pair(AssetPair {
                name: "ETHUSD".to_string(),
                price_decimals: 2,
                lot_decimals: 8,
                order_min: 0.002,
            })
    }

    pub fn with_ticker(mut self, pair: &str, last: f64, bid: f64, ask: f64) -> Self {
        self.tickers.insert(
            pair.to_string(),
            Ticker {
                last,
                bid,
                ask,
                volume: 0.0,
            },
        );
        self
    }

    pub fn with_spread(mut self, pair: &str, bid: f64, ask: f64) -> Self {
        self.spreads.insert(pair.to_string(), Spread { bid, ask });
        self
    }

    pub fn with_candles(mut self, pair: &str, candles: Vec<Candle>) -> Self {
        self.ohlc.insert(pair.to_string(), candles);
        self
    }

    pub fn with_depth(mut self, pair: &str, book: OrderBook) -> Self {
        self.depth.insert(pair.to_string(), book);
        self
    }

    pub fn with_asset_pair(mut self, pair: AssetPair) -> Self {
        self.asset_pairs.push(pair);
        self
    }

    /// Serve `pair` as a fallback snapshot.
    pub fn stale_pair(mut self, pair: &str) -> Self {
        self.stale.insert(pair.to_string());
        self
    }

    /// Fail every request for `pair`.
    pub fn failing_pair(mut self, pair: &str) -> Self {
        self.failing.insert(pair.to_string());
        self
    }

    fn lookup<T: Clone>(
        &self,
        table: &AHashMap<String, T>,
        kind: &str,
        pair: &str,
    ) -> Result<Snapshot<T>, MarketDataError> {
        if self.failing.contains(pair) {
            return Err(MarketDataError::Request {
                pair: pair.to_string(),
                message: "fixture marks this pair as failing".to_string(),
            });
        }
        let data = table
            .get(pair)
            .cloned()
            .ok_or_else(|| MarketDataError::Unavailable {
                kind: kind.to_string(),
                pair: pair.to_string(),
            })?;
        Ok(if self.stale.contains(pair) {
            Snapshot::stale(data)
        } else {
            Snapshot::fresh(data)
        })
    }
}

#[async_trait]
impl MarketDataProvider for MarketFixture {
    async fn ticker(&self, pair: &str) -> Result<Snapshot<Ticker>, MarketDataError> {
        self.lookup(&self.tickers, "ticker", pair)
    }

    async fn depth(&self, pair: &str, count: u32) -> Result<Snapshot<OrderBook>, MarketDataError> {
        let mut snapshot = self.lookup(&self.depth, "depth", pair)?;
        let levels = count as usize;
        snapshot.data.bids.truncate(levels);
        snapshot.data.asks.truncate(levels);
        Ok(snapshot)
    }

    async fn ohlc(
        &self,
        pair: &str,
        _interval: u32,
    ) -> Result<Snapshot<Vec<Candle>>, MarketDataError> {
        self.lookup(&self.ohlc, "ohlc", pair)
    }

    async fn spread(&self, pair: &str) -> Result<Snapshot<Spread>, MarketDataError> {
        self.lookup(&self.spreads, "spread", pair)
    }

    async fn asset_pairs(&self) -> Result<Snapshot<Vec<AssetPair>>, MarketDataError> {
        Ok(Snapshot::fresh(self.asset_pairs.clone()))
    }
}
