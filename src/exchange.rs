//! Exchange action collaborator interface.

use crate::error::ExchangeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(format!("unknown order side '{}'", other)),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(format!("unknown order type '{}'", other)),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
        }
    }
}

/// Parameters of an order as built by an `action.placeOrder` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub pair: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OrderRequest {
    /// Short human form, e.g. `buy 0.5 XBTUSD @ limit 90000`.
    pub fn describe(&self) -> String {
        match (self.order_type, self.price) {
            (OrderType::Limit, Some(price)) => format!(
                "{} {} {} @ limit {}",
                self.side, self.volume, self.pair, price
            ),
            _ => format!("{} {} {} @ market", self.side, self.volume, self.pair),
        }
    }

    /// Intent parameters as recorded on the report. `price` only appears on limit orders.
    pub fn params(&self) -> serde_json::Value {
        let mut params = serde_json::json!({
            "pair": self.pair,
            "side": self.side.to_string(),
            "orderType": self.order_type.to_string(),
            "volume": self.volume,
        });
        if let (Some(price), Some(map)) = (self.price, params.as_object_mut()) {
            map.insert("price".to_string(), serde_json::json!(price));
        }
        params
    }
}

/// Performs order validation, placement and cancellation against an exchange.
///
/// Credential resolution and request signing are the adapter's business; the
/// engine only decides *which* of these calls is allowed in the current mode.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Read-only check of an order (no order is created).
    async fn validate_order(
        &self,
        order: &OrderRequest,
    ) -> Result<serde_json::Value, ExchangeError>;

    /// Read-only check of a cancellation.
    async fn validate_cancel(&self, txid: &str) -> Result<serde_json::Value, ExchangeError>;

    async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value, ExchangeError>;

    async fn cancel_order(&self, txid: &str) -> Result<serde_json::Value, ExchangeError>;
}
