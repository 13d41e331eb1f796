use crate::error::{MarketDataError, NodeError};
use crate::registry::{
    CONTROL_OUT, DataType, HandlerContext, NodeHandler, NodeKind, NodeOutcome, PortSpec,
    ResolvedInputs,
};
use crate::strategy::{NodeDefinition, Value};
use async_trait::async_trait;
use itertools::Itertools;

static TICKER_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("pair", DataType::String, true),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("price", DataType::Number),
    PortSpec::output("bid", DataType::Number),
    PortSpec::output("ask", DataType::Number),
    PortSpec::output("volume", DataType::Number),
];

static OHLC_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("pair", DataType::String, true),
    PortSpec::input("interval", DataType::Number, false),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("candles", DataType::Series),
    PortSpec::output("close", DataType::Number),
    PortSpec::output("high", DataType::Number),
    PortSpec::output("low", DataType::Number),
];

static SPREAD_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("pair", DataType::String, true),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("spread", DataType::Number),
    PortSpec::output("bid", DataType::Number),
    PortSpec::output("ask", DataType::Number),
];

static ASSET_PAIRS_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("pair", DataType::String, true),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("priceDecimals", DataType::Number),
    PortSpec::output("lotDecimals", DataType::Number),
    PortSpec::output("orderMin", DataType::Number),
];

static DEPTH_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("pair", DataType::String, true),
    PortSpec::input("count", DataType::Number, false),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("bestBid", DataType::Number),
    PortSpec::output("bestAsk", DataType::Number),
    PortSpec::output("bidVolume", DataType::Number),
    PortSpec::output("askVolume", DataType::Number),
    PortSpec::output("imbalance", DataType::Number),
];

static CONSTANT_PORTS: &[PortSpec] = &[PortSpec::output("value", DataType::Any)];

fn unavailable(kind: &str, pair: &str) -> NodeError {
    NodeError::MarketData(MarketDataError::Unavailable {
        kind: kind.to_string(),
        pair: pair.to_string(),
    })
}

/// Reads a positive integer from an optional numeric input, falling back to `default`.
fn positive_u32(
    inputs: &ResolvedInputs,
    port: &str,
    default: u32,
) -> Result<u32, NodeError> {
    match inputs.optional_number(port)? {
        Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(n as u32),
        Some(n) => Err(NodeError::InvalidInput {
            port: port.to_string(),
            expected: "positive integer".to_string(),
            found: Value::Number(n),
        }),
        None => Ok(default),
    }
}

pub struct TickerHandler;

#[async_trait]
impl NodeHandler for TickerHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::DataKrakenTicker
    }

    fn ports(&self) -> &'static [PortSpec] {
        TICKER_PORTS
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let pair = inputs.string("pair")?;
        let snapshot = ctx.market_data().ticker(pair).await?;
        let ticker = &snapshot.data;

        let mut outcome = NodeOutcome::signal()
            .with_output("price", ticker.last)
            .with_output("bid", ticker.bid)
            .with_output("ask", ticker.ask)
            .with_output("volume", ticker.volume);
        outcome.note_snapshot(&snapshot, "ticker", pair);
        Ok(outcome)
    }
}

pub struct OhlcHandler;

#[async_trait]
impl NodeHandler for OhlcHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::DataKrakenOhlc
    }

    fn ports(&self) -> &'static [PortSpec] {
        OHLC_PORTS
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let pair = inputs.string("pair")?;
        let interval = positive_u32(inputs, "interval", ctx.settings.default_ohlc_interval)?;
        let snapshot = ctx.market_data().ohlc(pair, interval).await?;
        let candles = &snapshot.data;

        let last = candles.last().ok_or_else(|| unavailable("ohlc", pair))?;
        let (low, high) = candles
            .iter()
            .flat_map(|c| [c.low, c.high])
            .minmax()
            .into_option()
            .unwrap_or((last.low, last.high));

        let mut outcome = NodeOutcome::signal()
            .with_output("candles", candles.iter().map(|c| c.close).collect::<Vec<_>>())
            .with_output("close", last.close)
            .with_output("high", high)
            .with_output("low", low);
        outcome.note_snapshot(&snapshot, "ohlc", pair);
        Ok(outcome)
    }
}

pub struct SpreadHandler;

#[async_trait]
impl NodeHandler for SpreadHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::DataKrakenSpread
    }

    fn ports(&self) -> &'static [PortSpec] {
        SPREAD_PORTS
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let pair = inputs.string("pair")?;
        let snapshot = ctx.market_data().spread(pair).await?;
        let quote = snapshot.data;

        let mut outcome = NodeOutcome::signal()
            .with_output("spread", quote.width())
            .with_output("bid", quote.bid)
            .with_output("ask", quote.ask);
        outcome.note_snapshot(&snapshot, "spread", pair);
        Ok(outcome)
    }
}

pub struct AssetPairsHandler;

#[async_trait]
impl NodeHandler for AssetPairsHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::DataKrakenAssetPairs
    }

    fn ports(&self) -> &'static [PortSpec] {
        ASSET_PAIRS_PORTS
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let pair = inputs.string("pair")?;
        let snapshot = ctx.market_data().asset_pairs().await?;
        let info = snapshot
            .data
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(pair))
            .ok_or_else(|| NodeError::UnknownPair(pair.to_string()))?;

        let mut outcome = NodeOutcome::signal()
            .with_output("priceDecimals", f64::from(info.price_decimals))
            .with_output("lotDecimals", f64::from(info.lot_decimals))
            .with_output("orderMin", info.order_min);
        outcome.note_snapshot(&snapshot, "asset pairs", pair);
        Ok(outcome)
    }
}

pub struct DepthHandler;

#[async_trait]
impl NodeHandler for DepthHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::DataKrakenDepth
    }

    fn ports(&self) -> &'static [PortSpec] {
        DEPTH_PORTS
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let pair = inputs.string("pair")?;
        let count = positive_u32(inputs, "count", ctx.settings.default_depth)?;
        let snapshot = ctx.market_data().depth(pair, count).await?;
        let book = &snapshot.data;

        let best_bid = book
            .bids
            .iter()
            .map(|l| l.price)
            .reduce(f64::max)
            .ok_or_else(|| unavailable("depth", pair))?;
        let best_ask = book
            .asks
            .iter()
            .map(|l| l.price)
            .reduce(f64::min)
            .ok_or_else(|| unavailable("depth", pair))?;
        let bid_volume: f64 = book.bids.iter().map(|l| l.volume).sum();
        let ask_volume: f64 = book.asks.iter().map(|l| l.volume).sum();
        let total = bid_volume + ask_volume;
        let imbalance = if total > 0.0 { bid_volume / total } else { 0.5 };

        let mut outcome = NodeOutcome::signal()
            .with_output("bestBid", best_bid)
            .with_output("bestAsk", best_ask)
            .with_output("bidVolume", bid_volume)
            .with_output("askVolume", ask_volume)
            .with_output("imbalance", imbalance);
        outcome.note_snapshot(&snapshot, "depth", pair);
        Ok(outcome)
    }
}

/// Emits the literal `value` from config, coerced to `valueType` when one is given.
pub struct ConstantHandler;

impl ConstantHandler {
    fn literal(node: &NodeDefinition) -> Result<Value, String> {
        let raw = node
            .config_value("value")
            .ok_or_else(|| "data.constant requires a 'value'".to_string())?;
        let value_type = node.config_value("valueType").and_then(|v| v.as_str());

        let coerced = match value_type {
            None => Value::from_json(raw),
            Some("number") => Value::from_json(raw)
                .and_then(|v| v.as_number())
                .map(Value::Number),
            Some("string") => Some(match raw {
                serde_json::Value::String(s) => Value::String(s.clone()),
                other => Value::String(other.to_string()),
            }),
            Some("boolean") => Value::from_json(raw)
                .and_then(|v| v.as_bool())
                .map(Value::Bool),
            Some("series") => match Value::from_json(raw) {
                Some(Value::Series(s)) => Some(Value::Series(s)),
                _ => None,
            },
            Some(other) => return Err(format!("unknown valueType '{}'", other)),
        };

        coerced.ok_or_else(|| match value_type {
            Some(t) => format!("value {} is not a valid {}", raw, t),
            None => format!("value {} has no port representation", raw),
        })
    }
}

#[async_trait]
impl NodeHandler for ConstantHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::DataConstant
    }

    fn ports(&self) -> &'static [PortSpec] {
        CONSTANT_PORTS
    }

    fn validate_config(&self, node: &NodeDefinition) -> Result<(), String> {
        Self::literal(node).map(|_| ())
    }

    async fn run(
        &self,
        node: &NodeDefinition,
        _inputs: &ResolvedInputs,
        _ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let value = Self::literal(node).map_err(NodeError::InvalidConfig)?;
        Ok(NodeOutcome::signal().with_output("value", value))
    }
}
