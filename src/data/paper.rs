use crate::error::ExchangeError;
use crate::exchange::{ExchangeAdapter, OrderRequest, OrderType};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// How often each adapter operation was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCounts {
    pub validate_order: usize,
    pub validate_cancel: usize,
    pub place_order: usize,
    pub cancel_order: usize,
}

impl CallCounts {
    /// Calls that would change exchange state.
    pub fn mutating(&self) -> usize {
        self.place_order + self.cancel_order
    }
}

#[derive(Debug, Default)]
struct Ledger {
    next_txid: u64,
    open: BTreeMap<String, OrderRequest>,
    calls: CallCounts,
}

/// An exchange that keeps its orders in memory.
///
/// Orders get sequential `PAPER-` txids. A read-only instance refuses mutating
/// calls, which makes it a safe adapter for dry runs.
#[derive(Debug, Default)]
pub struct PaperExchange {
    ledger: Mutex<Ledger>,
    read_only: bool,
    reject_validation: Option<String>,
    fail_live: Option<String>,
}

impl PaperExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Reject every validation call with `reason`.
    pub fn rejecting(mut self, reason: &str) -> Self {
        self.reject_validation = Some(reason.to_string());
        self
    }

    /// Fail every mutating call with a transport error.
    pub fn failing(mut self, reason: &str) -> Self {
        self.fail_live = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.ledger.lock().calls
    }

    pub fn open_orders(&self) -> Vec<(String, OrderRequest)> {
        self.ledger
            .lock()
            .open
            .iter()
            .map(|(txid, order)| (txid.clone(), order.clone()))
            .collect()
    }

    fn check(order: &OrderRequest) -> Result<(), ExchangeError> {
        if !(order.volume > 0.0) {
            return Err(ExchangeError::Rejected(format!(
                "volume must be positive, got {}",
                order.volume
            )));
        }
        match (order.order_type, order.price) {
            (OrderType::Limit, None) => Err(ExchangeError::Rejected(
                "limit orders need a price".to_string(),
            )),
            (_, Some(price)) if !(price > 0.0) => Err(ExchangeError::Rejected(format!(
                "price must be positive, got {}",
                price
            ))),
            _ => Ok(()),
        }
    }

    fn guard_live(&self, operation: &str) -> Result<(), ExchangeError> {
        if self.read_only {
            return Err(ExchangeError::NotPermitted(operation.to_string()));
        }
        match &self.fail_live {
            Some(reason) => Err(ExchangeError::Transport(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for PaperExchange {
    async fn validate_order(
        &self,
        order: &OrderRequest,
    ) -> Result<serde_json::Value, ExchangeError> {
        self.ledger.lock().calls.validate_order += 1;
        if let Some(reason) = &self.reject_validation {
            return Err(ExchangeError::Rejected(reason.clone()));
        }
        Self::check(order)?;
        Ok(json!({ "descr": { "order": order.describe() } }))
    }

    async fn validate_cancel(&self, txid: &str) -> Result<serde_json::Value, ExchangeError> {
        let mut ledger = self.ledger.lock();
        ledger.calls.validate_cancel += 1;
        if let Some(reason) = &self.reject_validation {
            return Err(ExchangeError::Rejected(reason.clone()));
        }
        if !ledger.open.contains_key(txid) {
            return Err(ExchangeError::Rejected(format!("unknown order '{}'", txid)));
        }
        Ok(json!({ "count": 1 }))
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value, ExchangeError> {
        let mut ledger = self.ledger.lock();
        ledger.calls.place_order += 1;
        self.guard_live("placeOrder")?;
        Self::check(order)?;

        ledger.next_txid += 1;
        let txid = format!("PAPER-{:06}", ledger.next_txid);
        ledger.open.insert(txid.clone(), order.clone());
        Ok(json!({
            "descr": { "order": order.describe() },
            "txid": [txid],
        }))
    }

    async fn cancel_order(&self, txid: &str) -> Result<serde_json::Value, ExchangeError> {
        let mut ledger = self.ledger.lock();
        ledger.calls.cancel_order += 1;
        self.guard_live("cancelOrder")?;
        match ledger.open.remove(txid) {
            Some(_) => Ok(json!({ "count": 1 })),
            None => Err(ExchangeError::Rejected(format!("unknown order '{}'", txid))),
        }
    }
}
