//! Offline collaborators: fixture market data and a paper exchange.

mod fixture;
mod paper;

pub use fixture::MarketFixture;
pub use paper::{CallCounts, PaperExchange};
