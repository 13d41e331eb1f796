mod action;
mod control;
mod data;
mod logic;
mod risk;

pub use action::{CancelOrderHandler, LogIntentHandler, PlaceOrderHandler};
pub use control::StartHandler;
pub use data::{
    AssetPairsHandler, ConstantHandler, DepthHandler, OhlcHandler, SpreadHandler, TickerHandler,
};
pub use logic::{Comparator, IfHandler};
pub use risk::GuardHandler;
