use ahash::AHashMap;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

pub mod handler;
pub mod handlers;
pub mod ports;

pub use handler::*;
pub use ports::*;

/// Master macro declaring the closed set of node types together with the
/// handler that implements each one. Adding a variant without a handler, or a
/// handler without a variant, does not compile.
macro_rules! define_node_handlers {
    ( $( ($variant:ident, $type_name:literal, $handler:path) ),* $(,)? ) => {
        /// Every node type the engine knows how to execute.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $( $variant, )*
        }

        impl NodeKind {
            pub const ALL: &'static [NodeKind] = &[ $( NodeKind::$variant, )* ];

            /// The type identifier used in strategy documents.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( NodeKind::$variant => $type_name, )*
                }
            }

            pub fn from_type_name(name: &str) -> Option<NodeKind> {
                match name {
                    $( $type_name => Some(NodeKind::$variant), )*
                    _ => None,
                }
            }
        }

        fn create_handler(kind: NodeKind) -> Arc<dyn NodeHandler> {
            match kind {
                $( NodeKind::$variant => Arc::new($handler), )*
            }
        }
    };
}

define_node_handlers! {
    (ControlStart, "control.start", handlers::StartHandler),

    (DataKrakenTicker, "data.kraken.ticker", handlers::TickerHandler),
    (DataKrakenOhlc, "data.kraken.ohlc", handlers::OhlcHandler),
    (DataKrakenSpread, "data.kraken.spread", handlers::SpreadHandler),
    (DataKrakenAssetPairs, "data.kraken.assetPairs", handlers::AssetPairsHandler),
    (DataKrakenDepth, "data.kraken.depth", handlers::DepthHandler),
    (DataConstant, "data.constant", handlers::ConstantHandler),

    (LogicIf, "logic.if", handlers::IfHandler),
    (RiskGuard, "risk.guard", handlers::GuardHandler),

    (ActionPlaceOrder, "action.placeOrder", handlers::PlaceOrderHandler),
    (ActionCancelOrder, "action.cancelOrder", handlers::CancelOrderHandler),
    (ActionLogIntent, "action.logIntent", handlers::LogIntentHandler),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps node type identifiers to their handlers.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: AHashMap<String, Arc<dyn NodeHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut handlers: AHashMap<String, Arc<dyn NodeHandler>> = AHashMap::new();
        for kind in NodeKind::ALL {
            handlers.insert(kind.as_str().to_string(), create_handler(*kind));
        }
        Self { handlers }
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `user_type_name` resolve to the built-in handler of `canonical_type_name`.
    /// Returns `false` when the canonical name is not a known node type.
    pub fn map_type(&mut self, user_type_name: &str, canonical_type_name: &str) -> bool {
        match NodeKind::from_type_name(canonical_type_name) {
            Some(kind) => {
                self.handlers
                    .insert(user_type_name.to_string(), create_handler(kind));
                true
            }
            None => false,
        }
    }

    pub fn resolve(&self, type_name: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers.get(type_name)
    }

    pub fn kind_of(&self, type_name: &str) -> Option<NodeKind> {
        self.resolve(type_name).map(|h| h.kind())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    /// All registered type identifiers, aliases included, in sorted order.
    pub fn type_names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).sorted().collect()
    }

    /// Kinds whose canonical identifier is missing or bound to a handler of another kind.
    pub fn verify(&self) -> Vec<NodeKind> {
        NodeKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.kind_of(kind.as_str()) != Some(*kind))
            .collect()
    }
}
