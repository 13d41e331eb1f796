use crate::registry::{NodeHandler, ResolvedInputs};
use crate::scheduler::GraphIndex;
use crate::strategy::{NodeDefinition, Value};
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Outputs of every node that ran successfully, keyed by node id.
pub(crate) type Produced = AHashMap<String, BTreeMap<String, Value>>;

pub(crate) enum Resolution {
    Ready {
        inputs: ResolvedInputs,
        warnings: Vec<String>,
    },
    /// A required input is wired to a node that produced nothing, and config has no fallback.
    Blocked { port: &'static str, source: String },
}

/// Overlays config values with whatever arrived on the node's data edges.
pub(crate) fn resolve(
    node: &NodeDefinition,
    handler: &dyn NodeHandler,
    index: &GraphIndex<'_>,
    produced: &Produced,
) -> Resolution {
    let mut inputs = ResolvedInputs::new();
    let mut warnings = Vec::new();

    for port in handler.ports().iter().filter(|p| p.is_data_input()) {
        let configured = node.config_value(port.id).and_then(Value::from_json);

        let Some(edge) = index.data_source(&node.id, port.id) else {
            if let Some(value) = configured {
                inputs.insert(port.id, value);
            }
            continue;
        };

        let arrived = produced
            .get(&edge.source)
            .and_then(|outputs| outputs.get(&edge.source_port))
            .filter(|value| !value.is_null());
        if let Some(value) = arrived {
            inputs.insert(port.id, value.clone());
            continue;
        }

        match configured {
            Some(value) => {
                warnings.push(format!(
                    "input '{}' fell back to its config value: '{}' produced no '{}'",
                    port.id, edge.source, edge.source_port
                ));
                inputs.insert(port.id, value);
            }
            None if port.required => {
                return Resolution::Blocked {
                    port: port.id,
                    source: edge.source.clone(),
                };
            }
            None => warnings.push(format!(
                "optional input '{}' left unset: '{}' produced no '{}'",
                port.id, edge.source, edge.source_port
            )),
        }
    }

    Resolution::Ready { inputs, warnings }
}
