//! Group-node synthesis
//!
//! Turns configured `parent_configuration` bindings into synthetic container nodes. Each
//! distinct group identity yields exactly one node with id `GroupNode<identity>`.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::binding::{BindingSpec, ConfigurationTable, TypeConfiguration, attributes};
use crate::graph::{Element, GraphError, Node, value_to_text};

/// Id prefix of synthetic group nodes
pub const GROUP_NODE_PREFIX: &str = "GroupNode";

/// Id of the group node for a group identity
pub fn group_node_id(identity: &str) -> String {
    format!("{}{}", GROUP_NODE_PREFIX, identity)
}

/// Where a parent binding routes one element
#[derive(Debug, Clone)]
pub struct GroupTarget {
    /// Group identity (the group node's type-label)
    pub identity: String,

    /// Configuration to register for the group node, from a structured binding
    pub configuration: Option<TypeConfiguration>,
}

impl GroupTarget {
    /// Id of the target group node
    pub fn node_id(&self) -> String {
        group_node_id(&self.identity)
    }
}

/// Evaluate a parent binding for one element.
///
/// Computed bindings are invoked first. A string naming one of the element's properties routes
/// by that property's value, any other string is the identity itself, and a structured value
/// routes by its `text`. Null means the element has no group.
pub fn group_target(spec: &BindingSpec, element: &dyn Element) -> Option<GroupTarget> {
    let raw = match spec {
        BindingSpec::Structured {
            text,
            configuration,
        } => {
            return Some(GroupTarget {
                identity: text.clone(),
                configuration: Some(configuration.clone()),
            });
        }
        BindingSpec::Computed(f) => f(element),
        BindingSpec::Property(name) => Value::String(name.clone()),
        BindingSpec::Constant(value) => value.clone(),
    };

    match raw {
        Value::Null => None,
        Value::String(name) => {
            let identity = match element.properties().get(&name) {
                Some(value) => value_to_text(value),
                None => name,
            };
            Some(GroupTarget {
                identity,
                configuration: None,
            })
        }
        Value::Object(map) => match BindingSpec::structured_from_map(map) {
            BindingSpec::Structured {
                text,
                configuration,
            } => Some(GroupTarget {
                identity: text,
                configuration: Some(configuration),
            }),
            _ => None,
        },
        other => Some(GroupTarget {
            identity: value_to_text(&other),
            configuration: None,
        }),
    }
}

/// Append one synthetic group node per distinct group identity.
///
/// Returns the new node list: the input nodes unchanged, followed by the group nodes in
/// first-seen order. Configurations carried by structured parent bindings are registered in
/// `table` under the group identity.
pub fn synthesize_group_nodes(
    nodes: &[Node],
    table: &mut ConfigurationTable,
) -> Result<Vec<Node>, GraphError> {
    let mut seen = HashSet::new();
    let mut identities = Vec::new();
    let mut derived = Vec::new();

    for node in nodes {
        let type_label = node.type_label()?;
        let Some(spec) = table.binding(type_label, attributes::PARENT_CONFIGURATION) else {
            continue;
        };
        let Some(target) = group_target(spec, node) else {
            continue;
        };

        if let Some(configuration) = target.configuration {
            derived.push((target.identity.clone(), configuration));
        }
        if seen.insert(target.identity.clone()) {
            identities.push(target.identity);
        }
    }

    for (identity, configuration) in derived {
        table.insert(identity, configuration);
    }

    debug!(groups = identities.len(), "synthesized group nodes");

    let mut result = Vec::with_capacity(nodes.len() + identities.len());
    result.extend_from_slice(nodes);
    result.extend(
        identities
            .iter()
            .map(|identity| Node::new(group_node_id(identity), identity.clone())),
    );
    Ok(result)
}
