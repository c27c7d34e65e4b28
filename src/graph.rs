//! Query result graph model
//!
//! Nodes and relationships as delivered by the query layer. Every element carries a
//! string-keyed property map whose `"label"` entry holds the element's *type* (node label or
//! relationship type), not its display text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Property key holding an element's type-label
pub const TYPE_LABEL_KEY: &str = "label";

/// Insertion-ordered property map of an element
pub type Properties = Map<String, Value>;

/// Errors raised for elements that violate the graph data contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The element has no usable type-label in its properties
    #[error("malformed element `{id}`: {reason}")]
    MalformedElement { id: String, reason: String },
}

/// Behaviour shared by nodes and relationships
pub trait Element {
    /// Identifier, unique within the element's category
    fn id(&self) -> &str;

    /// The element's property map
    fn properties(&self) -> &Properties;

    /// The element's type-label (`properties["label"]`)
    fn type_label(&self) -> Result<&str, GraphError> {
        match self.properties().get(TYPE_LABEL_KEY) {
            Some(Value::String(label)) => Ok(label),
            Some(other) => Err(GraphError::MalformedElement {
                id: self.id().to_string(),
                reason: format!("type-label must be a string, got {}", other),
            }),
            None => Err(GraphError::MalformedElement {
                id: self.id().to_string(),
                reason: format!("missing `{}` property", TYPE_LABEL_KEY),
            }),
        }
    }
}

/// A node in the query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier
    pub id: String,

    /// Node properties, including the `label` type entry
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create a node with the given id and type-label and no other properties
    pub fn new(id: impl Into<String>, type_label: impl Into<String>) -> Self {
        let mut properties = Properties::new();
        properties.insert(TYPE_LABEL_KEY.to_string(), Value::String(type_label.into()));
        Self {
            id: id.into(),
            properties,
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl Element for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// A relationship connecting two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique relationship identifier
    pub id: String,

    /// Start node id
    pub start: String,

    /// End node id
    pub end: String,

    /// Relationship properties, including the `label` type entry
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    /// Create a relationship of the given type between two nodes
    pub fn new(
        id: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        type_label: impl Into<String>,
    ) -> Self {
        let mut properties = Properties::new();
        properties.insert(TYPE_LABEL_KEY.to_string(), Value::String(type_label.into()));
        Self {
            id: id.into(),
            start: start.into(),
            end: end.into(),
            properties,
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl Element for Edge {
    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// A materialized query result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// All nodes in the result
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// All relationships in the result
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create a graph from node and relationship lists
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Ids of all nodes, in list order
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Check that every element carries a type-label
    pub fn validate(&self) -> Result<(), GraphError> {
        for node in &self.nodes {
            node.type_label()?;
        }
        for edge in &self.edges {
            edge.type_label()?;
        }
        Ok(())
    }
}

/// Render a property value as display text.
///
/// Strings lose their quotes. Booleans and null are spelled `True`, `False` and `None`, matching
/// the group identities other clients of the same graph produce.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
