//! Query collaborator interface
//!
//! The engine never talks to a database itself. It asks a [`QueryRunner`] for a materialized
//! [`Graph`] and, when relationship autocompletion is enabled, issues a second query for the
//! relationships between the nodes of the first result.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ConfigError;
use crate::graph::{Element, Graph};

/// Named query parameters
pub type QueryParameters = BTreeMap<String, Value>;

/// Parameter carrying the node ids of the first result
pub const NODE_IDS_PARAMETER: &str = "node_ids";

/// Parameter carrying the relationship types to autocomplete
pub const RELATIONSHIP_TYPES_PARAMETER: &str = "relationship_types";

/// Errors reported by a query collaborator
#[derive(Error, Debug)]
pub enum QueryError {
    /// The query could not be executed
    #[error("query failed: {0}")]
    Execution(String),

    /// A query parameter had an unexpected shape
    #[error("invalid query parameter `{name}`: {reason}")]
    Parameter { name: String, reason: String },
}

/// Runs a query and returns its result as a graph
pub trait QueryRunner {
    /// Execute `query` with `parameters`
    fn run_query(
        &mut self,
        query: &str,
        parameters: &QueryParameters,
    ) -> Result<Graph, QueryError>;
}

/// Which relationships are added between the nodes of a result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Autocomplete {
    /// Show only the relationships the query returned
    #[default]
    Disabled,
    /// Add every relationship between result nodes
    All,
    /// Add relationships of these types between result nodes
    Types(Vec<String>),
}

impl Autocomplete {
    /// Interpret a configuration value: a bool, a relationship type, or a list of types
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::Bool(enabled) => Ok(Self::from(*enabled)),
            Value::String(relationship_type) => Ok(Self::from(relationship_type.as_str())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(ConfigError::InvalidAutocomplete(other.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::from),
            other => Err(ConfigError::InvalidAutocomplete(other.to_string())),
        }
    }

    /// Whether a second query is issued
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Disabled => false,
            Self::All => true,
            Self::Types(types) => !types.is_empty(),
        }
    }

    /// The relationship type filter, if any
    pub fn relationship_types(&self) -> Option<&[String]> {
        match self {
            Self::Types(types) if !types.is_empty() => Some(types),
            _ => None,
        }
    }
}

impl From<bool> for Autocomplete {
    fn from(enabled: bool) -> Self {
        if enabled { Self::All } else { Self::Disabled }
    }
}

impl From<&str> for Autocomplete {
    fn from(relationship_type: &str) -> Self {
        Self::Types(vec![relationship_type.to_string()])
    }
}

impl From<Vec<String>> for Autocomplete {
    fn from(types: Vec<String>) -> Self {
        Self::Types(types)
    }
}

/// A synthesized query text with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    pub text: String,
    pub parameters: QueryParameters,
}

/// Build the query fetching `node_ids` together with the relationships between them
pub fn autocomplete_query(node_ids: &[String], autocomplete: &Autocomplete) -> PreparedQuery {
    let type_filter = if autocomplete.relationship_types().is_some() {
        format!("AND type(rel) IN ${}", RELATIONSHIP_TYPES_PARAMETER)
    } else {
        String::new()
    };

    let text = format!(
        "MATCH (n) WHERE elementId(n) IN ${ids}\n\
         RETURN n AS start, NULL AS rel, NULL AS end\n\
         UNION ALL\n\
         MATCH (n)-[rel]-(m)\n\
         WHERE elementId(n) IN ${ids}\n\
         AND elementId(m) IN ${ids}\n\
         {filter}\n\
         RETURN n AS start, rel, m AS end",
        ids = NODE_IDS_PARAMETER,
        filter = type_filter,
    );

    let mut parameters = QueryParameters::new();
    parameters.insert(
        NODE_IDS_PARAMETER.to_string(),
        Value::Array(node_ids.iter().cloned().map(Value::String).collect()),
    );
    if let Some(types) = autocomplete.relationship_types() {
        parameters.insert(
            RELATIONSHIP_TYPES_PARAMETER.to_string(),
            Value::Array(types.iter().cloned().map(Value::String).collect()),
        );
    }

    PreparedQuery { text, parameters }
}

/// Query collaborator over an already materialized graph.
///
/// Every query returns the whole graph, except the autocomplete query (recognized by its
/// `node_ids` parameter), which returns the subgraph induced by those ids, restricted to
/// `relationship_types` when given.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    graph: Graph,
}

impl InMemoryGraph {
    /// Wrap a graph
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    fn string_list(
        parameters: &QueryParameters,
        name: &str,
    ) -> Result<Option<HashSet<String>>, QueryError> {
        let Some(value) = parameters.get(name) else {
            return Ok(None);
        };
        let invalid = || QueryError::Parameter {
            name: name.to_string(),
            reason: "expected a list of strings".to_string(),
        };
        let items = value.as_array().ok_or_else(invalid)?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<HashSet<_>, _>>()
            .map(Some)
    }
}

impl QueryRunner for InMemoryGraph {
    fn run_query(
        &mut self,
        query: &str,
        parameters: &QueryParameters,
    ) -> Result<Graph, QueryError> {
        debug!(query = %query.trim(), parameters = parameters.len(), "running in-memory query");

        let Some(node_ids) = Self::string_list(parameters, NODE_IDS_PARAMETER)? else {
            return Ok(self.graph.clone());
        };
        let relationship_types = Self::string_list(parameters, RELATIONSHIP_TYPES_PARAMETER)?;

        let nodes = self
            .graph
            .nodes
            .iter()
            .filter(|n| node_ids.contains(&n.id))
            .cloned()
            .collect();

        let mut edges = Vec::new();
        for edge in &self.graph.edges {
            if !node_ids.contains(&edge.start) || !node_ids.contains(&edge.end) {
                continue;
            }
            if let Some(types) = &relationship_types {
                let relationship_type = edge
                    .type_label()
                    .map_err(|e| QueryError::Execution(e.to_string()))?;
                if !types.contains(relationship_type) {
                    continue;
                }
            }
            edges.push(edge.clone());
        }

        Ok(Graph::new(nodes, edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use serde_json::json;

    fn sample_graph() -> Graph {
        Graph::new(
            vec![
                Node::new("a", "Person"),
                Node::new("b", "Person"),
                Node::new("c", "Company"),
            ],
            vec![
                Edge::new("e1", "a", "b", "KNOWS"),
                Edge::new("e2", "a", "c", "WORKS_AT"),
                Edge::new("e3", "b", "c", "WORKS_AT"),
            ],
        )
    }

    // ========== Autocomplete Setting Tests ==========

    #[test]
    fn autocomplete_from_bool() {
        assert_eq!(Autocomplete::from_value(&json!(true)).unwrap(), Autocomplete::All);
        assert_eq!(
            Autocomplete::from_value(&json!(false)).unwrap(),
            Autocomplete::Disabled
        );
    }

    #[test]
    fn autocomplete_from_string_is_single_type() {
        let autocomplete = Autocomplete::from_value(&json!("KNOWS")).unwrap();
        assert_eq!(autocomplete, Autocomplete::Types(vec!["KNOWS".to_string()]));
        assert!(autocomplete.is_enabled());
    }

    #[test]
    fn autocomplete_empty_list_is_disabled() {
        let autocomplete = Autocomplete::from_value(&json!([])).unwrap();
        assert!(!autocomplete.is_enabled());
        assert!(autocomplete.relationship_types().is_none());
    }

    #[test]
    fn autocomplete_rejects_other_values() {
        for value in [json!(1), json!({"type": "KNOWS"}), json!(null), json!(["KNOWS", 2])] {
            let err = Autocomplete::from_value(&value).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidAutocomplete(_)));
        }
    }

    // ========== Autocomplete Query Tests ==========

    #[test]
    fn autocomplete_query_without_type_filter() {
        let query = autocomplete_query(&["a".to_string()], &Autocomplete::All);

        assert!(query.text.contains("elementId(n) IN $node_ids"));
        assert!(!query.text.contains("type(rel)"));
        assert_eq!(query.parameters.get("node_ids"), Some(&json!(["a"])));
        assert!(!query.parameters.contains_key("relationship_types"));
    }

    #[test]
    fn autocomplete_query_with_type_filter() {
        let autocomplete = Autocomplete::from(vec!["KNOWS".to_string(), "LIKES".to_string()]);
        let query = autocomplete_query(&["a".to_string(), "b".to_string()], &autocomplete);

        assert!(query.text.contains("AND type(rel) IN $relationship_types"));
        assert_eq!(
            query.parameters.get("relationship_types"),
            Some(&json!(["KNOWS", "LIKES"]))
        );
    }

    // ========== In-Memory Runner Tests ==========

    #[test]
    fn in_memory_returns_whole_graph_for_plain_query() {
        let mut runner = InMemoryGraph::new(sample_graph());
        let graph = runner.run_query("MATCH (n) RETURN n", &QueryParameters::new()).unwrap();
        assert_eq!(graph, sample_graph());
    }

    #[test]
    fn in_memory_returns_induced_subgraph_for_node_ids() {
        let mut runner = InMemoryGraph::new(sample_graph());
        let query = autocomplete_query(&["a".to_string(), "c".to_string()], &Autocomplete::All);

        let graph = runner.run_query(&query.text, &query.parameters).unwrap();

        assert_eq!(graph.node_ids(), vec!["a".to_string(), "c".to_string()]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "e2");
    }

    #[test]
    fn in_memory_filters_relationship_types() {
        let mut runner = InMemoryGraph::new(sample_graph());
        let query = autocomplete_query(
            &["a".to_string(), "b".to_string(), "c".to_string()],
            &Autocomplete::from("KNOWS"),
        );

        let graph = runner.run_query(&query.text, &query.parameters).unwrap();

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "e1");
    }

    #[test]
    fn in_memory_rejects_malformed_node_ids() {
        let mut runner = InMemoryGraph::new(sample_graph());
        let mut parameters = QueryParameters::new();
        parameters.insert("node_ids".to_string(), json!("a"));

        let err = runner.run_query("", &parameters).unwrap_err();
        assert!(matches!(err, QueryError::Parameter { ref name, .. } if name == "node_ids"));
    }
}
