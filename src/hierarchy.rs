//! Relationship-to-hierarchy folding
//!
//! Relationships whose type is registered as a parent relationship are not rendered as edges.
//! Instead their endpoints become child and parent, and the resulting lookup is chained in
//! front of the existing parent resolution function.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::binding::ResolutionFn;
use crate::graph::{Edge, Element, GraphError, Node};
use crate::store::ParentRelationship;

/// Result of folding one edge list
#[derive(Debug, Clone, Default)]
pub struct HierarchyFold {
    /// Edges that remain rendered
    pub edges: Vec<Edge>,

    /// Child node id → parent node id
    pub node_to_parent: BTreeMap<String, String>,

    /// Number of edges folded into the hierarchy
    pub folded: usize,
}

impl HierarchyFold {
    /// Parent of a node, if a folded relationship assigned one
    pub fn parent_of(&self, node_id: &str) -> Option<&str> {
        self.node_to_parent.get(node_id).map(String::as_str)
    }

    /// Parent resolution function consulting the folded lookup before `fallback`
    pub fn chain(&self, fallback: ResolutionFn<Node>) -> ResolutionFn<Node> {
        let node_to_parent = self.node_to_parent.clone();
        Arc::new(move |index: usize, node: &Node| match node_to_parent.get(node.id()) {
            Some(parent) => Ok(Value::String(parent.clone())),
            None => fallback(index, node),
        })
    }
}

/// Fold registered parent relationships out of an edge list.
///
/// An edge matches the first registration with its type. Not reversed: start is the child and
/// end the parent; reversed: the other way round. When several folded edges name the same
/// child, the one matching the earliest registration wins, then the earliest edge.
pub fn fold_hierarchy(
    edges: &[Edge],
    relationships: &[ParentRelationship],
) -> Result<HierarchyFold, GraphError> {
    if relationships.is_empty() {
        return Ok(HierarchyFold {
            edges: edges.to_vec(),
            ..Default::default()
        });
    }

    let mut assignments: BTreeMap<String, (usize, String)> = BTreeMap::new();
    let mut kept = Vec::with_capacity(edges.len());
    let mut folded = 0;

    for edge in edges {
        let relationship_type = edge.type_label()?;
        let matched = relationships
            .iter()
            .enumerate()
            .find(|(_, r)| r.relationship_type == relationship_type);

        let Some((priority, relationship)) = matched else {
            kept.push(edge.clone());
            continue;
        };

        let (child, parent) = if relationship.reversed {
            (&edge.end, &edge.start)
        } else {
            (&edge.start, &edge.end)
        };

        let replace = assignments
            .get(child)
            .is_none_or(|(existing, _)| priority < *existing);
        if replace {
            assignments.insert(child.clone(), (priority, parent.clone()));
        }
        folded += 1;
    }

    debug!(folded, kept = kept.len(), "folded parent relationships");

    Ok(HierarchyFold {
        edges: kept,
        node_to_parent: assignments
            .into_iter()
            .map(|(child, (_, parent))| (child, parent))
            .collect(),
        folded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reports_to() -> Vec<Edge> {
        vec![
            Edge::new("e1", "A", "B", "REPORTS_TO"),
            Edge::new("e2", "A", "C", "KNOWS"),
        ]
    }

    #[test]
    fn folds_matching_edges() {
        let fold =
            fold_hierarchy(&reports_to(), &[ParentRelationship::new("REPORTS_TO", false)]).unwrap();

        assert_eq!(fold.parent_of("A"), Some("B"));
        assert_eq!(fold.parent_of("B"), None);
        assert_eq!(fold.folded, 1);
        assert_eq!(fold.edges.len(), 1);
        assert_eq!(fold.edges[0].id, "e2");
    }

    #[test]
    fn reversed_relationship_swaps_roles() {
        let fold =
            fold_hierarchy(&reports_to(), &[ParentRelationship::new("REPORTS_TO", true)]).unwrap();

        assert_eq!(fold.parent_of("B"), Some("A"));
        assert_eq!(fold.parent_of("A"), None);
    }

    #[test]
    fn unmatched_registration_is_a_noop() {
        let edges = reports_to();
        let fold = fold_hierarchy(&edges, &[ParentRelationship::new("MANAGES", false)]).unwrap();

        assert_eq!(fold.edges, edges);
        assert!(fold.node_to_parent.is_empty());
        assert_eq!(fold.folded, 0);
    }

    #[test]
    fn earlier_registration_wins_for_same_child() {
        let edges = vec![
            Edge::new("e1", "A", "Team", "MEMBER_OF"),
            Edge::new("e2", "A", "Boss", "REPORTS_TO"),
        ];
        let relationships = [
            ParentRelationship::new("REPORTS_TO", false),
            ParentRelationship::new("MEMBER_OF", false),
        ];

        let fold = fold_hierarchy(&edges, &relationships).unwrap();

        assert_eq!(fold.parent_of("A"), Some("Boss"));
        assert!(fold.edges.is_empty());
    }

    #[test]
    fn first_edge_wins_within_one_relationship_type() {
        let edges = vec![
            Edge::new("e1", "A", "B", "REPORTS_TO"),
            Edge::new("e2", "A", "C", "REPORTS_TO"),
        ];
        let fold =
            fold_hierarchy(&edges, &[ParentRelationship::new("REPORTS_TO", false)]).unwrap();

        assert_eq!(fold.parent_of("A"), Some("B"));
        assert_eq!(fold.folded, 2);
    }

    #[test]
    fn malformed_edge_fails_fast() {
        let mut edge = Edge::new("e1", "A", "B", "REPORTS_TO");
        edge.properties.clear();

        let result = fold_hierarchy(&[edge], &[ParentRelationship::new("REPORTS_TO", false)]);
        assert!(result.is_err());
    }

    // ========== Parent Chain Tests ==========

    #[test]
    fn chain_prefers_folded_parent_then_delegates() {
        let fold =
            fold_hierarchy(&reports_to(), &[ParentRelationship::new("REPORTS_TO", false)]).unwrap();
        let fallback: ResolutionFn<Node> =
            Arc::new(|_: usize, _: &Node| Ok::<_, GraphError>(json!("GroupNodeEng")));

        let parent = fold.chain(fallback);

        assert_eq!(parent(0, &Node::new("A", "Person")).unwrap(), json!("B"));
        assert_eq!(
            parent(1, &Node::new("C", "Person")).unwrap(),
            json!("GroupNodeEng")
        );
    }
}
