//! Binding configuration store
//!
//! Long-lived, session-owned configuration: node and relationship configuration tables plus the
//! set of relationship types that are folded into parent/child hierarchies.

use tracing::debug;

use crate::binding::{ConfigurationTable, TypeConfiguration};

/// A relationship type rendered as nesting instead of as an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentRelationship {
    /// Relationship type-label
    pub relationship_type: String,

    /// When false the end node is the parent; when true the start node is
    pub reversed: bool,
}

impl ParentRelationship {
    /// Create a parent relationship registration
    pub fn new(relationship_type: impl Into<String>, reversed: bool) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            reversed,
        }
    }
}

/// Immutable copy of the store taken at the start of a resolution pass
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub nodes: ConfigurationTable,
    pub edges: ConfigurationTable,
    pub parent_relationships: Vec<ParentRelationship>,
}

/// Node/relationship configurations and parent relationship registrations
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    nodes: ConfigurationTable,
    edges: ConfigurationTable,
    // registration order is folding priority
    parent_relationships: Vec<ParentRelationship>,
}

impl ConfigurationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration for a node label. A `text` binding is stored as `label`.
    pub fn set_node_configuration(
        &mut self,
        type_label: impl Into<String>,
        configuration: TypeConfiguration,
    ) {
        let type_label = type_label.into();
        debug!(
            type_label = %type_label,
            attributes = configuration.len(),
            "set node configuration"
        );
        self.nodes.insert(type_label, configuration.with_text_as_label());
    }

    /// Replace the configuration for a relationship type. A `text` binding is stored as `label`.
    pub fn set_edge_configuration(
        &mut self,
        type_label: impl Into<String>,
        configuration: TypeConfiguration,
    ) {
        let type_label = type_label.into();
        debug!(
            type_label = %type_label,
            attributes = configuration.len(),
            "set relationship configuration"
        );
        self.edges.insert(type_label, configuration.with_text_as_label());
    }

    /// Remove a node label's configuration; no-op when absent
    pub fn delete_node_configuration(&mut self, type_label: &str) {
        self.nodes.remove(type_label);
    }

    /// Remove a relationship type's configuration; no-op when absent
    pub fn delete_edge_configuration(&mut self, type_label: &str) {
        self.edges.remove(type_label);
    }

    /// Register a relationship type as a parent relationship. Registering twice is a no-op.
    pub fn add_parent_relationship(
        &mut self,
        relationship_type: impl Into<String>,
        reversed: bool,
    ) {
        let relationship = ParentRelationship::new(relationship_type, reversed);
        if !self.parent_relationships.contains(&relationship) {
            self.parent_relationships.push(relationship);
        }
    }

    /// Remove every orientation registered for a relationship type
    pub fn delete_parent_relationship(&mut self, relationship_type: &str) {
        self.parent_relationships
            .retain(|r| r.relationship_type != relationship_type);
    }

    /// Node configuration table
    pub fn nodes(&self) -> &ConfigurationTable {
        &self.nodes
    }

    /// Relationship configuration table
    pub fn edges(&self) -> &ConfigurationTable {
        &self.edges
    }

    /// Registered parent relationships in priority order
    pub fn parent_relationships(&self) -> &[ParentRelationship] {
        &self.parent_relationships
    }

    /// Copy the current state for one resolution pass
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            parent_relationships: self.parent_relationships.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingSpec;

    #[test]
    fn set_node_configuration_replaces_whole_record() {
        let mut store = ConfigurationStore::new();
        store.set_node_configuration(
            "Person",
            TypeConfiguration::new()
                .with("color", BindingSpec::constant("red"))
                .with("size", BindingSpec::constant(10)),
        );
        store.set_node_configuration(
            "Person",
            TypeConfiguration::new().with("color", BindingSpec::constant("blue")),
        );

        let person = store.nodes().get("Person").expect("Should have Person entry");
        assert_eq!(person.len(), 1);
        assert!(!person.contains("size"));
    }

    #[test]
    fn text_is_stored_as_label() {
        let mut store = ConfigurationStore::new();
        store.set_edge_configuration(
            "KNOWS",
            TypeConfiguration::new().with("text", BindingSpec::property("since")),
        );

        let knows = store.edges().get("KNOWS").unwrap();
        assert!(knows.contains("label"));
        assert!(!knows.contains("text"));
    }

    #[test]
    fn deleting_unknown_configurations_is_a_noop() {
        let mut store = ConfigurationStore::new();
        store.set_node_configuration("Person", TypeConfiguration::new());
        store.add_parent_relationship("WORKS_IN", false);

        store.delete_node_configuration("Movie");
        store.delete_edge_configuration("ACTED_IN");
        store.delete_parent_relationship("REPORTS_TO");

        assert_eq!(store.nodes().len(), 1);
        assert!(store.edges().is_empty());
        assert_eq!(store.parent_relationships().len(), 1);
    }

    #[test]
    fn delete_configurations_removes_entries() {
        let mut store = ConfigurationStore::new();
        store.set_node_configuration("Person", TypeConfiguration::new());
        store.set_edge_configuration("KNOWS", TypeConfiguration::new());

        store.delete_node_configuration("Person");
        store.delete_edge_configuration("KNOWS");

        assert!(store.nodes().is_empty());
        assert!(store.edges().is_empty());
    }

    // ========== Parent Relationship Tests ==========

    #[test]
    fn add_parent_relationship_has_set_semantics() {
        let mut store = ConfigurationStore::new();
        store.add_parent_relationship("REPORTS_TO", false);
        store.add_parent_relationship("REPORTS_TO", false);
        store.add_parent_relationship("REPORTS_TO", true);

        assert_eq!(
            store.parent_relationships(),
            &[
                ParentRelationship::new("REPORTS_TO", false),
                ParentRelationship::new("REPORTS_TO", true),
            ]
        );
    }

    #[test]
    fn delete_parent_relationship_removes_all_orientations() {
        let mut store = ConfigurationStore::new();
        store.add_parent_relationship("REPORTS_TO", false);
        store.add_parent_relationship("MEMBER_OF", false);
        store.add_parent_relationship("REPORTS_TO", true);

        store.delete_parent_relationship("REPORTS_TO");

        assert_eq!(
            store.parent_relationships(),
            &[ParentRelationship::new("MEMBER_OF", false)]
        );
    }

    #[test]
    fn snapshot_is_independent_of_later_changes() {
        let mut store = ConfigurationStore::new();
        store.set_node_configuration("Person", TypeConfiguration::new());
        let snapshot = store.snapshot();

        store.delete_node_configuration("Person");

        assert!(snapshot.nodes.contains("Person"));
        assert!(!store.nodes().contains("Person"));
    }
}
