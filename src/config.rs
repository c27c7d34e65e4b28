//! Bindings document loading
//!
//! Reads node/relationship configurations and session settings from YAML or JSON. The format
//! is picked from the file extension.
//!
//! ```yaml
//! nodes:
//!   Person:
//!     text: name
//!     color: "#4A90D9"
//!     parent_configuration: dept
//!   "*":
//!     size: [40, 40]
//! relationships:
//!   KNOWS:
//!     thickness_factor: 2
//! parent_relationships:
//!   - REPORTS_TO
//!   - { type: MEMBER_OF, reversed: true }
//! autocomplete_relationships: [KNOWS]
//! layout: hierarchic
//! node_cell: cell
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::binding::{BindingSpec, TypeConfiguration};
use crate::query::Autocomplete;
use crate::render::{GraphLayout, Renderer};
use crate::session::GraphSession;

/// Errors raised while reading or applying configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The autocompletion setting has an unsupported shape
    #[error("autocomplete_relationships must be a bool, a string, or a list of strings (got {0})")]
    InvalidAutocomplete(String),

    /// The layout name is not supported
    #[error("unknown graph layout: {0}")]
    UnknownLayout(String),

    /// The file format is not supported
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine configuration format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed
    #[error("parse error: {0}")]
    Parse(String),
}

/// A parent relationship entry: a bare type, or a type with orientation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParentRelationshipEntry {
    Type(String),
    Oriented {
        #[serde(rename = "type")]
        relationship_type: String,
        #[serde(default)]
        reversed: bool,
    },
}

impl ParentRelationshipEntry {
    fn into_parts(self) -> (String, bool) {
        match self {
            Self::Type(relationship_type) => (relationship_type, false),
            Self::Oriented {
                relationship_type,
                reversed,
            } => (relationship_type, reversed),
        }
    }
}

/// Parsed bindings document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingsDocument {
    /// Node configurations keyed by node label (or `*`)
    #[serde(default)]
    pub nodes: BTreeMap<String, Map<String, Value>>,

    /// Relationship configurations keyed by relationship type (or `*`)
    #[serde(default)]
    pub relationships: BTreeMap<String, Map<String, Value>>,

    /// Relationship types folded into parent/child nesting
    #[serde(default)]
    pub parent_relationships: Vec<ParentRelationshipEntry>,

    /// Relationship autocompletion: bool, type, or list of types
    #[serde(default)]
    pub autocomplete_relationships: Option<Value>,

    /// Default layout name
    #[serde(default)]
    pub layout: Option<String>,

    /// Node cell binding (property name or constant `[row, column]`)
    #[serde(default)]
    pub node_cell: Option<Value>,
}

impl BindingsDocument {
    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a document, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnknownExtension(path.display().to_string()))?;

        let content = fs::read_to_string(path)?;
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Check the settings without applying them
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(value) = &self.autocomplete_relationships {
            Autocomplete::from_value(value)?;
        }
        if let Some(layout) = &self.layout {
            layout.parse::<GraphLayout>()?;
        }
        Ok(())
    }

    /// Apply every configuration and setting to a session
    pub fn apply<R: Renderer + Default>(
        self,
        session: &mut GraphSession<R>,
    ) -> Result<(), ConfigError> {
        // settings first, so a bad document leaves the store untouched
        let autocomplete = self
            .autocomplete_relationships
            .as_ref()
            .map(Autocomplete::from_value)
            .transpose()?;
        let layout = self
            .layout
            .as_deref()
            .map(str::parse::<GraphLayout>)
            .transpose()?;

        if let Some(autocomplete) = autocomplete {
            session.set_autocomplete_relationships(autocomplete);
        }
        if let Some(layout) = layout {
            session.set_layout(layout);
        }
        if let Some(cell) = self.node_cell {
            session.set_node_cell_mapping(BindingSpec::from_value("cell", cell));
        }

        let store = session.configuration_mut();
        for (type_label, attributes) in self.nodes {
            store.set_node_configuration(type_label, type_configuration(attributes));
        }
        for (type_label, attributes) in self.relationships {
            store.set_edge_configuration(type_label, type_configuration(attributes));
        }
        for entry in self.parent_relationships {
            let (relationship_type, reversed) = entry.into_parts();
            store.add_parent_relationship(relationship_type, reversed);
        }

        debug!(
            nodes = store.nodes().len(),
            relationships = store.edges().len(),
            parent_relationships = store.parent_relationships().len(),
            "applied bindings document"
        );
        Ok(())
    }
}

/// Convert a document mapping into a type configuration
pub fn type_configuration(attributes: Map<String, Value>) -> TypeConfiguration {
    attributes
        .into_iter()
        .map(|(attribute, value)| {
            let spec = BindingSpec::from_value(&attribute, value);
            (attribute, spec)
        })
        .collect()
}
