//! graphbind - visual binding resolution for query-result graphs.
//!
//! Resolves every visual attribute (color, size, label, grouping, heat, ...) of every node and
//! relationship from type-keyed configuration, synthesizes group nodes from parent bindings and
//! folds selected relationship types into parent/child nesting.

pub mod binding;
pub mod config;
pub mod graph;
pub mod grouping;
pub mod hierarchy;
pub mod query;
pub mod render;
pub mod resolver;
pub mod session;
pub mod store;

pub use binding::{BindingSpec, ConfigurationTable, TypeConfiguration};
pub use config::{BindingsDocument, ConfigError};
pub use graph::{Edge, Element, Graph, GraphError, Node};
pub use query::{Autocomplete, InMemoryGraph, QueryError, QueryParameters, QueryRunner};
pub use render::{GraphLayout, GraphView, RenderedGraph, Renderer};
pub use session::{GraphSession, SessionError};
pub use store::ConfigurationStore;
