//! Session controller and the show pipeline
//!
//! A [`GraphSession`] owns the configuration store, the query collaborator and the display
//! settings. Every [`GraphSession::show`] call runs one synchronous pipeline:
//!
//! 1. run the query (plus the autocomplete query when enabled)
//! 2. snapshot the configuration and synthesize group nodes
//! 3. install a resolution function for every node, relationship and heat slot
//! 4. fold parent relationships into the parent slot
//! 5. select the layout and show
//!
//! Configuration changes need `&mut self`, as does `show`, so they can never interleave with a
//! pass in flight.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::binding::{BindingSpec, ResolutionFn, attributes};
use crate::graph::{Graph, GraphError, Node};
use crate::grouping::synthesize_group_nodes;
use crate::hierarchy::fold_hierarchy;
use crate::query::{Autocomplete, QueryError, QueryParameters, QueryRunner, autocomplete_query};
use crate::render::{EdgeSlot, GraphLayout, NodeSlot, RenderError, Renderer};
use crate::resolver::{BindingResolver, evaluate_cell_binding};
use crate::store::ConfigurationStore;

/// Errors aborting a show pipeline
#[derive(Error, Debug)]
pub enum SessionError {
    /// No query collaborator is attached
    #[error("no query runner specified")]
    MissingQueryRunner,

    /// The query collaborator failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The query result violates the element contract
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The renderer failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Session-level controller owning configuration and settings
pub struct GraphSession<R: Renderer + Default> {
    store: ConfigurationStore,
    query_runner: Option<Box<dyn QueryRunner>>,
    autocomplete: Autocomplete,
    layout: GraphLayout,
    node_cell: Option<BindingSpec>,
    view: Option<R>,
}

impl<R: Renderer + Default> Default for GraphSession<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Renderer + Default> GraphSession<R> {
    /// Create a session without a query runner
    pub fn new() -> Self {
        Self {
            store: ConfigurationStore::new(),
            query_runner: None,
            autocomplete: Autocomplete::Disabled,
            layout: GraphLayout::default(),
            node_cell: None,
            view: None,
        }
    }

    /// Builder-style query runner setter
    pub fn with_query_runner(mut self, runner: impl QueryRunner + 'static) -> Self {
        self.set_query_runner(runner);
        self
    }

    /// Attach the query collaborator
    pub fn set_query_runner(&mut self, runner: impl QueryRunner + 'static) {
        self.query_runner = Some(Box::new(runner));
    }

    /// Whether a query collaborator is attached
    pub fn has_query_runner(&self) -> bool {
        self.query_runner.is_some()
    }

    /// The attached query collaborator
    pub fn query_runner(&self) -> Option<&dyn QueryRunner> {
        self.query_runner.as_deref()
    }

    /// The configuration store
    pub fn configuration(&self) -> &ConfigurationStore {
        &self.store
    }

    /// Mutable access to the configuration store
    pub fn configuration_mut(&mut self) -> &mut ConfigurationStore {
        &mut self.store
    }

    /// Set relationship autocompletion
    pub fn set_autocomplete_relationships(&mut self, autocomplete: impl Into<Autocomplete>) {
        self.autocomplete = autocomplete.into();
    }

    /// Current relationship autocompletion
    pub fn autocomplete_relationships(&self) -> &Autocomplete {
        &self.autocomplete
    }

    /// Set the default layout
    pub fn set_layout(&mut self, layout: GraphLayout) {
        self.layout = layout;
    }

    /// Default layout
    pub fn layout(&self) -> GraphLayout {
        self.layout
    }

    /// Set the node cell binding (resolving to `[row, column]`)
    pub fn set_node_cell_mapping(&mut self, binding: BindingSpec) {
        self.node_cell = Some(binding);
    }

    /// Current node cell binding
    pub fn node_cell_mapping(&self) -> Option<&BindingSpec> {
        self.node_cell.as_ref()
    }

    /// Remove the node cell binding
    pub fn delete_node_cell_mapping(&mut self) {
        self.node_cell = None;
    }

    /// The most recently shown view
    pub fn view(&self) -> Option<&R> {
        self.view.as_ref()
    }

    /// Mutable access to the most recently shown view
    pub fn view_mut(&mut self) -> Option<&mut R> {
        self.view.as_mut()
    }

    /// Ids of the nodes selected in the most recently shown view
    pub fn selected_node_ids(&self) -> Vec<String> {
        self.view
            .as_ref()
            .map(|view| view.selection().nodes.into_iter().map(|n| n.id).collect())
            .unwrap_or_default()
    }

    /// Ids of the relationships selected in the most recently shown view
    pub fn selected_relationship_ids(&self) -> Vec<String> {
        self.view
            .as_ref()
            .map(|view| view.selection().edges.into_iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    /// Run `query` and show its result.
    ///
    /// `layout` overrides the session default for this call. Nothing is shown when any stage
    /// fails.
    pub fn show(
        &mut self,
        query: &str,
        layout: Option<GraphLayout>,
        parameters: &QueryParameters,
    ) -> Result<&R, SessionError> {
        let runner = self
            .query_runner
            .as_deref_mut()
            .ok_or(SessionError::MissingQueryRunner)?;
        let graph = fetch(runner, query, parameters, &self.autocomplete)?;
        graph.validate()?;

        let view = self.build_view(graph, layout.unwrap_or(self.layout))?;
        let view: &R = self.view.insert(view);
        Ok(view)
    }

    fn build_view(&self, graph: Graph, layout: GraphLayout) -> Result<R, SessionError> {
        let snapshot = self.store.snapshot();
        let mut node_table = snapshot.nodes;
        let nodes = synthesize_group_nodes(&graph.nodes, &mut node_table)?;
        let node_table = Arc::new(node_table);
        let edge_table = Arc::new(snapshot.edges);

        let mut view = R::default();
        view.set_nodes(nodes);
        view.set_edges(graph.edges);

        for slot in NodeSlot::CONFIGURABLE {
            let default = view.default_node_binding(slot);
            let resolver = BindingResolver::new(slot.attribute(), Arc::clone(&node_table), default);
            view.set_node_binding(slot, resolver.into_resolution_fn());
        }
        let parent = BindingResolver::new(
            attributes::PARENT_CONFIGURATION,
            Arc::clone(&node_table),
            view.default_node_binding(NodeSlot::Parent),
        );
        view.set_node_binding(NodeSlot::Parent, parent.into_resolution_fn());

        for slot in EdgeSlot::CONFIGURABLE {
            let default = view.default_edge_binding(slot);
            let resolver = BindingResolver::new(slot.attribute(), Arc::clone(&edge_table), default);
            view.set_edge_binding(slot, resolver.into_resolution_fn());
        }

        // heat reads both tables; relationship entries win on a shared type-label
        let heat_table = Arc::new(node_table.merged(&edge_table));
        let node_heat = BindingResolver::new(
            attributes::HEAT,
            Arc::clone(&heat_table),
            view.default_node_binding(NodeSlot::Heat),
        );
        let edge_heat = BindingResolver::new(
            attributes::HEAT,
            heat_table,
            view.default_edge_binding(EdgeSlot::Heat),
        );
        view.set_node_binding(NodeSlot::Heat, node_heat.into_resolution_fn());
        view.set_edge_binding(EdgeSlot::Heat, edge_heat.into_resolution_fn());

        let fold = fold_hierarchy(view.edges(), &snapshot.parent_relationships)?;
        let previous = view
            .node_binding(NodeSlot::Parent)
            .unwrap_or_else(null_resolution);
        view.set_node_binding(NodeSlot::Parent, fold.chain(previous));
        debug!(
            folded = fold.folded,
            parents = fold.node_to_parent.len(),
            "installed parent chain"
        );
        view.set_edges(fold.edges);

        view.set_layout(layout);

        if let Some(cell) = self.node_cell.clone() {
            view.set_node_binding(
                NodeSlot::Cell,
                Arc::new(move |_: usize, node: &Node| {
                    Ok::<_, GraphError>(evaluate_cell_binding(&cell, node))
                }),
            );
        }

        view.show()?;
        Ok(view)
    }
}

fn fetch(
    runner: &mut dyn QueryRunner,
    query: &str,
    parameters: &QueryParameters,
    autocomplete: &Autocomplete,
) -> Result<Graph, QueryError> {
    let graph = runner.run_query(query, parameters)?;
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "query returned"
    );
    if !autocomplete.is_enabled() {
        return Ok(graph);
    }

    let completion = autocomplete_query(&graph.node_ids(), autocomplete);
    let graph = runner.run_query(&completion.text, &completion.parameters)?;
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "autocomplete query returned"
    );
    Ok(graph)
}

fn null_resolution() -> ResolutionFn<Node> {
    Arc::new(|_: usize, _: &Node| Ok::<_, GraphError>(Value::Null))
}
