//! Rendering collaborator interface and the bundled JSON renderer
//!
//! A [`Renderer`] exposes one resolution slot per visual attribute, a default binding per slot,
//! node/relationship list replacement, a layout selector, a `show` trigger and a selection
//! query. [`GraphView`] implements it by evaluating every slot into a [`RenderedGraph`]
//! document.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::binding::{DefaultBinding, ResolutionFn};
use crate::config::ConfigError;
use crate::graph::{Edge, Element, GraphError, Node};

/// Default colors, picked per type-label
pub mod colors {
    /// Blue (#4A90D9)
    pub const BLUE: &str = "#4A90D9";
    /// Green (#50C878)
    pub const GREEN: &str = "#50C878";
    /// Purple (#9B59B6)
    pub const PURPLE: &str = "#9B59B6";
    /// Orange (#E67E22)
    pub const ORANGE: &str = "#E67E22";
    /// Teal (#15AFAC)
    pub const TEAL: &str = "#15AFAC";
    /// Red (#E74C3C)
    pub const RED: &str = "#E74C3C";

    /// Palette cycled through by type-label
    pub const PALETTE: [&str; 6] = [TEAL, BLUE, GREEN, PURPLE, ORANGE, RED];
}

/// Errors raised while rendering
#[derive(Error, Debug)]
pub enum RenderError {
    /// A resolution function failed for some element
    #[error("binding evaluation failed: {0}")]
    Binding(#[from] GraphError),
}

/// Node resolution slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeSlot {
    Coordinate,
    Color,
    Size,
    Type,
    Styles,
    ScaleFactor,
    Position,
    Layout,
    Property,
    Label,
    Parent,
    Heat,
    Cell,
}

impl NodeSlot {
    /// Slots filled from node configurations under their own attribute name
    pub const CONFIGURABLE: [NodeSlot; 10] = [
        NodeSlot::Coordinate,
        NodeSlot::Color,
        NodeSlot::Size,
        NodeSlot::Type,
        NodeSlot::Styles,
        NodeSlot::ScaleFactor,
        NodeSlot::Position,
        NodeSlot::Layout,
        NodeSlot::Property,
        NodeSlot::Label,
    ];

    /// Configuration attribute name of the slot
    pub fn attribute(self) -> &'static str {
        match self {
            NodeSlot::Coordinate => "coordinate",
            NodeSlot::Color => "color",
            NodeSlot::Size => "size",
            NodeSlot::Type => "type",
            NodeSlot::Styles => "styles",
            NodeSlot::ScaleFactor => "scale_factor",
            NodeSlot::Position => "position",
            NodeSlot::Layout => "layout",
            NodeSlot::Property => "property",
            NodeSlot::Label => "label",
            NodeSlot::Parent => "parent",
            NodeSlot::Heat => "heat",
            NodeSlot::Cell => "cell",
        }
    }
}

/// Relationship resolution slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeSlot {
    Color,
    ThicknessFactor,
    Property,
    Label,
    Heat,
}

impl EdgeSlot {
    /// Slots filled from relationship configurations under their own attribute name
    pub const CONFIGURABLE: [EdgeSlot; 4] = [
        EdgeSlot::Color,
        EdgeSlot::ThicknessFactor,
        EdgeSlot::Property,
        EdgeSlot::Label,
    ];

    /// Configuration attribute name of the slot
    pub fn attribute(self) -> &'static str {
        match self {
            EdgeSlot::Color => "color",
            EdgeSlot::ThicknessFactor => "thickness_factor",
            EdgeSlot::Property => "property",
            EdgeSlot::Label => "label",
            EdgeSlot::Heat => "heat",
        }
    }
}

/// Automatic graph arrangement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphLayout {
    Circular,
    Hierarchic,
    #[default]
    Organic,
    InteractiveOrganicLayout,
    Orthogonal,
    Radial,
    Tree,
    Map,
    OrthogonalEdgeRouter,
    OrganicEdgeRouter,
}

impl GraphLayout {
    /// Every supported layout
    pub const ALL: [GraphLayout; 10] = [
        GraphLayout::Circular,
        GraphLayout::Hierarchic,
        GraphLayout::Organic,
        GraphLayout::InteractiveOrganicLayout,
        GraphLayout::Orthogonal,
        GraphLayout::Radial,
        GraphLayout::Tree,
        GraphLayout::Map,
        GraphLayout::OrthogonalEdgeRouter,
        GraphLayout::OrganicEdgeRouter,
    ];

    /// Name of the layout as used in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            GraphLayout::Circular => "circular",
            GraphLayout::Hierarchic => "hierarchic",
            GraphLayout::Organic => "organic",
            GraphLayout::InteractiveOrganicLayout => "interactive_organic_layout",
            GraphLayout::Orthogonal => "orthogonal",
            GraphLayout::Radial => "radial",
            GraphLayout::Tree => "tree",
            GraphLayout::Map => "map",
            GraphLayout::OrthogonalEdgeRouter => "orthogonal_edge_router",
            GraphLayout::OrganicEdgeRouter => "organic_edge_router",
        }
    }
}

impl fmt::Display for GraphLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownLayout(s.to_string()))
    }
}

/// Currently selected elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The rendering collaborator
pub trait Renderer {
    /// Library default for a node slot
    fn default_node_binding(&self, slot: NodeSlot) -> DefaultBinding<Node>;

    /// Library default for a relationship slot
    fn default_edge_binding(&self, slot: EdgeSlot) -> DefaultBinding<Edge>;

    /// Current node list
    fn nodes(&self) -> &[Node];

    /// Current relationship list
    fn edges(&self) -> &[Edge];

    /// Replace the node list
    fn set_nodes(&mut self, nodes: Vec<Node>);

    /// Replace the relationship list
    fn set_edges(&mut self, edges: Vec<Edge>);

    /// Resolution function installed in a node slot
    fn node_binding(&self, slot: NodeSlot) -> Option<ResolutionFn<Node>>;

    /// Install a resolution function in a node slot
    fn set_node_binding(&mut self, slot: NodeSlot, binding: ResolutionFn<Node>);

    /// Resolution function installed in a relationship slot
    fn edge_binding(&self, slot: EdgeSlot) -> Option<ResolutionFn<Edge>>;

    /// Install a resolution function in a relationship slot
    fn set_edge_binding(&mut self, slot: EdgeSlot, binding: ResolutionFn<Edge>);

    /// Select the automatic layout
    fn set_layout(&mut self, layout: GraphLayout);

    /// Display the graph
    fn show(&mut self) -> Result<(), RenderError>;

    /// Elements currently selected by the user
    fn selection(&self) -> Selection;
}

/// One node with every slot evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub label: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub color: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub size: Value,
    #[serde(default, rename = "type", skip_serializing_if = "Value::is_null")]
    pub node_type: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub styles: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub scale_factor: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub position: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub coordinate: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub layout: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parent: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub heat: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub cell: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub property: Value,
}

/// One relationship with every slot evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedEdge {
    pub id: String,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub label: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub color: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub thickness_factor: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub heat: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub property: Value,
}

/// Complete rendered document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedGraph {
    /// Selected automatic layout
    pub layout: GraphLayout,

    /// All nodes, group nodes included
    pub nodes: Vec<RenderedNode>,

    /// Rendered relationships (folded ones excluded)
    pub edges: Vec<RenderedEdge>,

    /// Version of the document format
    pub format_version: String,
}

impl RenderedGraph {
    /// Format version constant
    pub const FORMAT_VERSION: &'static str = "1.0";
}

/// Stable palette color for a type-label
pub fn palette_color(type_label: &str) -> &'static str {
    // FNV-1a, stable across runs and platforms
    let hash = type_label
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        });
    colors::PALETTE[(hash % colors::PALETTE.len() as u64) as usize]
}

fn type_color<E: Element>(element: &E) -> Value {
    element
        .type_label()
        .map_or(Value::String(colors::TEAL.to_string()), |label| {
            Value::String(palette_color(label).to_string())
        })
}

fn type_text<E: Element>(element: &E) -> Value {
    element
        .type_label()
        .map_or(Value::Null, |label| Value::String(label.to_string()))
}

fn properties_value<E: Element>(element: &E) -> Value {
    Value::Object(element.properties().clone())
}

/// Nodes per row of the default grid placement
const GRID_COLUMNS: usize = 10;

/// Spacing of the default grid placement
const GRID_SPACING: f64 = 100.0;

/// Renderer producing a [`RenderedGraph`] document
#[derive(Default)]
pub struct GraphView {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_bindings: BTreeMap<NodeSlot, ResolutionFn<Node>>,
    edge_bindings: BTreeMap<EdgeSlot, ResolutionFn<Edge>>,
    layout: GraphLayout,
    selected_nodes: Vec<String>,
    selected_edges: Vec<String>,
    rendered: Option<RenderedGraph>,
}

impl GraphView {
    /// Create an empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected layout
    pub fn layout(&self) -> GraphLayout {
        self.layout
    }

    /// The document produced by the last `show`
    pub fn rendered(&self) -> Option<&RenderedGraph> {
        self.rendered.as_ref()
    }

    /// Mark elements as selected (the interactive part of a real widget)
    pub fn select(&mut self, node_ids: &[&str], edge_ids: &[&str]) {
        self.selected_nodes = node_ids.iter().map(|id| id.to_string()).collect();
        self.selected_edges = edge_ids.iter().map(|id| id.to_string()).collect();
    }

    fn eval_node(&self, slot: NodeSlot, index: usize, node: &Node) -> Result<Value, GraphError> {
        match self.node_bindings.get(&slot) {
            Some(binding) => binding(index, node),
            None => Ok(self.default_node_binding(slot).call(index, node)),
        }
    }

    fn eval_edge(&self, slot: EdgeSlot, index: usize, edge: &Edge) -> Result<Value, GraphError> {
        match self.edge_bindings.get(&slot) {
            Some(binding) => binding(index, edge),
            None => Ok(self.default_edge_binding(slot).call(index, edge)),
        }
    }

    fn render_node(&self, index: usize, node: &Node) -> Result<RenderedNode, GraphError> {
        Ok(RenderedNode {
            id: node.id.clone(),
            label: self.eval_node(NodeSlot::Label, index, node)?,
            color: self.eval_node(NodeSlot::Color, index, node)?,
            size: self.eval_node(NodeSlot::Size, index, node)?,
            node_type: self.eval_node(NodeSlot::Type, index, node)?,
            styles: self.eval_node(NodeSlot::Styles, index, node)?,
            scale_factor: self.eval_node(NodeSlot::ScaleFactor, index, node)?,
            position: self.eval_node(NodeSlot::Position, index, node)?,
            coordinate: self.eval_node(NodeSlot::Coordinate, index, node)?,
            layout: self.eval_node(NodeSlot::Layout, index, node)?,
            parent: self.eval_node(NodeSlot::Parent, index, node)?,
            heat: self.eval_node(NodeSlot::Heat, index, node)?,
            cell: self.eval_node(NodeSlot::Cell, index, node)?,
            property: self.eval_node(NodeSlot::Property, index, node)?,
        })
    }

    fn render_edge(&self, index: usize, edge: &Edge) -> Result<RenderedEdge, GraphError> {
        Ok(RenderedEdge {
            id: edge.id.clone(),
            start: edge.start.clone(),
            end: edge.end.clone(),
            label: self.eval_edge(EdgeSlot::Label, index, edge)?,
            color: self.eval_edge(EdgeSlot::Color, index, edge)?,
            thickness_factor: self.eval_edge(EdgeSlot::ThicknessFactor, index, edge)?,
            heat: self.eval_edge(EdgeSlot::Heat, index, edge)?,
            property: self.eval_edge(EdgeSlot::Property, index, edge)?,
        })
    }
}

impl Renderer for GraphView {
    fn default_node_binding(&self, slot: NodeSlot) -> DefaultBinding<Node> {
        match slot {
            NodeSlot::Color => DefaultBinding::plain(type_color::<Node>),
            NodeSlot::Size => DefaultBinding::plain(|_: &Node| json!([55.0, 55.0])),
            NodeSlot::Styles => DefaultBinding::plain(|_: &Node| json!({})),
            NodeSlot::ScaleFactor => DefaultBinding::plain(|_: &Node| json!(1.0)),
            NodeSlot::Position => DefaultBinding::indexed(|index, _: &Node| {
                let column = (index % GRID_COLUMNS) as f64;
                let row = (index / GRID_COLUMNS) as f64;
                json!([column * GRID_SPACING, row * GRID_SPACING])
            }),
            NodeSlot::Label => DefaultBinding::plain(type_text::<Node>),
            NodeSlot::Property => DefaultBinding::plain(properties_value::<Node>),
            NodeSlot::Coordinate
            | NodeSlot::Type
            | NodeSlot::Layout
            | NodeSlot::Parent
            | NodeSlot::Heat
            | NodeSlot::Cell => DefaultBinding::none(),
        }
    }

    fn default_edge_binding(&self, slot: EdgeSlot) -> DefaultBinding<Edge> {
        match slot {
            EdgeSlot::Color => DefaultBinding::plain(type_color::<Edge>),
            EdgeSlot::ThicknessFactor => DefaultBinding::plain(|_: &Edge| json!(1.0)),
            EdgeSlot::Property => DefaultBinding::plain(properties_value::<Edge>),
            EdgeSlot::Label => DefaultBinding::plain(type_text::<Edge>),
            EdgeSlot::Heat => DefaultBinding::none(),
        }
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
    }

    fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
    }

    fn node_binding(&self, slot: NodeSlot) -> Option<ResolutionFn<Node>> {
        self.node_bindings.get(&slot).cloned()
    }

    fn set_node_binding(&mut self, slot: NodeSlot, binding: ResolutionFn<Node>) {
        self.node_bindings.insert(slot, binding);
    }

    fn edge_binding(&self, slot: EdgeSlot) -> Option<ResolutionFn<Edge>> {
        self.edge_bindings.get(&slot).cloned()
    }

    fn set_edge_binding(&mut self, slot: EdgeSlot, binding: ResolutionFn<Edge>) {
        self.edge_bindings.insert(slot, binding);
    }

    fn set_layout(&mut self, layout: GraphLayout) {
        self.layout = layout;
    }

    fn show(&mut self) -> Result<(), RenderError> {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| self.render_node(index, node))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = self
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| self.render_edge(index, edge))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            layout = %self.layout,
            "rendered graph"
        );

        self.rendered = Some(RenderedGraph {
            layout: self.layout,
            nodes,
            edges,
            format_version: RenderedGraph::FORMAT_VERSION.to_string(),
        });
        Ok(())
    }

    fn selection(&self) -> Selection {
        Selection {
            nodes: self
                .nodes
                .iter()
                .filter(|n| self.selected_nodes.contains(&n.id))
                .cloned()
                .collect(),
            edges: self
                .edges
                .iter()
                .filter(|e| self.selected_edges.contains(&e.id))
                .cloned()
                .collect(),
        }
    }
}
