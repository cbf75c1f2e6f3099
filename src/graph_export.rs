//! Dependency graph export for visualization and debugging.
//!
//! A [`DependencyGraph`] is a plain-data snapshot of a container's bindings:
//! one node per bound key, one edge per bound input and one entry per input
//! that has no binding. Nodes carry the state of their memo cell in the root
//! scope, so a snapshot taken after a failed request shows where it failed.
//! Snapshots render as Graphviz DOT or Mermaid, and as JSON with the
//! `graph-export` feature.

use std::fmt::Write as _;

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeCache};
use crate::registration::InputKind;
use crate::resolver::{Resolver, Unit};
use crate::scope::Scope;

/// Memo state of a node in the root scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "graph-export", serde(rename_all = "snake_case"))]
pub enum NodeState {
    Unvisited,
    Resolved,
    Failed,
    /// Values live in scope instances other than root.
    PerScope,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    pub id: usize,
    pub key: String,
    pub kind: String,
    pub lifetime: String,
    pub location: String,
    pub state: NodeState,
    pub on_cycle: bool,
    pub members: usize,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    /// Node that declares the input.
    pub from: usize,
    /// Node bound to the input's key.
    pub to: usize,
    pub kind: InputKind,
}

/// A declared input whose key has no binding.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct MissingInput {
    pub from: usize,
    pub key: String,
    pub kind: InputKind,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub scoped_slots: usize,
    pub has_cycles: bool,
    pub version: String,
}

/// Snapshot of a binding graph.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{location, Provider, Registrations};
/// use std::sync::Arc;
///
/// struct Config;
/// struct Server;
///
/// let mut regs = Registrations::new();
/// regs.supply(Config, location!("config"));
/// regs.provide(Provider::from_fn(location!("server"), |_c: Arc<Config>| Server));
/// let container = regs.build().unwrap();
///
/// let graph = container.dependency_graph();
/// assert_eq!(graph.nodes.len(), 2);
/// assert_eq!(graph.edges.len(), 1);
///
/// let dot = graph.to_dot();
/// assert!(dot.starts_with("digraph dependencies {"));
/// assert!(dot.contains("->"));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub missing: Vec<MissingInput>,
    pub metadata: GraphMetadata,
}

impl DependencyGraph {
    pub(crate) fn from_graph(graph: &Graph, root: Option<&Scope>) -> Self {
        let mut nodes = Vec::with_capacity(graph.len());
        let mut edges = Vec::new();
        let mut missing = Vec::new();

        for (id, node) in graph.nodes() {
            let (kind, members) = match &node.resolver {
                Resolver::Single(Unit::Supplied(_)) => ("supplied", 1),
                Resolver::Single(Unit::Constructor(_)) => ("constructor", 1),
                Resolver::Single(Unit::Scoped(_)) => ("scoped", 1),
                Resolver::Group(group) => ("group", group.members.len()),
            };
            let lifetime = match node.resolver.scope() {
                Some(scope) => format!("scoped({})", scope),
                None => "container".to_string(),
            };
            let cell = match (&node.cache, root) {
                (NodeCache::Root(cell), _) => Some(cell),
                (NodeCache::Scoped(_), Some(scope)) if node.resolver.scope() == Some(scope.name()) => {
                    Some(node.cache.cell(scope))
                }
                (NodeCache::Scoped(_), _) => None,
            };
            let state = match cell.map(|cell| cell.get()) {
                None => NodeState::PerScope,
                Some(None) => NodeState::Unvisited,
                Some(Some(Ok(_))) => NodeState::Resolved,
                Some(Some(Err(_))) => NodeState::Failed,
            };
            nodes.push(GraphNode {
                id: id.index(),
                key: node.key.to_string(),
                kind: kind.to_string(),
                lifetime,
                location: node.resolver.describe_location(),
                state,
                on_cycle: node.on_cycle,
                members,
            });

            for input in node.resolver.inputs() {
                match graph.lookup(&input.key) {
                    Some(target) => {
                        let duplicate = edges
                            .iter()
                            .any(|e: &GraphEdge| e.from == id.index() && e.to == target.index());
                        if !duplicate {
                            edges.push(GraphEdge {
                                from: id.index(),
                                to: target.index(),
                                kind: input.kind,
                            });
                        }
                    }
                    None => missing.push(MissingInput {
                        from: id.index(),
                        key: input.key.to_string(),
                        kind: input.kind,
                    }),
                }
            }
        }

        let metadata = GraphMetadata {
            node_count: nodes.len(),
            edge_count: edges.len(),
            scoped_slots: graph.scoped_slots(),
            has_cycles: nodes.iter().any(|n| n.on_cycle),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Self {
            nodes,
            edges,
            missing,
            metadata,
        }
    }

    /// Graphviz rendering. Cycle members are drawn red, failed nodes filled
    /// red, and unbound inputs as dashed placeholder nodes.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph dependencies {\n");
        out.push_str("  rankdir=LR;\n");
        out.push_str("  node [shape=box, style=filled, fillcolor=white];\n\n");

        for node in &self.nodes {
            let shape = if node.kind == "group" { "box3d" } else { "box" };
            let fill = match node.state {
                NodeState::Resolved => "lightgreen",
                NodeState::Failed => "lightcoral",
                NodeState::PerScope => "lightblue",
                NodeState::Unvisited => "white",
            };
            let color = if node.on_cycle { "red" } else { "black" };
            let _ = writeln!(
                out,
                "  n{} [label=\"{}\\n{}\", shape={}, fillcolor={}, color={}];",
                node.id,
                escape(&node.key),
                escape(&node.lifetime),
                shape,
                fill,
                color
            );
        }
        for (i, input) in self.missing.iter().enumerate() {
            let _ = writeln!(
                out,
                "  missing{} [label=\"{}\", style=dashed, color=red];",
                i,
                escape(&input.key)
            );
        }

        out.push('\n');
        for edge in &self.edges {
            let _ = writeln!(out, "  n{} -> n{} [style={}];", edge.from, edge.to, edge_style(edge.kind));
        }
        for (i, input) in self.missing.iter().enumerate() {
            let _ = writeln!(out, "  n{} -> missing{} [style={}];", input.from, i, edge_style(input.kind));
        }
        out.push_str("}\n");
        out
    }

    /// Mermaid flowchart rendering.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph LR\n");
        for node in &self.nodes {
            let _ = writeln!(out, "  n{}[\"{}\"]", node.id, node.key.replace('"', "'"));
        }
        for edge in &self.edges {
            let arrow = match edge.kind {
                InputKind::Required => "-->",
                InputKind::Optional => "-.->",
                InputKind::Group => "==>",
            };
            let _ = writeln!(out, "  n{} {} n{}", edge.from, arrow, edge.to);
        }
        out
    }

    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.key == key)
    }
}

fn edge_style(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Required => "solid",
        InputKind::Optional => "dashed",
        InputKind::Group => "bold",
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
