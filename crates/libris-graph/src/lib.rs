//! Relationship graph construction and the views derived from it: the base
//! edge set, filter/focus remapping, per-node connection breakdowns and the
//! compact summary handed to the chat collaborator.

use libris_core::{Breakdown, Edge, Node};
use rand::Rng;
use serde_json::Value;

mod builder;
mod explain;
mod remap;
mod summary;

pub use builder::{Graph, GraphBuilder, title_tokens};
pub use explain::ConnectionExplainer;
pub use remap::QueryRemapper;
pub use summary::{CountEntry, GraphSummary, SummaryEdge, SummaryNode, summarize};

/// Normalizes `records` and builds the base edge set with default weights.
pub fn build_graph<R: Rng + ?Sized>(records: &[Value], rng: &mut R) -> Graph {
    GraphBuilder::default().build_graph(records, rng)
}

/// Rebuilds the edge set over the nodes matching `filter_tags`, boosting
/// connections among nodes carrying `focus_tag`.
pub fn remap<R: Rng + ?Sized>(
    nodes: &[Node],
    filter_tags: &[String],
    focus_tag: Option<&str>,
    rng: &mut R,
) -> Vec<Edge> {
    QueryRemapper::default().remap(nodes, filter_tags, focus_tag, rng)
}

pub fn explain_connections(node_id: &str, nodes: &[Node], edges: &[Edge]) -> Breakdown {
    ConnectionExplainer::default().explain(node_id, nodes, edges)
}
