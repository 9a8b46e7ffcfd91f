use std::collections::HashMap;

use libris_core::{Edge, EdgeType, Node};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryNode {
    pub id: String,
    pub title: String,
    pub author: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEdge {
    pub from_id: String,
    pub to_id: String,
    pub edge_type: EdgeType,
    pub strength: f32,
}

/// Compact graph description handed to the chat collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: u32,
    pub edge_count: u32,
    pub top_tags: Vec<CountEntry>,
    pub top_authors: Vec<CountEntry>,
    pub component_count: u32,
    pub isolated_node_ids: Vec<String>,
    pub nodes: Vec<SummaryNode>,
    pub edges: Vec<SummaryEdge>,
}

pub fn summarize(nodes: &[Node], edges: &[Edge], limit: usize) -> GraphSummary {
    let limit = limit.max(1);

    let top_tags = top_counts(
        nodes.iter().flat_map(|node| node.tags.iter().map(String::as_str)),
        limit,
    );
    let top_authors = top_counts(
        nodes
            .iter()
            .filter(|node| node.author_known)
            .map(|node| node.author.as_str()),
        limit,
    );

    let mut graph = UnGraph::<&str, ()>::new_undirected();
    let index_by_id = nodes
        .iter()
        .map(|node| (node.id.as_str(), graph.add_node(node.id.as_str())))
        .collect::<HashMap<_, _>>();
    for edge in edges {
        let (Some(from), Some(to)) = (
            index_by_id.get(edge.from_id.as_str()),
            index_by_id.get(edge.to_id.as_str()),
        ) else {
            continue;
        };
        if from != to {
            graph.update_edge(*from, *to, ());
        }
    }

    let isolated_node_ids = graph
        .node_indices()
        .filter(|index: &NodeIndex| graph.neighbors(*index).next().is_none())
        .map(|index| graph[index].to_owned())
        .collect::<Vec<_>>();

    GraphSummary {
        node_count: nodes.len() as u32,
        edge_count: edges.len() as u32,
        top_tags,
        top_authors,
        component_count: connected_components(&graph) as u32,
        isolated_node_ids,
        nodes: nodes
            .iter()
            .map(|node| SummaryNode {
                id: node.id.clone(),
                title: node.title.clone(),
                author: node.author.clone(),
                tags: node.tags.clone(),
            })
            .collect(),
        edges: edges
            .iter()
            .map(|edge| SummaryEdge {
                from_id: edge.from_id.clone(),
                to_id: edge.to_id.clone(),
                edge_type: edge.edge_type,
                strength: edge.strength,
            })
            .collect(),
    }
}

fn top_counts<'a>(values: impl Iterator<Item = &'a str>, limit: usize) -> Vec<CountEntry> {
    let mut counts = HashMap::<&str, u32>::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut ranked = counts.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, count)| CountEntry {
            name: name.to_owned(),
            count,
        })
        .collect()
}
