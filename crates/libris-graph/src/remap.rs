use std::collections::HashMap;

use libris_config::RemapConfig;
use libris_core::{Edge, EdgeType, Node, non_negative, pair_key};
use rand::Rng;

use crate::builder::GraphBuilder;

/// Recomputes the edge set for a filtered population and optional focus tag.
#[derive(Debug, Clone, Default)]
pub struct QueryRemapper {
    builder: GraphBuilder,
    config: RemapConfig,
}

impl QueryRemapper {
    pub fn new(builder: GraphBuilder, config: RemapConfig) -> Self {
        Self { builder, config }
    }

    pub fn builder(&self) -> &GraphBuilder {
        &self.builder
    }

    pub fn remap<R: Rng + ?Sized>(
        &self,
        nodes: &[Node],
        filter_tags: &[String],
        focus_tag: Option<&str>,
        rng: &mut R,
    ) -> Vec<Edge> {
        let filters = filter_tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>();

        let population = if filters.is_empty() {
            nodes.to_vec()
        } else {
            nodes
                .iter()
                .filter(|node| filters.iter().any(|tag| node.has_tag_ignore_case(tag)))
                .cloned()
                .collect::<Vec<_>>()
        };

        let mut edges = self.builder.build_edges(&population, rng);

        let Some(focus) = focus_tag.map(str::trim).filter(|tag| !tag.is_empty()) else {
            return edges;
        };

        let focused = population
            .iter()
            .filter(|node| node.has_tag_ignore_case(focus))
            .collect::<Vec<_>>();

        let mut first_edge_by_pair = HashMap::<(String, String), usize>::new();
        for (index, edge) in edges.iter().enumerate() {
            let (left, right) = edge.pair_key();
            first_edge_by_pair
                .entry((left.to_owned(), right.to_owned()))
                .or_insert(index);
        }

        let mut boosted = 0usize;
        let mut created = 0usize;
        for (position, a) in focused.iter().enumerate() {
            for b in &focused[position + 1..] {
                if a.id == b.id {
                    continue;
                }
                let (left, right) = pair_key(a.id.as_str(), b.id.as_str());
                let key = (left.to_owned(), right.to_owned());

                if let Some(&index) = first_edge_by_pair.get(&key) {
                    let edge = &mut edges[index];
                    edge.strength = non_negative(edge.strength + self.config.focus_boost);
                    edge.reason = format!("{}; Enhanced by {focus} filter", edge.reason);
                    boosted += 1;
                } else {
                    first_edge_by_pair.insert(key, edges.len());
                    edges.push(Edge {
                        from_id: a.id.clone(),
                        to_id: b.id.clone(),
                        edge_type: EdgeType::Resonance,
                        strength: non_negative(self.config.focus_strength),
                        shared_attributes: vec![focus.to_owned()],
                        reason: format!("Connected by {focus}"),
                    });
                    created += 1;
                }
            }
        }

        tracing::debug!(
            population = population.len(),
            focused = focused.len(),
            boosted,
            created,
            "remapped graph"
        );
        edges
    }
}
