use std::collections::HashMap;

use libris_config::ExplainConfig;
use libris_core::{
    Breakdown, ConnectionEntry, Edge, EdgeType, EraBoundaries, NeighborScore, Node, infer_genre,
    non_negative,
};

#[derive(Debug, Clone, Default)]
pub struct ConnectionExplainer {
    config: ExplainConfig,
    eras: EraBoundaries,
}

#[derive(Debug)]
struct NeighborAggregate<'a> {
    id: &'a str,
    score: f32,
    best_type: EdgeType,
    best_strength: f32,
}

impl ConnectionExplainer {
    pub fn new(config: ExplainConfig, eras: EraBoundaries) -> Self {
        Self { config, eras }
    }

    /// Summarizes why `node_id` connects to its neighbours in `edges`.
    /// Unknown ids and isolated nodes yield an empty breakdown.
    pub fn explain(&self, node_id: &str, nodes: &[Node], edges: &[Edge]) -> Breakdown {
        let by_id = nodes
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect::<HashMap<_, _>>();
        if !by_id.contains_key(node_id) {
            tracing::debug!(node_id, "explain requested for unknown node");
            return Breakdown::empty(node_id);
        }

        let cap = self.config.list_cap.max(1);
        let mut total = 0u32;
        let mut same_author = 0u32;
        let mut themes = Vec::<String>::new();
        let mut neighbors = Vec::<NeighborAggregate<'_>>::new();
        let mut neighbor_index = HashMap::<&str, usize>::new();

        for edge in edges {
            let Some(other) = edge.other_end(node_id) else {
                continue;
            };
            if other == node_id {
                continue;
            }

            total += 1;
            if edge.edge_type == EdgeType::AuthorShared {
                same_author += 1;
            }
            if matches!(edge.edge_type, EdgeType::TagShared | EdgeType::Resonance) {
                for theme in &edge.shared_attributes {
                    push_unique(&mut themes, theme, cap);
                }
            }

            let strength = non_negative(edge.strength);
            let index = *neighbor_index.entry(other).or_insert_with(|| {
                neighbors.push(NeighborAggregate {
                    id: other,
                    score: 0.0,
                    best_type: edge.edge_type,
                    best_strength: strength,
                });
                neighbors.len() - 1
            });
            let aggregate = &mut neighbors[index];
            aggregate.score += strength;
            if strength > aggregate.best_strength
                || (strength == aggregate.best_strength && edge.edge_type < aggregate.best_type)
            {
                aggregate.best_type = edge.edge_type;
                aggregate.best_strength = strength;
            }
        }

        if total == 0 {
            return Breakdown::empty(node_id);
        }

        neighbors.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| left.id.cmp(right.id))
        });

        let mut subgenres = Vec::new();
        let mut eras = Vec::new();
        for aggregate in &neighbors {
            let Some(neighbor) = by_id.get(aggregate.id) else {
                continue;
            };
            push_unique(&mut subgenres, infer_genre(neighbor).as_str(), cap);
            if let Some(era) = self.eras.era_of(neighbor) {
                push_unique(&mut eras, era.as_str(), cap);
            }
        }

        let title_of = |id: &str| {
            by_id
                .get(id)
                .map(|node| node.title.clone())
                .unwrap_or_default()
        };

        Breakdown {
            node_id: node_id.to_owned(),
            total,
            same_author,
            shared_themes: themes,
            subgenres,
            eras,
            most_connected: neighbors
                .iter()
                .take(self.config.top_neighbors.max(1))
                .map(|aggregate| NeighborScore {
                    node_id: aggregate.id.to_owned(),
                    title: title_of(aggregate.id),
                    score: aggregate.score,
                })
                .collect(),
            connections: neighbors
                .iter()
                .map(|aggregate| ConnectionEntry {
                    neighbor_id: aggregate.id.to_owned(),
                    label: aggregate.best_type.label().to_owned(),
                    neighbor_title: title_of(aggregate.id),
                })
                .collect(),
        }
    }
}

fn push_unique(values: &mut Vec<String>, candidate: &str, cap: usize) {
    if values.len() >= cap || values.iter().any(|value| value == candidate) {
        return;
    }
    values.push(candidate.to_owned());
}
