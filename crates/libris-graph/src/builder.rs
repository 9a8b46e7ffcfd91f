use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use libris_config::{CandidateStrategy, GraphConfig};
use libris_core::{Edge, EdgeType, Node, Rejection, non_negative, normalize_records};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const RESONANCE_REASON: &str = "Thematic resonance";

/// Normalized nodes plus the base edge set for one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub rejected: Vec<Rejection>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: GraphConfig,
}

struct PreparedNode<'a> {
    node: &'a Node,
    title_tokens: Vec<String>,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn build_graph<R: Rng + ?Sized>(&self, records: &[Value], rng: &mut R) -> Graph {
        let collection = normalize_records(records);
        let edges = self.build_edges(&collection.nodes, rng);
        Graph {
            nodes: collection.nodes,
            edges,
            rejected: collection.rejected,
        }
    }

    /// Produces the base edge set. Pairs are visited in node order (`i < j`)
    /// and `from_id` is always the earlier node.
    pub fn build_edges<R: Rng + ?Sized>(&self, nodes: &[Node], rng: &mut R) -> Vec<Edge> {
        let prepared = nodes
            .iter()
            .map(|node| PreparedNode {
                node,
                title_tokens: title_tokens(node.title.as_str(), self.config.title_min_token_len),
            })
            .collect::<Vec<_>>();

        let edges = match self.config.strategy {
            CandidateStrategy::Pairwise => self.build_pairwise(&prepared, rng),
            CandidateStrategy::Indexed => self.build_indexed(&prepared, rng),
        };

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            strategy = self.config.strategy.as_str(),
            "built relationship graph"
        );
        edges
    }

    fn build_pairwise<R: Rng + ?Sized>(
        &self,
        prepared: &[PreparedNode<'_>],
        rng: &mut R,
    ) -> Vec<Edge> {
        let mut edges = Vec::new();
        let mut degree = vec![0usize; prepared.len()];

        for left in 0..prepared.len() {
            for right in (left + 1)..prepared.len() {
                let (a, b) = (&prepared[left], &prepared[right]);
                if a.node.id == b.node.id {
                    continue;
                }

                let pair_edges = self.attribute_edges(a, b);
                let produced = pair_edges.len();
                degree[left] += produced;
                degree[right] += produced;
                edges.extend(pair_edges);

                // Edges of this pair touch both ends but count once.
                let touching = degree[left] + degree[right] - produced;
                if let Some(edge) = self.maybe_resonance(a.node, b.node, touching, rng) {
                    degree[left] += 1;
                    degree[right] += 1;
                    edges.push(edge);
                }
            }
        }

        edges
    }

    fn build_indexed<R: Rng + ?Sized>(
        &self,
        prepared: &[PreparedNode<'_>],
        rng: &mut R,
    ) -> Vec<Edge> {
        let mut buckets = HashMap::<(u8, &str), Vec<usize>>::new();
        for (index, item) in prepared.iter().enumerate() {
            for tag in &item.node.tags {
                buckets.entry((0, tag.as_str())).or_default().push(index);
            }
            if item.node.author_known {
                buckets
                    .entry((1, item.node.author.as_str()))
                    .or_default()
                    .push(index);
            }
            for token in &item.title_tokens {
                buckets.entry((2, token.as_str())).or_default().push(index);
            }
        }

        let mut candidates = BTreeSet::new();
        for members in buckets.values() {
            for (position, &left) in members.iter().enumerate() {
                for &right in &members[position + 1..] {
                    candidates.insert((left.min(right), left.max(right)));
                }
            }
        }

        let mut by_pair = BTreeMap::<(usize, usize), Vec<Edge>>::new();
        let mut degree = vec![0usize; prepared.len()];
        for (left, right) in candidates {
            let (a, b) = (&prepared[left], &prepared[right]);
            if a.node.id == b.node.id {
                continue;
            }
            let pair_edges = self.attribute_edges(a, b);
            if pair_edges.is_empty() {
                continue;
            }
            degree[left] += pair_edges.len();
            degree[right] += pair_edges.len();
            by_pair.insert((left, right), pair_edges);
        }

        // A pair can only be under the touching limit when both ends are.
        let sparse = (0..prepared.len())
            .filter(|index| degree[*index] < self.config.resonance_max_touching)
            .collect::<Vec<_>>();
        for (position, &left) in sparse.iter().enumerate() {
            for &right in &sparse[position + 1..] {
                let (a, b) = (prepared[left].node, prepared[right].node);
                if a.id == b.id {
                    continue;
                }
                let produced = by_pair.get(&(left, right)).map_or(0, Vec::len);
                let touching = degree[left] + degree[right] - produced;
                if let Some(edge) = self.maybe_resonance(a, b, touching, rng) {
                    degree[left] += 1;
                    degree[right] += 1;
                    by_pair.entry((left, right)).or_default().push(edge);
                }
            }
        }

        by_pair.into_values().flatten().collect()
    }

    /// Deterministic tag, author and title edges for one pair.
    fn attribute_edges(&self, a: &PreparedNode<'_>, b: &PreparedNode<'_>) -> Vec<Edge> {
        let mut edges = Vec::new();

        let shared_tags = a
            .node
            .tags
            .iter()
            .filter(|tag| b.node.has_tag(tag))
            .cloned()
            .collect::<Vec<_>>();
        if !shared_tags.is_empty() {
            edges.push(Edge {
                from_id: a.node.id.clone(),
                to_id: b.node.id.clone(),
                edge_type: EdgeType::TagShared,
                strength: non_negative(self.config.tag_weight * shared_tags.len() as f32),
                reason: format!("Shared themes: {}", shared_tags.join(", ")),
                shared_attributes: shared_tags,
            });
        }

        if a.node.author_known && b.node.author_known && a.node.author == b.node.author {
            edges.push(Edge {
                from_id: a.node.id.clone(),
                to_id: b.node.id.clone(),
                edge_type: EdgeType::AuthorShared,
                strength: non_negative(self.config.author_weight),
                shared_attributes: vec![a.node.author.clone()],
                reason: format!("Same author: {}", a.node.author),
            });
        }

        let right_tokens = b
            .title_tokens
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>();
        let shared_words = a
            .title_tokens
            .iter()
            .filter(|token| right_tokens.contains(token.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        if !shared_words.is_empty() {
            edges.push(Edge {
                from_id: a.node.id.clone(),
                to_id: b.node.id.clone(),
                edge_type: EdgeType::TitleSimilarity,
                strength: non_negative(self.config.title_weight * shared_words.len() as f32),
                reason: format!("Similar titles: {}", shared_words.join(", ")),
                shared_attributes: shared_words,
            });
        }

        edges
    }

    fn maybe_resonance<R: Rng + ?Sized>(
        &self,
        a: &Node,
        b: &Node,
        touching: usize,
        rng: &mut R,
    ) -> Option<Edge> {
        if touching >= self.config.resonance_max_touching {
            return None;
        }
        if !rng.gen_bool(self.resonance_probability()) {
            return None;
        }

        Some(Edge {
            from_id: a.id.clone(),
            to_id: b.id.clone(),
            edge_type: EdgeType::Resonance,
            strength: non_negative(self.config.resonance_strength),
            shared_attributes: Vec::new(),
            reason: RESONANCE_REASON.to_owned(),
        })
    }

    fn resonance_probability(&self) -> f64 {
        let probability = self.config.resonance_probability;
        if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Lowercased title words longer than `min_len` characters, with surrounding
/// punctuation removed and duplicates dropped.
pub fn title_tokens(title: &str, min_len: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    title
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|ch: char| !ch.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| word.chars().count() > min_len)
        .filter(|word| seen.insert(word.clone()))
        .collect()
}
