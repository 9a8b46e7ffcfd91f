use std::collections::HashMap;

use libris_config::BridgeConfig;
use libris_core::{Bridge, BridgeType, Edge, EdgeType, Node, non_negative, pair_key, unit_score};

// Matched as substrings of lowercased tags.
const STYLISTIC_TERMS: &[&str] = &[
    "experimental",
    "stream of consciousness",
    "minimalist",
    "lyrical",
    "epistolary",
    "satire",
    "absurdist",
    "surreal",
    "magical realism",
    "postmodern",
    "metafiction",
    "unreliable narrator",
    "nonlinear",
    "noir",
    "gothic",
];

// Matched as substrings of lowercased tags and notes.
const PHILOSOPHICAL_TERMS: &[&str] = &[
    "philosophy",
    "philosophical",
    "existential",
    "ethics",
    "moral",
    "identity",
    "consciousness",
    "free will",
    "mortality",
    "freedom",
    "utopia",
    "dystopia",
    "anarchy",
    "nihilism",
    "stoicism",
    "metaphysics",
    "meaning of life",
];

const MAX_SHARED_CONCEPTS: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct BridgeDetector {
    config: BridgeConfig,
}

#[derive(Debug, Clone, PartialEq)]
struct Signal {
    bridge_type: BridgeType,
    score: f32,
    concepts: Vec<String>,
}

#[derive(Debug)]
struct Candidate<'a> {
    from: &'a Node,
    to: &'a Node,
    from_cluster: &'a str,
    to_cluster: &'a str,
    raw: f32,
    strongest: Signal,
    concepts: Vec<String>,
}

impl BridgeDetector {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Cross-cluster pairs ranked by combined signal strength, at most
    /// [`BridgeConfig::effective_max_bridges`] of them.
    pub fn detect(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Bridge> {
        let dominant = dominant_clusters(nodes);

        let mut edges_by_pair = HashMap::<(&str, &str), Vec<&Edge>>::new();
        for edge in edges {
            edges_by_pair.entry(edge.pair_key()).or_default().push(edge);
        }

        let mut candidates = Vec::new();
        for left in 0..nodes.len() {
            let Some(from_cluster) = dominant[left] else {
                continue;
            };
            for right in (left + 1)..nodes.len() {
                let Some(to_cluster) = dominant[right] else {
                    continue;
                };
                let (a, b) = (&nodes[left], &nodes[right]);
                if from_cluster == to_cluster || a.id == b.id {
                    continue;
                }

                let pair_edges = edges_by_pair
                    .get(&pair_key(a.id.as_str(), b.id.as_str()))
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let signals = self.signals(a, b, pair_edges);
                let Some(strongest) = strongest_signal(&signals) else {
                    continue;
                };

                let mut concepts = Vec::new();
                for signal in &signals {
                    for concept in &signal.concepts {
                        if concepts.len() < MAX_SHARED_CONCEPTS && !concepts.contains(concept) {
                            concepts.push(concept.clone());
                        }
                    }
                }

                candidates.push(Candidate {
                    from: a,
                    to: b,
                    from_cluster,
                    to_cluster,
                    raw: signals.iter().map(|signal| signal.score).sum(),
                    strongest,
                    concepts,
                });
            }
        }

        let max_raw = candidates
            .iter()
            .map(|candidate| candidate.raw)
            .fold(0.0f32, f32::max);
        if max_raw <= 0.0 {
            return Vec::new();
        }

        let mut bridges = candidates
            .into_iter()
            .map(|candidate| Bridge {
                from_book: candidate.from.id.clone(),
                to_book: candidate.to.id.clone(),
                from_cluster: candidate.from_cluster.to_owned(),
                to_cluster: candidate.to_cluster.to_owned(),
                bridge_type: candidate.strongest.bridge_type,
                strength: unit_score(candidate.raw / max_raw),
                explanation: explain(&candidate),
                shared_concepts: candidate.concepts,
            })
            .collect::<Vec<_>>();

        bridges.sort_by(|left, right| {
            right
                .strength
                .partial_cmp(&left.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| left.from_book.cmp(&right.from_book))
                .then_with(|| left.to_book.cmp(&right.to_book))
        });
        bridges.truncate(self.config.effective_max_bridges());

        tracing::debug!(
            nodes = nodes.len(),
            bridges = bridges.len(),
            "detected bridges"
        );
        bridges
    }

    fn signals(&self, a: &Node, b: &Node, pair_edges: &[&Edge]) -> Vec<Signal> {
        let mut signals = Vec::new();

        if let Some(edge) = pair_edges
            .iter()
            .find(|edge| edge.edge_type == EdgeType::TagShared)
        {
            let shared = edge.shared_attributes.len();
            if shared > 0 && shared <= self.config.max_thematic_overlap {
                signals.push(Signal {
                    bridge_type: BridgeType::Thematic,
                    score: non_negative(self.config.thematic_weight) * shared as f32,
                    concepts: edge.shared_attributes.clone(),
                });
            }
        }

        if let (Some(year_a), Some(year_b)) = (a.publication_year, b.publication_year) {
            let delta = year_a.abs_diff(year_b);
            if delta <= self.config.year_window {
                let closeness = 1.0 - delta as f32 / (self.config.year_window as f32 + 1.0);
                signals.push(Signal {
                    bridge_type: BridgeType::Temporal,
                    score: non_negative(self.config.temporal_weight) * closeness,
                    concepts: vec![if delta == 0 {
                        format!("published {year_a}")
                    } else {
                        format!("published {}-{}", year_a.min(year_b), year_a.max(year_b))
                    }],
                });
            }
        }

        let author_edge = pair_edges
            .iter()
            .find(|edge| edge.edge_type == EdgeType::AuthorShared);
        if let Some(edge) = author_edge {
            signals.push(Signal {
                bridge_type: BridgeType::Stylistic,
                score: non_negative(self.config.stylistic_weight),
                concepts: edge.shared_attributes.clone(),
            });
        } else if let Some(concepts) = shared_vocabulary(
            &vocabulary_terms(a, STYLISTIC_TERMS, false),
            &vocabulary_terms(b, STYLISTIC_TERMS, false),
        ) {
            signals.push(Signal {
                bridge_type: BridgeType::Stylistic,
                score: non_negative(self.config.stylistic_weight),
                concepts,
            });
        }

        if let Some(concepts) = shared_vocabulary(
            &vocabulary_terms(a, PHILOSOPHICAL_TERMS, true),
            &vocabulary_terms(b, PHILOSOPHICAL_TERMS, true),
        ) {
            signals.push(Signal {
                bridge_type: BridgeType::Philosophical,
                score: non_negative(self.config.philosophical_weight),
                concepts,
            });
        }

        signals.retain(|signal| signal.score > 0.0);
        signals
    }
}

/// For each node, the tag with the most collection-wide members; ties go to
/// the tag listed first on the node.
fn dominant_clusters(nodes: &[Node]) -> Vec<Option<&str>> {
    let mut sizes = HashMap::<&str, usize>::new();
    for node in nodes {
        for tag in &node.tags {
            *sizes.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    nodes
        .iter()
        .map(|node| {
            let mut best: Option<(&str, usize)> = None;
            for tag in &node.tags {
                let size = sizes.get(tag.as_str()).copied().unwrap_or(0);
                if best.is_none_or(|(_, best_size)| size > best_size) {
                    best = Some((tag.as_str(), size));
                }
            }
            best.map(|(tag, _)| tag)
        })
        .collect()
}

// Signals are pushed in tie-break order, so the first maximum wins.
fn strongest_signal(signals: &[Signal]) -> Option<Signal> {
    let mut strongest: Option<&Signal> = None;
    for signal in signals {
        if strongest.is_none_or(|best| signal.score > best.score) {
            strongest = Some(signal);
        }
    }
    strongest.cloned()
}

fn vocabulary_terms(
    node: &Node,
    vocabulary: &[&'static str],
    include_notes: bool,
) -> Vec<&'static str> {
    let mut haystacks = node
        .tags
        .iter()
        .map(|tag| tag.to_lowercase())
        .collect::<Vec<_>>();
    if include_notes {
        if let Some(notes) = node.notes.as_deref() {
            haystacks.push(notes.to_lowercase());
        }
    }

    vocabulary
        .iter()
        .copied()
        .filter(|term| haystacks.iter().any(|haystack| haystack.contains(term)))
        .collect()
}

/// Common terms when both sides carry vocabulary; otherwise the union, or
/// `None` when either side carries none.
fn shared_vocabulary(left: &[&str], right: &[&str]) -> Option<Vec<String>> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let common = left
        .iter()
        .filter(|term| right.contains(term))
        .map(|term| (*term).to_owned())
        .collect::<Vec<_>>();
    if !common.is_empty() {
        return Some(common);
    }

    let mut union = left.iter().map(|term| (*term).to_owned()).collect::<Vec<_>>();
    for term in right {
        if !left.contains(term) {
            union.push((*term).to_owned());
        }
    }
    Some(union)
}

fn explain(candidate: &Candidate<'_>) -> String {
    let from = candidate.from.title.as_str();
    let to = candidate.to.title.as_str();
    let clusters = format!("{} and {}", candidate.from_cluster, candidate.to_cluster);
    let concepts = candidate.strongest.concepts.join(", ");

    match candidate.strongest.bridge_type {
        BridgeType::Thematic => {
            format!("\"{from}\" and \"{to}\" link {clusters} through shared themes: {concepts}")
        }
        BridgeType::Temporal => {
            format!("\"{from}\" and \"{to}\" link {clusters} as books of the same period ({concepts})")
        }
        BridgeType::Stylistic => {
            format!("\"{from}\" and \"{to}\" link {clusters} through a common style: {concepts}")
        }
        BridgeType::Philosophical => {
            format!("\"{from}\" and \"{to}\" link {clusters} by asking similar questions: {concepts}")
        }
    }
}
