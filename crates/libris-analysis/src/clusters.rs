use std::collections::{HashMap, HashSet};

use libris_config::ClusterConfig;
use libris_core::{Cluster, Edge, GrowthKind, Node, non_negative, unit_score};

pub(crate) const DAY_MS: f64 = 86_400_000.0;

#[derive(Debug, Clone, Default)]
pub struct ClusterAnalyzer {
    config: ClusterConfig,
}

impl ClusterAnalyzer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// One cluster per distinct tag, ordered by health (stable for ties).
    /// `as_of` defaults to the latest `created_at` in the collection.
    pub fn analyze(&self, nodes: &[Node], edges: &[Edge], as_of: Option<i64>) -> Vec<Cluster> {
        let as_of = as_of.or_else(|| latest_created_at(nodes));

        let mut order = Vec::<&str>::new();
        let mut members_by_tag = HashMap::<&str, Vec<&Node>>::new();
        for node in nodes {
            for tag in &node.tags {
                let members = members_by_tag.entry(tag.as_str()).or_insert_with(|| {
                    order.push(tag.as_str());
                    Vec::new()
                });
                if members.last().is_none_or(|last| last.id != node.id) {
                    members.push(node);
                }
            }
        }

        let mut clusters = order
            .into_iter()
            .filter_map(|tag| {
                members_by_tag
                    .get(tag)
                    .map(|members| self.cluster_for(tag, members, edges, as_of))
            })
            .collect::<Vec<_>>();

        clusters.sort_by(|left, right| {
            right
                .health_score
                .partial_cmp(&left.health_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            nodes = nodes.len(),
            clusters = clusters.len(),
            "analyzed clusters"
        );
        clusters
    }

    fn cluster_for(
        &self,
        tag: &str,
        members: &[&Node],
        edges: &[Edge],
        as_of: Option<i64>,
    ) -> Cluster {
        let diversity = author_diversity(members);
        let window_days = f64::from(self.config.recent_window_days.max(1));

        let timed = members
            .iter()
            .filter_map(|node| node.created_at)
            .collect::<Vec<_>>();
        let (recency, growth) = match (as_of, timed.is_empty()) {
            (Some(as_of), false) => {
                let cutoff = as_of.saturating_sub((window_days * DAY_MS) as i64);
                let recent = timed.iter().filter(|created| **created >= cutoff).count();
                let recency = recent as f32 / timed.len() as f32;

                let first = timed.iter().copied().min().unwrap_or(as_of);
                let span_days =
                    (as_of.saturating_sub(first).max(0) as f64 / DAY_MS).max(window_days);
                let recent_rate = recent as f64 / window_days;
                let historical_rate = timed.len() as f64 / span_days;
                (recency, self.classify_growth(recent_rate / historical_rate))
            }
            _ => (0.0, GrowthKind::Stable),
        };

        let member_ids = members
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        let internal_strength = edges
            .iter()
            .filter(|edge| {
                member_ids.contains(edge.from_id.as_str())
                    && member_ids.contains(edge.to_id.as_str())
            })
            .map(|edge| non_negative(edge.strength))
            .sum::<f32>();

        let recency = unit_score(recency);
        Cluster {
            tag: tag.to_owned(),
            node_ids: members.iter().map(|node| node.id.clone()).collect(),
            diversity,
            recency,
            growth,
            health_score: self.health_score(diversity, recency),
            internal_strength: non_negative(internal_strength),
        }
    }

    pub fn classify_growth(&self, ratio: f64) -> GrowthKind {
        if !ratio.is_finite() {
            return GrowthKind::Stable;
        }
        if ratio > f64::from(self.config.expanding_ratio) {
            return GrowthKind::Expanding;
        }
        if ratio < f64::from(self.config.dormant_ratio) {
            return GrowthKind::Dormant;
        }
        GrowthKind::Stable
    }

    pub fn health_score(&self, diversity: f32, recency: f32) -> f32 {
        let diversity_weight = non_negative(self.config.diversity_weight);
        let recency_weight = non_negative(self.config.recency_weight);
        let total = diversity_weight + recency_weight;
        if total <= 0.0 {
            return 0.0;
        }
        unit_score((diversity_weight * diversity + recency_weight * recency) / total)
    }
}

/// Distinct authors over member count. Each unknown-author member counts as
/// an author of its own.
fn author_diversity(members: &[&Node]) -> f32 {
    if members.is_empty() {
        return 0.0;
    }
    let mut known = HashSet::new();
    let mut unknown = 0usize;
    for node in members {
        if node.author_known {
            known.insert(node.author.as_str());
        } else {
            unknown += 1;
        }
    }
    unit_score((known.len() + unknown) as f32 / members.len() as f32)
}

pub(crate) fn latest_created_at(nodes: &[Node]) -> Option<i64> {
    nodes.iter().filter_map(|node| node.created_at).max()
}
