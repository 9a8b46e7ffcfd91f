use std::collections::{HashMap, HashSet};

use libris_config::MetricsConfig;
use libris_core::{
    Era, EraBoundaries, GenreShare, MetricsBundle, Node, ReadingVelocity, TemporalPreference,
    VelocityTrend, infer_genre, non_negative, unit_score,
};

use crate::clusters::{DAY_MS, latest_created_at};

const DAYS_PER_MONTH: f64 = 30.44;

#[derive(Debug, Clone, Default)]
pub struct PatternMetrics {
    config: MetricsConfig,
}

impl PatternMetrics {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    fn eras(&self) -> EraBoundaries {
        EraBoundaries {
            modern_start: self.config.modern_start_year,
            contemporary_start: self.config.contemporary_start_year,
        }
    }

    /// Collection-wide statistics. Fewer than two nodes yields the neutral
    /// bundle; `as_of` defaults to the latest `created_at`.
    pub fn compute(&self, nodes: &[Node], as_of: Option<i64>) -> MetricsBundle {
        if nodes.len() < 2 {
            return MetricsBundle::default();
        }
        let as_of = as_of.or_else(|| latest_created_at(nodes));
        let themes = theme_counts(nodes);

        let bundle = MetricsBundle {
            genre_profile: genre_profile(nodes),
            temporal_preference: self.temporal_preference(nodes),
            diversity_score: diversity_score(&themes),
            exploration_score: exploration_score(nodes),
            consistency_score: self.consistency_score(&themes),
            reading_velocity: self.reading_velocity(nodes, as_of),
        };
        tracing::debug!(
            nodes = nodes.len(),
            genres = bundle.genre_profile.len(),
            preference = ?bundle.temporal_preference,
            "computed reading metrics"
        );
        bundle
    }

    pub fn temporal_preference(&self, nodes: &[Node]) -> TemporalPreference {
        let eras = self.eras();
        let dated = nodes
            .iter()
            .filter_map(|node| eras.era_of(node))
            .collect::<Vec<_>>();
        if dated.len() < 2 {
            return TemporalPreference::Mixed;
        }

        let majority = unit_score(self.config.majority_share);
        Era::ALL
            .into_iter()
            .find(|era| {
                let count = dated.iter().filter(|dated_era| *dated_era == era).count();
                count as f32 / dated.len() as f32 > majority
            })
            .map(TemporalPreference::from)
            .unwrap_or_default()
    }

    fn consistency_score(&self, themes: &[(String, usize)]) -> f32 {
        let total = themes.iter().map(|(_, count)| *count).sum::<usize>();
        if total < 2 {
            return 0.0;
        }
        let mut counts = themes.iter().map(|(_, count)| *count).collect::<Vec<_>>();
        counts.sort_unstable_by(|left, right| right.cmp(left));
        let repeated = counts
            .iter()
            .take(self.config.consistency_top_tags.max(1))
            .map(|count| count.saturating_sub(1))
            .sum::<usize>();
        unit_score(repeated as f32 / (total - 1) as f32)
    }

    pub fn reading_velocity(&self, nodes: &[Node], as_of: Option<i64>) -> ReadingVelocity {
        let mut timed = nodes
            .iter()
            .filter_map(|node| node.created_at)
            .collect::<Vec<_>>();
        if timed.len() < 2 {
            return ReadingVelocity::default();
        }
        timed.sort_unstable();

        let (first, last) = (timed[0], timed[timed.len() - 1]);
        let count = timed.len() as f64;
        let span_days = last.saturating_sub(first).max(0) as f64 / DAY_MS;
        let average_gap = span_days / (count - 1.0);
        let books_per_month = count / (span_days / DAYS_PER_MONTH).max(1.0);

        let window_days = f64::from(self.config.recent_window_days.max(1));
        let as_of = as_of.unwrap_or(last);
        let trend = if span_days < window_days {
            VelocityTrend::Steady
        } else {
            let cutoff = as_of.saturating_sub((window_days * DAY_MS) as i64);
            // Rates count intervals, so an even pace compares as 1.0.
            let recent = timed.iter().filter(|created| **created > cutoff).count() as f64;
            self.classify_trend((recent / window_days) / ((count - 1.0) / span_days))
        };

        let since_last = as_of.saturating_sub(last).max(0) as f64 / DAY_MS;
        let momentum = if average_gap + since_last > 0.0 {
            average_gap / (average_gap + since_last)
        } else {
            1.0
        };

        ReadingVelocity {
            books_per_month: non_negative(books_per_month as f32),
            trend,
            average_days_between_books: non_negative(average_gap as f32),
            momentum: unit_score(momentum as f32),
        }
    }

    pub fn classify_trend(&self, ratio: f64) -> VelocityTrend {
        if !ratio.is_finite() {
            return VelocityTrend::Steady;
        }
        if ratio > f64::from(self.config.accelerating_ratio) {
            return VelocityTrend::Accelerating;
        }
        if ratio < f64::from(self.config.decelerating_ratio) {
            return VelocityTrend::Decelerating;
        }
        VelocityTrend::Steady
    }
}

/// Genre shares in whole percent summing to exactly 100, largest first.
pub fn genre_profile(nodes: &[Node]) -> Vec<GenreShare> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let counts = first_seen_counts(nodes.iter().map(infer_genre));
    let total = nodes.len() as f64;

    let mut shares = counts
        .into_iter()
        .map(|(genre, count)| {
            let percentage = (count as f64 * 100.0 / total).round() as u32;
            (genre, count, percentage)
        })
        .collect::<Vec<_>>();
    shares.sort_by(|left, right| right.1.cmp(&left.1));
    absorb_rounding(&mut shares);

    shares
        .into_iter()
        .map(|(genre, _, percentage)| GenreShare { genre, percentage })
        .collect()
}

// Moves the rounding remainder onto the largest buckets. `shares` is sorted
// largest first.
fn absorb_rounding(shares: &mut [(String, usize, u32)]) {
    let sum = shares.iter().map(|(_, _, percentage)| *percentage).sum::<u32>();
    if sum < 100 {
        if let Some(largest) = shares.first_mut() {
            largest.2 += 100 - sum;
        }
        return;
    }

    // Round-half-up can overshoot; take one point at a time, largest first.
    let mut excess = sum - 100;
    while excess > 0 {
        for share in shares.iter_mut() {
            if excess == 0 {
                break;
            }
            if share.2 > 0 {
                share.2 -= 1;
                excess -= 1;
            }
        }
    }
}

/// Tag occurrence counts in first-seen order, or genre counts when no node
/// carries a tag.
fn theme_counts(nodes: &[Node]) -> Vec<(String, usize)> {
    let tags = first_seen_counts(nodes.iter().flat_map(|node| node.tags.iter().cloned()));
    if !tags.is_empty() {
        return tags;
    }
    first_seen_counts(nodes.iter().map(infer_genre))
}

fn first_seen_counts(values: impl Iterator<Item = String>) -> Vec<(String, usize)> {
    let mut counts = Vec::<(String, usize)>::new();
    let mut index = HashMap::<String, usize>::new();
    for value in values {
        match index.get(&value) {
            Some(position) => counts[*position].1 += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}

/// Normalized Shannon entropy of theme occurrences.
fn diversity_score(themes: &[(String, usize)]) -> f32 {
    if themes.len() < 2 {
        return 0.0;
    }
    let total = themes.iter().map(|(_, count)| *count).sum::<usize>() as f64;
    let entropy = themes
        .iter()
        .map(|(_, count)| {
            let share = *count as f64 / total;
            -share * share.ln()
        })
        .sum::<f64>();
    unit_score((entropy / (themes.len() as f64).ln()) as f32)
}

/// Share of tagged nodes, after the first, that introduce a tag not seen in
/// any earlier addition.
fn exploration_score(nodes: &[Node]) -> f32 {
    let mut tagged = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| !node.tags.is_empty())
        .collect::<Vec<_>>();
    if tagged.len() < 2 {
        return 0.0;
    }
    tagged.sort_by_key(|(index, node)| (node.created_at.is_none(), node.created_at, *index));

    let mut seen = HashSet::<&str>::new();
    let mut novel = 0usize;
    for (position, (_, node)) in tagged.iter().enumerate() {
        let introduces = node
            .tags
            .iter()
            .fold(false, |found, tag| seen.insert(tag.as_str()) || found);
        if position > 0 && introduces {
            novel += 1;
        }
    }
    unit_score(novel as f32 / (tagged.len() - 1) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;

    fn node(id: &str, tags: &[&str], year: Option<i32>, created_day: Option<i64>) -> Node {
        Node {
            id: id.to_owned(),
            title: format!("Title {id}"),
            author: "Author".to_owned(),
            author_known: true,
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            genre: None,
            publication_year: year,
            created_at: created_day.map(|day| day * DAY),
            notes: None,
        }
    }

    #[test]
    fn single_node_collection_is_neutral() {
        let nodes = vec![node("a", &["Sea"], Some(1990), Some(1))];
        let metrics = PatternMetrics::default().compute(&nodes, None);
        assert_eq!(metrics, MetricsBundle::default());
        assert_eq!(metrics.temporal_preference, TemporalPreference::Mixed);
        assert!(metrics.genre_profile.is_empty());
    }

    #[test]
    fn genre_profile_rounds_to_exactly_one_hundred() {
        let nodes = vec![
            node("a", &["Horror"], None, None),
            node("b", &["Poetry"], None, None),
            node("c", &["Travel"], None, None),
        ];
        let profile = genre_profile(&nodes);
        let percentages = profile.iter().map(|share| share.percentage).collect::<Vec<_>>();
        assert_eq!(percentages, vec![34, 33, 33]);
        assert_eq!(profile[0].genre, "Horror");
    }

    #[test]
    fn genre_profile_absorbs_excess_from_round_half_up() {
        // Forty equal genres round 2.5% up to 3% each.
        let nodes = (0..40)
            .map(|index| {
                let tag = format!("Topic {index}");
                node(&format!("n{index}"), &[tag.as_str()], None, None)
            })
            .collect::<Vec<_>>();
        let profile = genre_profile(&nodes);
        assert_eq!(profile.len(), 40);
        assert_eq!(profile.iter().map(|share| share.percentage).sum::<u32>(), 100);
    }

    #[test]
    fn genre_profile_uses_inferred_genres_largest_first() {
        let mut explicit = node("d", &["Whatever"], None, None);
        explicit.genre = Some("Poetry".to_owned());
        let nodes = vec![
            node("a", &["Cyberpunk"], None, None),
            node("b", &["Noir", "Space Opera"], None, None),
            node("c", &["space opera"], None, None),
            explicit,
            node("e", &[], None, None),
        ];
        let profile = genre_profile(&nodes);
        let genres = profile
            .iter()
            .map(|share| (share.genre.as_str(), share.percentage))
            .collect::<Vec<_>>();
        assert_eq!(
            genres,
            vec![
                ("Science Fiction", 40),
                ("Mystery", 20),
                ("Poetry", 20),
                ("Uncategorized", 20),
            ]
        );
    }

    #[test]
    fn temporal_preference_needs_a_clear_majority() {
        let metrics = PatternMetrics::default();
        let classic = vec![
            node("a", &[], Some(1850), None),
            node("b", &[], Some(1920), None),
            node("c", &[], Some(1990), None),
        ];
        assert_eq!(metrics.temporal_preference(&classic), TemporalPreference::Classic);

        let split = vec![
            node("a", &[], Some(1850), None),
            node("b", &[], Some(2010), None),
        ];
        assert_eq!(metrics.temporal_preference(&split), TemporalPreference::Mixed);

        let lonely = vec![node("a", &[], Some(2010), None), node("b", &[], None, None)];
        assert_eq!(metrics.temporal_preference(&lonely), TemporalPreference::Mixed);
    }

    #[test]
    fn diversity_consistency_and_exploration() {
        let focused = vec![
            node("a", &["Sea"], None, Some(1)),
            node("b", &["Sea"], None, Some(2)),
            node("c", &["Sea"], None, Some(3)),
        ];
        let bundle = PatternMetrics::default().compute(&focused, None);
        assert_eq!(bundle.diversity_score, 0.0);
        assert_eq!(bundle.consistency_score, 1.0);
        assert_eq!(bundle.exploration_score, 0.0);

        let spread = vec![
            node("a", &["Sea"], None, Some(3)),
            node("b", &["Ice"], None, Some(2)),
            node("c", &["Sand"], None, Some(1)),
            node("d", &["Sky"], None, None),
        ];
        let bundle = PatternMetrics::default().compute(&spread, None);
        assert!((bundle.diversity_score - 1.0).abs() < 1e-6);
        assert_eq!(bundle.consistency_score, 0.0);
        assert_eq!(bundle.exploration_score, 1.0);
    }

    #[test]
    fn exploration_follows_addition_order() {
        // By created_at: c(Sea) -> a(Sea, Ice) -> b(Sea); only a adds a tag.
        let nodes = vec![
            node("a", &["Sea", "Ice"], None, Some(5)),
            node("b", &["Sea"], None, Some(9)),
            node("c", &["Sea"], None, Some(1)),
        ];
        assert!((exploration_score(&nodes) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn velocity_over_a_steady_year() {
        // One book every 30 days for a year.
        let nodes = (0..13)
            .map(|index| node(&format!("n{index}"), &[], None, Some(index * 30)))
            .collect::<Vec<_>>();
        let velocity = PatternMetrics::default().reading_velocity(&nodes, None);

        assert!((velocity.average_days_between_books - 30.0).abs() < 1e-4);
        assert!((velocity.books_per_month - (13.0 / (360.0 / 30.44)) as f32).abs() < 1e-4);
        assert_eq!(velocity.trend, VelocityTrend::Steady);
        assert_eq!(velocity.momentum, 1.0);
    }

    #[test]
    fn velocity_trend_and_momentum_react_to_recent_activity() {
        // Sparse history, then a burst in the last month.
        let mut nodes = vec![
            node("a", &[], None, Some(0)),
            node("b", &[], None, Some(200)),
        ];
        for index in 0..6 {
            nodes.push(node(&format!("r{index}"), &[], None, Some(380 + index * 5)));
        }
        let metrics = PatternMetrics::default();
        let velocity = metrics.reading_velocity(&nodes, None);
        assert_eq!(velocity.trend, VelocityTrend::Accelerating);

        let later = metrics.reading_velocity(&nodes, Some(800 * DAY));
        assert_eq!(later.trend, VelocityTrend::Decelerating);
        assert!(later.momentum > 0.0 && later.momentum < 0.2);
    }

    #[test]
    fn velocity_survives_timestamps_at_the_ends_of_the_range() {
        let mut early = node("early", &["Sea"], Some(1990), None);
        early.created_at = Some(-9_000_000_000_000_000_000);
        let mut late = node("late", &["Ice"], Some(2010), None);
        late.created_at = Some(9_000_000_000_000_000_000);

        let bundle = PatternMetrics::default().compute(&[early, late], None);
        let velocity = bundle.reading_velocity;
        assert!(velocity.books_per_month.is_finite());
        assert!(velocity.average_days_between_books.is_finite());
        assert!(velocity.average_days_between_books > 0.0);
        assert!((0.0..=1.0).contains(&velocity.momentum));
    }

    #[test]
    fn velocity_with_a_zero_length_span_stays_finite() {
        let mut first = node("a", &[], None, None);
        first.created_at = Some(1_000);
        let mut second = node("b", &[], None, None);
        second.created_at = Some(1_000);

        let velocity = PatternMetrics::default().reading_velocity(&[first, second], Some(1_000));
        assert!(velocity.books_per_month.is_finite());
        assert_eq!(velocity.books_per_month, 2.0);
        assert_eq!(velocity.average_days_between_books, 0.0);
        assert_eq!(velocity.trend, VelocityTrend::Steady);
        assert!((0.0..=1.0).contains(&velocity.momentum));
    }

    #[test]
    fn velocity_needs_two_timed_nodes() {
        let nodes = vec![node("a", &[], None, Some(4)), node("b", &[], None, None)];
        assert_eq!(
            PatternMetrics::default().reading_velocity(&nodes, None),
            ReadingVelocity::default()
        );
    }
}
