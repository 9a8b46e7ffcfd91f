use serde::{Deserialize, Serialize};

mod genre;
mod normalize;

pub use genre::{Era, EraBoundaries, UNCATEGORIZED_GENRE, infer_genre, known_genre};
pub use normalize::{
    NormalizeError, NormalizedCollection, Rejection, UNKNOWN_AUTHOR, is_unknown_author,
    normalize_record, normalize_records,
};

pub type NodeId = String;

/// One book in the collection graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub author: String,
    /// False when the author is the unknown sentinel or blank.
    pub author_known: bool,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    /// Unix milliseconds at which the book joined the collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Node {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }

    /// Case-insensitive tag membership, used for user-supplied filters.
    pub fn has_tag_ignore_case(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.tags.iter().any(|value| value.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    TagShared,
    AuthorShared,
    TitleSimilarity,
    Resonance,
}

impl EdgeType {
    pub const ALL: [EdgeType; 4] = [
        Self::TagShared,
        Self::AuthorShared,
        Self::TitleSimilarity,
        Self::Resonance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TagShared => "tag_shared",
            Self::AuthorShared => "author_shared",
            Self::TitleSimilarity => "title_similarity",
            Self::Resonance => "resonance",
        }
    }

    /// Short human label shown next to a neighbour in the connection list.
    pub fn label(self) -> &'static str {
        match self {
            Self::TagShared => "Shared themes",
            Self::AuthorShared => "Same author",
            Self::TitleSimilarity => "Similar titles",
            Self::Resonance => "Thematic resonance",
        }
    }
}

impl std::str::FromStr for EdgeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "tag_shared" => Ok(Self::TagShared),
            "author_shared" => Ok(Self::AuthorShared),
            "title_similarity" => Ok(Self::TitleSimilarity),
            "resonance" => Ok(Self::Resonance),
            other => Err(format!(
                "invalid edge type '{other}', expected one of: tag_shared, author_shared, title_similarity, resonance"
            )),
        }
    }
}

/// A typed, weighted relationship between two nodes. Logically unordered;
/// `from_id`/`to_id` only fix a display direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub edge_type: EdgeType,
    pub strength: f32,
    pub shared_attributes: Vec<String>,
    pub reason: String,
}

impl Edge {
    pub fn connects(&self, left: &str, right: &str) -> bool {
        (self.from_id == left && self.to_id == right)
            || (self.from_id == right && self.to_id == left)
    }

    /// The endpoint opposite `node_id`, if the edge touches it.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.from_id == node_id {
            Some(self.to_id.as_str())
        } else if self.to_id == node_id {
            Some(self.from_id.as_str())
        } else {
            None
        }
    }

    /// Order-independent key for the node pair.
    pub fn pair_key(&self) -> (&str, &str) {
        pair_key(self.from_id.as_str(), self.to_id.as_str())
    }
}

pub fn pair_key<'a>(left: &'a str, right: &'a str) -> (&'a str, &'a str) {
    if left <= right {
        (left, right)
    } else {
        (right, left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthKind {
    Expanding,
    Stable,
    Dormant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub tag: String,
    pub node_ids: Vec<NodeId>,
    pub diversity: f32,
    pub recency: f32,
    pub growth: GrowthKind,
    pub health_score: f32,
    pub internal_strength: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeType {
    Thematic,
    Temporal,
    Stylistic,
    Philosophical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub from_book: NodeId,
    pub to_book: NodeId,
    pub from_cluster: String,
    pub to_cluster: String,
    pub bridge_type: BridgeType,
    pub strength: f32,
    pub shared_concepts: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreShare {
    pub genre: String,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemporalPreference {
    Classic,
    Modern,
    Contemporary,
    #[default]
    Mixed,
}

impl From<Era> for TemporalPreference {
    fn from(era: Era) -> Self {
        match era {
            Era::Classic => Self::Classic,
            Era::Modern => Self::Modern,
            Era::Contemporary => Self::Contemporary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    Accelerating,
    Decelerating,
    #[default]
    Steady,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReadingVelocity {
    pub books_per_month: f32,
    pub trend: VelocityTrend,
    pub average_days_between_books: f32,
    pub momentum: f32,
}

/// Collection-wide reading-pattern statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsBundle {
    pub genre_profile: Vec<GenreShare>,
    pub temporal_preference: TemporalPreference,
    pub diversity_score: f32,
    pub exploration_score: f32,
    pub consistency_score: f32,
    pub reading_velocity: ReadingVelocity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborScore {
    pub node_id: NodeId,
    pub title: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub neighbor_id: NodeId,
    pub label: String,
    pub neighbor_title: String,
}

/// Why one node connects to its neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Breakdown {
    pub node_id: NodeId,
    pub total: u32,
    pub same_author: u32,
    pub shared_themes: Vec<String>,
    pub subgenres: Vec<String>,
    pub eras: Vec<String>,
    pub most_connected: Vec<NeighborScore>,
    pub connections: Vec<ConnectionEntry>,
}

impl Breakdown {
    pub fn empty(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.connections.is_empty() && self.most_connected.is_empty()
    }
}

/// Replaces NaN/infinite values with zero and clamps to the unit interval.
pub fn unit_score(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Replaces NaN/infinite values with zero and floors at zero.
pub fn non_negative(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
