use serde::{Deserialize, Serialize};

use crate::Node;

pub const UNCATEGORIZED_GENRE: &str = "Uncategorized";

const DEFAULT_MODERN_START: i32 = 1950;
const DEFAULT_CONTEMPORARY_START: i32 = 2000;

// (tag keyword, canonical genre). Keywords are matched against lowercased tags.
const GENRE_KEYWORDS: &[(&str, &str)] = &[
    ("science fiction", "Science Fiction"),
    ("sci-fi", "Science Fiction"),
    ("scifi", "Science Fiction"),
    ("cyberpunk", "Science Fiction"),
    ("space opera", "Science Fiction"),
    ("dystopia", "Science Fiction"),
    ("dystopian", "Science Fiction"),
    ("fantasy", "Fantasy"),
    ("epic fantasy", "Fantasy"),
    ("magic", "Fantasy"),
    ("mythology", "Fantasy"),
    ("mystery", "Mystery"),
    ("detective", "Mystery"),
    ("crime", "Mystery"),
    ("noir", "Mystery"),
    ("thriller", "Thriller"),
    ("suspense", "Thriller"),
    ("espionage", "Thriller"),
    ("horror", "Horror"),
    ("gothic", "Horror"),
    ("romance", "Romance"),
    ("love", "Romance"),
    ("historical fiction", "Historical Fiction"),
    ("historical", "Historical Fiction"),
    ("literary fiction", "Literary Fiction"),
    ("literary", "Literary Fiction"),
    ("classic", "Literary Fiction"),
    ("poetry", "Poetry"),
    ("biography", "Biography"),
    ("memoir", "Biography"),
    ("autobiography", "Biography"),
    ("history", "History"),
    ("philosophy", "Philosophy"),
    ("ethics", "Philosophy"),
    ("stoicism", "Philosophy"),
    ("science", "Science"),
    ("physics", "Science"),
    ("biology", "Science"),
    ("mathematics", "Science"),
    ("psychology", "Psychology"),
    ("self-help", "Self-Help"),
    ("productivity", "Self-Help"),
    ("business", "Business"),
    ("economics", "Business"),
    ("technology", "Technology"),
    ("programming", "Technology"),
    ("travel", "Travel"),
    ("young adult", "Young Adult"),
    ("ya", "Young Adult"),
];

/// Canonical genre for a tag, if the tag names a known genre.
pub fn known_genre(tag: &str) -> Option<&'static str> {
    let needle = tag.trim().to_lowercase();
    GENRE_KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == needle)
        .map(|(_, genre)| *genre)
}

/// Explicit genre, else the first tag naming a known genre, else the first
/// tag, else [`UNCATEGORIZED_GENRE`].
pub fn infer_genre(node: &Node) -> String {
    if let Some(genre) = node
        .genre
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return genre.to_owned();
    }

    if let Some(genre) = node.tags.iter().find_map(|tag| known_genre(tag)) {
        return genre.to_owned();
    }

    node.tags
        .first()
        .cloned()
        .unwrap_or_else(|| UNCATEGORIZED_GENRE.to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Classic,
    Modern,
    Contemporary,
}

impl Era {
    pub const ALL: [Era; 3] = [Self::Classic, Self::Modern, Self::Contemporary];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Modern => "modern",
            Self::Contemporary => "contemporary",
        }
    }
}

/// First publication year of the modern and contemporary eras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraBoundaries {
    pub modern_start: i32,
    pub contemporary_start: i32,
}

impl Default for EraBoundaries {
    fn default() -> Self {
        Self {
            modern_start: DEFAULT_MODERN_START,
            contemporary_start: DEFAULT_CONTEMPORARY_START,
        }
    }
}

impl EraBoundaries {
    pub fn classify(&self, year: i32) -> Era {
        if year >= self.contemporary_start {
            Era::Contemporary
        } else if year >= self.modern_start {
            Era::Modern
        } else {
            Era::Classic
        }
    }

    pub fn era_of(&self, node: &Node) -> Option<Era> {
        node.publication_year.map(|year| self.classify(year))
    }
}
