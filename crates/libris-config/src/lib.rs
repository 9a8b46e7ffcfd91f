use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LIBRIS_DIR_NAME: &str = ".libris";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_TAG_WEIGHT: f32 = 2.0;
pub const DEFAULT_AUTHOR_WEIGHT: f32 = 1.5;
pub const DEFAULT_TITLE_WEIGHT: f32 = 0.8;
pub const DEFAULT_TITLE_MIN_TOKEN_LEN: usize = 3;
pub const DEFAULT_RESONANCE_PROBABILITY: f64 = 0.15;
pub const DEFAULT_RESONANCE_STRENGTH: f32 = 0.5;
pub const DEFAULT_RESONANCE_MAX_TOUCHING: usize = 2;
pub const DEFAULT_FOCUS_BOOST: f32 = 1.0;
pub const DEFAULT_FOCUS_STRENGTH: f32 = 2.0;
pub const DEFAULT_RECENT_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_EXPANDING_RATIO: f32 = 1.5;
pub const DEFAULT_DORMANT_RATIO: f32 = 0.5;
pub const DEFAULT_DIVERSITY_WEIGHT: f32 = 0.5;
pub const DEFAULT_RECENCY_WEIGHT: f32 = 0.5;
pub const DEFAULT_MAX_BRIDGES: usize = 6;
pub const MIN_BRIDGES: usize = 4;
pub const MAX_BRIDGES: usize = 8;
pub const DEFAULT_MAX_THEMATIC_OVERLAP: usize = 3;
pub const DEFAULT_YEAR_WINDOW: u32 = 20;
pub const DEFAULT_THEMATIC_WEIGHT: f32 = 1.0;
pub const DEFAULT_TEMPORAL_WEIGHT: f32 = 0.8;
pub const DEFAULT_STYLISTIC_WEIGHT: f32 = 0.7;
pub const DEFAULT_PHILOSOPHICAL_WEIGHT: f32 = 0.9;
pub const DEFAULT_MODERN_START_YEAR: i32 = 1950;
pub const DEFAULT_CONTEMPORARY_START_YEAR: i32 = 2000;
pub const DEFAULT_MAJORITY_SHARE: f32 = 0.6;
pub const DEFAULT_CONSISTENCY_TOP_TAGS: usize = 3;
pub const DEFAULT_ACCELERATING_RATIO: f32 = 1.2;
pub const DEFAULT_DECELERATING_RATIO: f32 = 0.8;
pub const DEFAULT_LIST_CAP: usize = 4;
pub const DEFAULT_TOP_NEIGHBORS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStrategy {
    #[default]
    Pairwise,
    Indexed,
}

impl CandidateStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pairwise => "pairwise",
            Self::Indexed => "indexed",
        }
    }
}

impl std::str::FromStr for CandidateStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pairwise" => Ok(Self::Pairwise),
            "indexed" => Ok(Self::Indexed),
            other => Err(format!(
                "invalid candidate strategy '{other}', expected one of: pairwise, indexed"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LibrisConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub remap: RemapConfig,
    #[serde(default)]
    pub clusters: ClusterConfig,
    #[serde(default)]
    pub bridges: BridgeConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub explain: ExplainConfig,
}

/// Edge weights and resonance policy for the graph builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub strategy: CandidateStrategy,
    pub tag_weight: f32,
    pub author_weight: f32,
    pub title_weight: f32,
    /// Title tokens must be strictly longer than this many characters.
    pub title_min_token_len: usize,
    pub resonance_probability: f64,
    pub resonance_strength: f32,
    /// Resonance is only considered while fewer edges than this touch the pair.
    pub resonance_max_touching: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            strategy: CandidateStrategy::Pairwise,
            tag_weight: DEFAULT_TAG_WEIGHT,
            author_weight: DEFAULT_AUTHOR_WEIGHT,
            title_weight: DEFAULT_TITLE_WEIGHT,
            title_min_token_len: DEFAULT_TITLE_MIN_TOKEN_LEN,
            resonance_probability: DEFAULT_RESONANCE_PROBABILITY,
            resonance_strength: DEFAULT_RESONANCE_STRENGTH,
            resonance_max_touching: DEFAULT_RESONANCE_MAX_TOUCHING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapConfig {
    pub focus_boost: f32,
    pub focus_strength: f32,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            focus_boost: DEFAULT_FOCUS_BOOST,
            focus_strength: DEFAULT_FOCUS_STRENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub recent_window_days: u32,
    pub expanding_ratio: f32,
    pub dormant_ratio: f32,
    pub diversity_weight: f32,
    pub recency_weight: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
            expanding_ratio: DEFAULT_EXPANDING_RATIO,
            dormant_ratio: DEFAULT_DORMANT_RATIO,
            diversity_weight: DEFAULT_DIVERSITY_WEIGHT,
            recency_weight: DEFAULT_RECENCY_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub max_bridges: usize,
    pub max_thematic_overlap: usize,
    pub year_window: u32,
    pub thematic_weight: f32,
    pub temporal_weight: f32,
    pub stylistic_weight: f32,
    pub philosophical_weight: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_bridges: DEFAULT_MAX_BRIDGES,
            max_thematic_overlap: DEFAULT_MAX_THEMATIC_OVERLAP,
            year_window: DEFAULT_YEAR_WINDOW,
            thematic_weight: DEFAULT_THEMATIC_WEIGHT,
            temporal_weight: DEFAULT_TEMPORAL_WEIGHT,
            stylistic_weight: DEFAULT_STYLISTIC_WEIGHT,
            philosophical_weight: DEFAULT_PHILOSOPHICAL_WEIGHT,
        }
    }
}

impl BridgeConfig {
    pub fn effective_max_bridges(&self) -> usize {
        self.max_bridges.clamp(MIN_BRIDGES, MAX_BRIDGES)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub modern_start_year: i32,
    pub contemporary_start_year: i32,
    pub majority_share: f32,
    pub consistency_top_tags: usize,
    pub recent_window_days: u32,
    pub accelerating_ratio: f32,
    pub decelerating_ratio: f32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            modern_start_year: DEFAULT_MODERN_START_YEAR,
            contemporary_start_year: DEFAULT_CONTEMPORARY_START_YEAR,
            majority_share: DEFAULT_MAJORITY_SHARE,
            consistency_top_tags: DEFAULT_CONSISTENCY_TOP_TAGS,
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
            accelerating_ratio: DEFAULT_ACCELERATING_RATIO,
            decelerating_ratio: DEFAULT_DECELERATING_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub list_cap: usize,
    pub top_neighbors: usize,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            list_cap: DEFAULT_LIST_CAP,
            top_neighbors: DEFAULT_TOP_NEIGHBORS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub code: &'static str,
    pub message: String,
}

pub fn libris_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(LIBRIS_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    libris_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<LibrisConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(LibrisConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    parse_config(&raw)
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<LibrisConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(libris_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = LibrisConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

pub fn parse_config(raw: &str) -> Result<LibrisConfig, ConfigError> {
    let parsed: LibrisConfig = toml::from_str(raw)?;
    Ok(normalize_config(parsed))
}

/// Reports values that the engine will clamp or ignore at use.
pub fn validate_config(config: &LibrisConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let graph = &config.graph;

    if !(0.0..=1.0).contains(&graph.resonance_probability) {
        warnings.push(ConfigWarning {
            code: "graph_resonance_probability",
            message: format!(
                "[graph].resonance_probability={} is outside 0..=1 and will be clamped",
                graph.resonance_probability
            ),
        });
    }
    for (name, value) in [
        ("tag_weight", graph.tag_weight),
        ("author_weight", graph.author_weight),
        ("title_weight", graph.title_weight),
        ("resonance_strength", graph.resonance_strength),
    ] {
        if value < 0.0 {
            warnings.push(ConfigWarning {
                code: "graph_negative_weight",
                message: format!("[graph].{name}={value} is negative and will be treated as 0"),
            });
        }
    }

    if config.remap.focus_boost < 0.0 || config.remap.focus_strength < 0.0 {
        warnings.push(ConfigWarning {
            code: "remap_negative_weight",
            message: "[remap] focus weights must be non-negative; negatives are treated as 0"
                .to_owned(),
        });
    }

    let clusters = &config.clusters;
    if clusters.diversity_weight + clusters.recency_weight <= 0.0 {
        warnings.push(ConfigWarning {
            code: "clusters_zero_weights",
            message: "[clusters] diversity_weight + recency_weight is zero; health scores will be 0"
                .to_owned(),
        });
    }
    if clusters.dormant_ratio > clusters.expanding_ratio {
        warnings.push(ConfigWarning {
            code: "clusters_growth_thresholds",
            message: format!(
                "[clusters].dormant_ratio={} exceeds expanding_ratio={}",
                clusters.dormant_ratio, clusters.expanding_ratio
            ),
        });
    }

    let max_bridges = config.bridges.max_bridges;
    if !(MIN_BRIDGES..=MAX_BRIDGES).contains(&max_bridges) {
        warnings.push(ConfigWarning {
            code: "bridges_max_bridges",
            message: format!(
                "[bridges].max_bridges={max_bridges} is outside {MIN_BRIDGES}..={MAX_BRIDGES} and will be clamped"
            ),
        });
    }

    let metrics = &config.metrics;
    if metrics.modern_start_year >= metrics.contemporary_start_year {
        warnings.push(ConfigWarning {
            code: "metrics_era_boundaries",
            message: format!(
                "[metrics].modern_start_year={} must precede contemporary_start_year={}",
                metrics.modern_start_year, metrics.contemporary_start_year
            ),
        });
    }
    if !(0.0..=1.0).contains(&metrics.majority_share) {
        warnings.push(ConfigWarning {
            code: "metrics_majority_share",
            message: format!(
                "[metrics].majority_share={} is outside 0..=1 and will be clamped",
                metrics.majority_share
            ),
        });
    }

    warnings
}

fn normalize_config(mut config: LibrisConfig) -> LibrisConfig {
    config.clusters.recent_window_days = config.clusters.recent_window_days.max(1);
    config.metrics.recent_window_days = config.metrics.recent_window_days.max(1);
    config.metrics.consistency_top_tags = config.metrics.consistency_top_tags.max(1);
    config.explain.list_cap = config.explain.list_cap.max(1);
    config.explain.top_neighbors = config.explain.top_neighbors.max(1);
    config
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn ensure_workspace_config_creates_default_file() {
        let temp = tempdir().expect("tempdir");
        let workspace = temp.path();

        let config = ensure_workspace_config(workspace).expect("ensure config");

        assert_eq!(config, LibrisConfig::default());
        assert!(config_path(workspace).exists());

        let content = fs::read_to_string(config_path(workspace)).expect("read config file");
        assert!(content.contains("[graph]"));
        assert!(content.contains("strategy = \"pairwise\""));
        assert!(content.contains("tag_weight = 2.0"));
    }

    #[test]
    fn load_workspace_config_defaults_when_file_is_missing() {
        let temp = tempdir().expect("tempdir");
        let config = load_workspace_config(temp.path()).expect("load config");
        assert_eq!(config, LibrisConfig::default());
    }

    #[test]
    fn load_workspace_config_merges_partial_sections_with_defaults() {
        let temp = tempdir().expect("tempdir");
        let workspace = temp.path();
        fs::create_dir_all(libris_dir(workspace)).expect("create .libris");

        let raw = r#"
[graph]
strategy = "indexed"
resonance_probability = 0.0

[clusters]
recent_window_days = 0

[explain]
list_cap = 2
"#;
        fs::write(config_path(workspace), raw).expect("write config");

        let config = load_workspace_config(workspace).expect("load config");

        assert_eq!(config.graph.strategy, CandidateStrategy::Indexed);
        assert_eq!(config.graph.resonance_probability, 0.0);
        assert_eq!(config.graph.tag_weight, DEFAULT_TAG_WEIGHT);
        assert_eq!(config.clusters.recent_window_days, 1);
        assert_eq!(config.explain.list_cap, 2);
        assert_eq!(config.explain.top_neighbors, DEFAULT_TOP_NEIGHBORS);
        assert_eq!(config.bridges, BridgeConfig::default());
    }

    #[test]
    fn bridge_signal_weights_fall_back_per_field() {
        let config = parse_config("[bridges]\nstylistic_weight = 0.25\n").expect("parse config");

        assert_eq!(config.bridges.stylistic_weight, 0.25);
        assert_eq!(config.bridges.thematic_weight, DEFAULT_THEMATIC_WEIGHT);
        assert_eq!(config.bridges.temporal_weight, DEFAULT_TEMPORAL_WEIGHT);
        assert_eq!(
            config.bridges.philosophical_weight,
            DEFAULT_PHILOSOPHICAL_WEIGHT
        );
        assert_eq!(
            BridgeConfig::default().stylistic_weight,
            DEFAULT_STYLISTIC_WEIGHT
        );
    }

    #[test]
    fn invalid_toml_is_reported() {
        let error = parse_config("[graph\nstrategy = 1").expect_err("parse should fail");
        assert!(matches!(error, ConfigError::TomlParse(_)));
    }

    #[test]
    fn validate_config_flags_out_of_range_values() {
        assert!(validate_config(&LibrisConfig::default()).is_empty());

        let mut config = LibrisConfig::default();
        config.graph.resonance_probability = 1.5;
        config.graph.author_weight = -1.0;
        config.bridges.max_bridges = 20;
        config.metrics.modern_start_year = 2010;

        let codes = validate_config(&config)
            .into_iter()
            .map(|warning| warning.code)
            .collect::<Vec<_>>();
        assert!(codes.contains(&"graph_resonance_probability"));
        assert!(codes.contains(&"graph_negative_weight"));
        assert!(codes.contains(&"bridges_max_bridges"));
        assert!(codes.contains(&"metrics_era_boundaries"));
    }

    #[test]
    fn max_bridges_is_clamped_to_display_range() {
        let mut config = BridgeConfig::default();
        config.max_bridges = 1;
        assert_eq!(config.effective_max_bridges(), MIN_BRIDGES);
        config.max_bridges = 50;
        assert_eq!(config.effective_max_bridges(), MAX_BRIDGES);
    }
}
