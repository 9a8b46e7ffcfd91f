use libris_core::{Bridge, Cluster, Edge, MetricsBundle, Node};

mod bridges;
mod clusters;
mod metrics;

pub use bridges::BridgeDetector;
pub use clusters::ClusterAnalyzer;
pub use metrics::{PatternMetrics, genre_profile};

/// Tag clusters with default weights, measured at the latest addition.
pub fn analyze_clusters(nodes: &[Node], edges: &[Edge]) -> Vec<Cluster> {
    ClusterAnalyzer::default().analyze(nodes, edges, None)
}

pub fn detect_bridges(nodes: &[Node], edges: &[Edge]) -> Vec<Bridge> {
    BridgeDetector::default().detect(nodes, edges)
}

pub fn compute_metrics(nodes: &[Node]) -> MetricsBundle {
    PatternMetrics::default().compute(nodes, None)
}
