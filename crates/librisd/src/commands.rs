use std::io::Write;

use anyhow::{Context, Result};
use libris_analysis::{BridgeDetector, ClusterAnalyzer, PatternMetrics};
use libris_config::LibrisConfig;
use libris_core::{EraBoundaries, normalize_records};
use libris_graph::{ConnectionExplainer, GraphBuilder, QueryRemapper, summarize};
use rand::Rng;
use serde_json::Value;

use crate::cli::Commands;

const MAX_SUMMARY_LIMIT: usize = 100;

/// Everything one engine invocation needs besides the command itself.
pub struct Engine<'a> {
    pub config: &'a LibrisConfig,
    /// Unix milliseconds treated as "now" by recency-aware analyses.
    pub as_of: Option<i64>,
}

impl Engine<'_> {
    fn builder(&self) -> GraphBuilder {
        GraphBuilder::new(self.config.graph.clone())
    }

    /// Runs one read-only command over `records` and returns its JSON output.
    pub fn execute<R: Rng + ?Sized>(
        &self,
        command: &Commands,
        records: &[Value],
        rng: &mut R,
    ) -> Result<Value> {
        let value = match command {
            Commands::Init => anyhow::bail!("init does not operate on records"),
            Commands::Graph => {
                let graph = self.builder().build_graph(records, rng);
                serde_json::to_value(graph).context("failed to serialize graph")?
            }
            Commands::Clusters => {
                let graph = self.builder().build_graph(records, rng);
                let clusters = ClusterAnalyzer::new(self.config.clusters.clone()).analyze(
                    &graph.nodes,
                    &graph.edges,
                    self.as_of,
                );
                serde_json::to_value(clusters).context("failed to serialize clusters")?
            }
            Commands::Bridges => {
                let graph = self.builder().build_graph(records, rng);
                let bridges = BridgeDetector::new(self.config.bridges.clone())
                    .detect(&graph.nodes, &graph.edges);
                serde_json::to_value(bridges).context("failed to serialize bridges")?
            }
            Commands::Metrics => {
                let nodes = normalize_records(records).nodes;
                let metrics =
                    PatternMetrics::new(self.config.metrics.clone()).compute(&nodes, self.as_of);
                serde_json::to_value(metrics).context("failed to serialize metrics")?
            }
            Commands::Remap(args) => {
                let nodes = normalize_records(records).nodes;
                let remapper = QueryRemapper::new(self.builder(), self.config.remap.clone());
                let edges = remapper.remap(&nodes, &args.filter, args.focus.as_deref(), rng);
                serde_json::to_value(edges).context("failed to serialize remapped edges")?
            }
            Commands::Explain(args) => {
                let graph = self.builder().build_graph(records, rng);
                let eras = EraBoundaries {
                    modern_start: self.config.metrics.modern_start_year,
                    contemporary_start: self.config.metrics.contemporary_start_year,
                };
                let breakdown = ConnectionExplainer::new(self.config.explain.clone(), eras)
                    .explain(&args.node_id, &graph.nodes, &graph.edges);
                serde_json::to_value(breakdown).context("failed to serialize breakdown")?
            }
            Commands::Summary(args) => {
                let graph = self.builder().build_graph(records, rng);
                let summary = summarize(
                    &graph.nodes,
                    &graph.edges,
                    args.limit.clamp(1, MAX_SUMMARY_LIMIT),
                );
                serde_json::to_value(summary).context("failed to serialize summary")?
            }
        };
        Ok(value)
    }
}

pub fn write_json(out: &mut impl Write, value: &Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize JSON output")?;
    writeln!(out).context("failed to write trailing newline")?;
    Ok(())
}
