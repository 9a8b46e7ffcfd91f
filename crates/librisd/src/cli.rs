use std::ffi::OsStr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use libris_config::CandidateStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid log format '{other}', expected one of: human, json"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct RemapArgs {
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "TAG",
        help = "Comma-separated tags restricting the population"
    )]
    pub filter: Vec<String>,

    #[arg(long, value_name = "TAG", help = "Tag whose books are pulled together")]
    pub focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ExplainArgs {
    #[arg(help = "Id of the book to explain")]
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SummaryArgs {
    #[arg(
        long,
        default_value_t = 10,
        help = "Number of top tags and authors to report (clamped to 1..100)"
    )]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Write a default .libris/config.toml if none exists
    Init,
    /// Build the relationship graph
    Graph,
    /// Per-tag clusters with health scores
    Clusters,
    /// Cross-cluster bridges
    Bridges,
    /// Reading-pattern metrics
    Metrics,
    /// Rebuild edges under tag filters and an optional focus tag
    Remap(RemapArgs),
    /// Explain why one book connects to its neighbours
    Explain(ExplainArgs),
    /// Compact graph summary for downstream consumers
    Summary(SummaryArgs),
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Libris relationship graph engine")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Workspace root holding .libris/config.toml"
    )]
    pub workspace: PathBuf,

    #[arg(
        long,
        global = true,
        help = "JSON file with book records; '-' or absent reads stdin"
    )]
    pub input: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Seed for resonance edges; random when absent"
    )]
    pub seed: Option<u64>,

    #[arg(
        long,
        global = true,
        value_parser = parse_strategy,
        help = "Candidate strategy override: pairwise or indexed"
    )]
    pub strategy: Option<CandidateStrategy>,

    #[arg(
        long,
        global = true,
        value_parser = parse_as_of,
        help = "RFC 3339 timestamp used as 'now' for recency metrics"
    )]
    pub as_of: Option<i64>,

    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = parse_log_format,
        help = "Log format: human or json"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

pub fn parse_cli() -> Cli {
    let mut args: Vec<_> = std::env::args_os().collect();
    if args.get(1).is_some_and(|arg| arg == OsStr::new("--")) {
        args.remove(1);
    }

    Cli::parse_from(args)
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

fn parse_strategy(value: &str) -> Result<CandidateStrategy, String> {
    value.parse()
}

fn parse_as_of(value: &str) -> Result<i64, String> {
    chrono::DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.timestamp_millis())
        .map_err(|err| format!("invalid timestamp '{value}': {err}"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn remap_subcommand_parses_filters_and_focus() {
        let cli = Cli::try_parse_from([
            "librisd",
            "--input",
            "books.json",
            "--seed",
            "7",
            "remap",
            "--filter",
            "Cyberpunk,Noir",
            "--focus",
            "Noir",
        ])
        .expect("remap flags should parse");

        assert_eq!(cli.input, Some(PathBuf::from("books.json")));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(
            cli.command,
            Commands::Remap(RemapArgs {
                filter: vec!["Cyberpunk".to_owned(), "Noir".to_owned()],
                focus: Some("Noir".to_owned()),
            })
        );
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "librisd",
            "explain",
            "neuromancer",
            "--log-format",
            "json",
            "--strategy",
            "indexed",
        ])
        .expect("explain should parse");

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.strategy, Some(CandidateStrategy::Indexed));
        assert_eq!(
            cli.command,
            Commands::Explain(ExplainArgs {
                node_id: "neuromancer".to_owned(),
            })
        );
    }

    #[test]
    fn summary_defaults_and_as_of_parsing() {
        let cli = Cli::try_parse_from(["librisd", "--as-of", "2024-01-02T00:00:00Z", "summary"])
            .expect("summary should parse");
        assert_eq!(cli.as_of, Some(1_704_153_600_000));
        assert_eq!(cli.command, Commands::Summary(SummaryArgs { limit: 10 }));
        assert_eq!(cli.log_format.as_str(), "human");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["librisd", "--log-format", "xml", "graph"]).is_err());
        assert!(Cli::try_parse_from(["librisd", "--strategy", "greedy", "graph"]).is_err());
        assert!(Cli::try_parse_from(["librisd", "--as-of", "yesterday", "graph"]).is_err());
        assert!(Cli::try_parse_from(["librisd"]).is_err());
    }
}
