use anyhow::{Context, Result};
use libris_config::{config_path, ensure_workspace_config, load_workspace_config, validate_config};
use librisd::cli::{Cli, Commands, parse_cli};
use librisd::commands::{Engine, write_json};
use librisd::input::{parse_records, read_input};
use librisd::logging::init_logging;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_logging(cli.log_format)?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let workspace = cli.workspace.canonicalize().with_context(|| {
        format!(
            "failed to resolve workspace path {}",
            cli.workspace.display()
        )
    })?;

    if cli.command == Commands::Init {
        ensure_workspace_config(&workspace).with_context(|| {
            format!(
                "failed to create workspace config at {}",
                config_path(&workspace).display()
            )
        })?;
        println!("{}", config_path(&workspace).display());
        return Ok(());
    }

    let mut config = load_workspace_config(&workspace).with_context(|| {
        format!(
            "failed to load workspace config at {}",
            config_path(&workspace).display()
        )
    })?;
    for warning in validate_config(&config) {
        tracing::warn!(code = warning.code, "{}", warning.message);
    }
    if let Some(strategy) = cli.strategy {
        config.graph.strategy = strategy;
    }

    let raw = read_input(cli.input.as_deref())?;
    let records = parse_records(&raw)?;
    tracing::debug!(records = records.len(), "loaded input records");

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let engine = Engine {
        config: &config,
        as_of: Some(
            cli.as_of
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        ),
    };
    let value = engine.execute(&cli.command, &records, &mut rng)?;

    let mut out = std::io::stdout().lock();
    write_json(&mut out, &value)
}
