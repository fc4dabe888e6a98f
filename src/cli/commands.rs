//! CLI command definitions for monfix.
//!
//! The binary mirrors what the library does inside a test suite: `up`
//! brings a monitor fixture to the ready state and leaves it running,
//! `clean` removes fixture resources, `tags` prints the catalog, and
//! `report` dumps diagnostics for whatever harness containers exist.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use crate::catalog::RELEASE_LINES;
use crate::config::HarnessConfig;
use crate::engine::DockerEngine;
use crate::fixture::{collect_diagnostics, FixtureController};

/// Disposable monitor-container fixtures for integration test suites.
#[derive(Parser)]
#[command(name = "monfix")]
#[command(about = "Provision and tear down monitor-container test fixtures")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Provision a monitor fixture and leave it running.
    Up(UpArgs),

    /// Remove fixture containers and networks.
    Clean(CleanArgs),

    /// List the image tag catalog.
    Tags(TagsArgs),

    /// Print inspect and log diagnostics for harness containers.
    Report(ReportArgs),
}

#[derive(Parser, Debug)]
pub struct UpArgs {
    /// Image tag to run; defaults to the first catalog entry.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Optional YAML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use run-scoped resource names instead of the fixed defaults.
    #[arg(long)]
    pub unique: bool,
}

#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Optional YAML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sweep every harness-labeled resource, not just this run's names.
    #[arg(long)]
    pub all: bool,
}

#[derive(Parser, Debug)]
pub struct TagsArgs {
    /// Restrict output to one release line (hammer, jewel, infernalis).
    #[arg(short, long)]
    pub release: Option<String>,

    /// Optional YAML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ReportArgs {}

/// Parses CLI arguments from the process environment.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Up(args) => up(args).await,
        Commands::Clean(args) => clean(args).await,
        Commands::Tags(args) => tags(args),
        Commands::Report(args) => report(args).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<HarnessConfig> {
    Ok(match path {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    })
}

async fn up(args: UpArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if args.unique {
        config = config.with_run_id();
    }

    let tag = match args.tag {
        Some(tag) => tag,
        None => config
            .catalog
            .first()
            .ok_or_else(|| anyhow::anyhow!("tag catalog is empty"))?
            .to_string(),
    };

    let engine = DockerEngine::connect()?;
    let mut controller = FixtureController::new(engine, config);
    let fixture = controller.up(&tag).await?;

    println!("container: {} ({})", fixture.container_name, fixture.container_id);
    println!("network:   {}", fixture.network_name);
    println!("address:   {}", fixture.address);
    println!("image:     {}", fixture.image);
    Ok(())
}

async fn clean(args: CleanArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let engine = DockerEngine::connect()?;
    let controller = FixtureController::new(engine, config);

    if args.all {
        let removed = controller.sweep_labeled().await?;
        println!("removed {removed} labeled resources");
    } else {
        controller.ensure_clean().await?;
        info!("fixture resources removed");
    }
    Ok(())
}

fn tags(args: TagsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;

    match args.release {
        Some(line) => {
            if !RELEASE_LINES.contains(&line.as_str()) {
                anyhow::bail!(
                    "unknown release line '{line}', expected one of: {}",
                    RELEASE_LINES.join(", ")
                );
            }
            for tag in config.catalog.release_line(&line) {
                println!("{tag}");
            }
        }
        None => {
            for tag in config.catalog.all() {
                println!("{tag}");
            }
        }
    }
    Ok(())
}

async fn report(_args: ReportArgs) -> anyhow::Result<()> {
    let engine = DockerEngine::connect()?;

    for report in collect_diagnostics(&engine).await {
        print!("{}", report.render());
    }
    Ok(())
}
