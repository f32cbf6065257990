//! querytree command line
//!
//! Validates and normalizes rule trees against a builder configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use querytree_cli::commands::{self, RunOptions};
use querytree_cli::{CliConfig, OutputFormat};
use querytree_core::FlagsExport;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "querytree")]
#[command(version)]
#[command(about = "Validate and normalize query builder rule trees")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Builder configuration file (YAML or JSON)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Import unknown references and export invalid trees
    #[arg(long, global = true)]
    allow_invalid: bool,

    /// Ignore rules without a filter or value
    #[arg(long, global = true)]
    skip_empty: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FlagsMode {
    None,
    Diff,
    All,
}

impl From<FlagsMode> for FlagsExport {
    fn from(mode: FlagsMode) -> Self {
        match mode {
            FlagsMode::None => FlagsExport::None,
            FlagsMode::Diff => FlagsExport::Diff,
            FlagsMode::All => FlagsExport::All,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import a rules file and report validation errors
    Validate {
        /// Rules file (YAML or JSON)
        rules: PathBuf,
    },

    /// Import a rules file and print it back in canonical form
    Normalize {
        /// Rules file (YAML or JSON)
        rules: PathBuf,

        /// Flags to include in the output
        #[arg(long, default_value = "none", value_enum)]
        flags: FlagsMode,
    },

    /// List configured filters with their operators
    Filters,

    /// List operators usable with a filter
    Operators {
        /// Filter id
        filter: String,
    },
}

fn main() -> Result<ExitCode> {
    init_tracing()?;

    let cli = Cli::parse();
    let settings = CliConfig::load()?;

    let config_path = cli
        .config
        .or(settings.builder_config.clone())
        .context("No builder configuration given (use --config or QUERYTREE_BUILDER_CONFIG)")?;
    let format = cli.format.unwrap_or(settings.format);
    let options = RunOptions {
        allow_invalid: cli.allow_invalid || settings.allow_invalid,
        skip_empty: cli.skip_empty || settings.skip_empty,
    };

    let mut builder = commands::load_builder(&config_path)?;

    let status = match cli.command {
        Commands::Validate { rules } => {
            let rules = commands::read_rules(&rules)?;
            let report = commands::validate(&mut builder, &rules, &options)?;
            println!("{}", commands::render(&report, format, settings.pretty)?);
            if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Normalize { rules, flags } => {
            let rules = commands::read_rules(&rules)?;
            match commands::normalize(&mut builder, &rules, &options, flags.into())? {
                Some(normalized) => {
                    println!("{}", commands::render(&normalized, format, settings.pretty)?);
                    ExitCode::SUCCESS
                }
                None => {
                    info!("Rules are invalid, nothing exported (use --allow-invalid)");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Filters => {
            let filters = commands::list_filters(&builder);
            println!("{}", commands::render(&filters, format, settings.pretty)?);
            ExitCode::SUCCESS
        }
        Commands::Operators { filter } => {
            let operators = commands::list_operators(&builder, &filter)?;
            println!("{}", commands::render(&operators, format, settings.pretty)?);
            ExitCode::SUCCESS
        }
    };

    Ok(status)
}

/// Initialize tracing subscriber
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "querytree=info,querytree_cli=info,querytree_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
