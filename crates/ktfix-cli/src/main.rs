//! ktfix CLI tool.
//!
//! Usage:
//! ```bash
//! ktfix lint [OPTIONS] [PATHS]...
//! ktfix format [OPTIONS] [PATHS]...
//! ktfix list-rules
//! ktfix init
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ktfix::rules::Preset;
use ktfix::DEFAULT_MAX_PASSES;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

use commands::reporter::ReporterKind;

/// Kotlin linter and formatter
#[derive(Parser)]
#[command(name = "ktfix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Property file applied on top of every `.ktfix.toml`
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report style violations
    Lint(RunArgs),

    /// Fix style violations in place
    Format {
        #[command(flatten)]
        args: RunArgs,

        /// Report what would be fixed without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// List available rules, presets and properties
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Options shared by `lint` and `format`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Files or directories to check (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ReporterKind::Plain)]
    pub reporter: ReporterKind,

    /// Standard rules to load
    #[arg(long, value_enum, default_value_t = PresetArg::All)]
    pub preset: PresetArg,

    /// Property override, e.g. `max_line_length=100` (can be specified multiple times)
    #[arg(short = 'P', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Code style providing property defaults
    #[arg(long, value_parser = ["ktfix_official", "intellij_idea", "android_studio"])]
    pub code_style: Option<String>,

    /// Maximum number of format passes
    #[arg(long, default_value_t = DEFAULT_MAX_PASSES)]
    pub max_passes: usize,

    /// Exclude glob patterns (can be specified multiple times)
    #[arg(short, long)]
    pub exclude: Vec<String>,
}

/// Preset selection on the command line.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum PresetArg {
    /// Whitespace and layout rules that fix what they report.
    Recommended,
    /// Every standard rule.
    #[default]
    All,
}

impl From<PresetArg> for Preset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Recommended => Self::Recommended,
            PresetArg::All => Self::All,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Lint(args) => commands::lint::run(&args, cli.config.as_deref()),
        Commands::Format { args, dry_run } => {
            commands::format::run(&args, dry_run, cli.config.as_deref())
        }
        Commands::ListRules => {
            print!("{}", commands::list_rules::render());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            let path = commands::init::run(std::path::Path::new("."), force)?;
            println!("Created {}", path.display());
            println!("\nNext steps:");
            println!("  1. Edit {} to configure properties", path.display());
            println!("  2. Run: ktfix lint");
            Ok(ExitCode::SUCCESS)
        }
    }
}
