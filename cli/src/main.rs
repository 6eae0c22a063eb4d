//! Tally CLI: replay token scripts against an in-memory deployment.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tally_cli::{run_script, CliConfig, Script};
use tally_utils::LogFormat;

#[derive(Parser)]
#[command(name = "tally", about = "Staking token ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a JSON script of token operations and print the events.
    Run {
        /// Script file.
        #[arg(long)]
        script: PathBuf,

        /// Stop at the first rejected step.
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    tally_utils::init_logging(config.log_format, &config.log_level);
    if let Some(ref path) = cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Run { script, strict } => {
            let parsed = Script::from_json_file(&script)?;
            tracing::info!(steps = parsed.steps.len(), script = %script.display(), "replaying");

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let summary = run_script(&config, &parsed, strict, &mut out)?;
            writeln!(out, "{}", serde_json::to_string(&summary)?)?;
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
