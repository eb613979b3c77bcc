//! CLI for the ratemeter progress estimator.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ratemeter_core::config::{self, ProgressMode};

use commands::{run_cat, run_completions, run_config, CatArgs};

/// Top-level CLI for ratemeter.
#[derive(Debug, Parser)]
#[command(name = "ratemeter")]
#[command(about = "ratemeter: copy a stream while showing throughput and ETA", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Copy INPUT to OUTPUT, drawing a status line on stderr.
    Cat {
        /// File to read, or `-` for stdin.
        input: String,

        /// File to write (default: stdout).
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<String>,

        /// Expected number of bytes (default: size of INPUT when it is a regular file).
        #[arg(long, value_name = "BYTES")]
        size: Option<u64>,

        /// Throughput window in milliseconds (overrides config).
        #[arg(long, value_name = "MS")]
        window_ms: Option<u64>,

        /// When to draw the status line (overrides config).
        #[arg(long, value_enum)]
        progress: Option<ProgressFlag>,
    },

    /// Show the config file location and effective settings.
    Config,

    /// Print a shell completion script to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// `--progress` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProgressFlag {
    Auto,
    Always,
    Never,
}

impl From<ProgressFlag> for ProgressMode {
    fn from(flag: ProgressFlag) -> Self {
        match flag {
            ProgressFlag::Auto => ProgressMode::Auto,
            ProgressFlag::Always => ProgressMode::Always,
            ProgressFlag::Never => ProgressMode::Never,
        }
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Cat {
                input,
                output,
                size,
                window_ms,
                progress,
            } => {
                let args = CatArgs {
                    input,
                    output,
                    size,
                    window_ms,
                    progress: progress.map_or(cfg.progress, ProgressMode::from),
                };
                run_cat(&cfg, &args)?;
            }
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
