//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Forkline - fan lines out to parallel branches and merge them back
#[derive(Parser, Debug)]
#[command(
    name = "forkline",
    author,
    version,
    about = "Fork/join stream combinator for line-oriented input",
    long_about = "Reads lines from stdin or a file, runs them through every configured \n\
                  branch concurrently, and prints the merged output. Batches in the \n\
                  configuration are separated by join barriers: a later batch's output \n\
                  follows every earlier batch's output."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FORKLINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "FORKLINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured fork over the input
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "fork.toml", env = "FORKLINE_CONFIG")]
    pub config: PathBuf,

    /// Input file (defaults to stdin)
    #[arg(short, long, env = "FORKLINE_INPUT")]
    pub input: Option<PathBuf>,

    /// Prefix every output line with its branch name
    #[arg(long)]
    pub label: bool,

    /// Override the channel capacity from configuration
    #[arg(long, env = "FORKLINE_CHANNEL_CAPACITY")]
    pub channel_capacity: Option<usize>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Print run statistics to stderr when done
    #[arg(long)]
    pub stats: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FORKLINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "fork.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from([
            "forkline",
            "-v",
            "run",
            "--config",
            "x.toml",
            "--input",
            "in.txt",
            "--label",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("x.toml"));
                assert_eq!(args.input, Some(PathBuf::from("in.txt")));
                assert!(args.label);
                assert!(!args.dry_run);
            }
            Commands::Validate(_) => panic!("expected run"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["forkline", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
