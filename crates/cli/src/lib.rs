//! Command-line interface for the buswatch binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default configuration path used by `start` and `validate`.
pub const DEFAULT_CONFIG_PATH: &str = "master_config/buswatch.yaml";

#[derive(Parser, Debug)]
#[command(name = "buswatch")]
#[command(about = "buswatch - read-only HTTP API over bus position observations")]
#[command(version)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, env = "BUSWATCH_LOG_FORMAT")]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server with the given configuration
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the HTTP port
        #[arg(long)]
        http: Option<u16>,
    },

    /// Validate configuration without starting the server
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Write a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "buswatch.yaml")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Multi-line human-readable output
    Pretty,
    /// One JSON object per line
    Json,
    /// Single-line human-readable output
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_start_defaults() {
        let cli = Cli::try_parse_from(["buswatch", "start"]).unwrap();
        match cli.command {
            Commands::Start { config, host, http } => {
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_PATH));
                assert!(host.is_none());
                assert!(http.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_start_overrides() {
        let cli = Cli::try_parse_from([
            "buswatch", "start", "-c", "prod.yaml", "--host", "127.0.0.1", "--http", "8080",
        ])
        .unwrap();
        match cli.command {
            Commands::Start { config, host, http } => {
                assert_eq!(config, PathBuf::from("prod.yaml"));
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(http, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_log_format() {
        let cli = Cli::try_parse_from(["buswatch", "validate", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormatArg::Json));
        assert_eq!(cli.log_format.map(|f| f.as_str()), Some("json"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["buswatch", "start", "--http", "70000"]).is_err());
    }

    #[test]
    fn test_init_output() {
        let cli = Cli::try_parse_from(["buswatch", "init", "-o", "out/buswatch.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Init { output } if output == PathBuf::from("out/buswatch.yaml")
        ));
    }
}
