//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Redakt using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Redakt - PII redaction for Czech legal documents
#[derive(Parser, Debug)]
#[command(name = "redakt")]
#[command(version, about, long_about = None)]
#[command(author = "Redakt Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults to ./redakt.toml when present)
    #[arg(short, long, env = "REDAKT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REDAKT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Redact documents and write tagged text plus entity maps
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Re-check a tagged document against its entity map
    Verify(commands::verify::VerifyArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::Mode;

    #[test]
    fn test_cli_parse_anonymize() {
        let cli = Cli::parse_from(["redakt", "anonymize", "smlouva.txt"]);
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Anonymize(args) => {
                assert_eq!(args.paths, vec![PathBuf::from("smlouva.txt")]);
                assert!(args.mode.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_anonymize_options() {
        let cli = Cli::parse_from([
            "redakt",
            "anonymize",
            "a.txt",
            "docs/",
            "--mode",
            "production",
            "--output-dir",
            "out",
            "--dictionary",
            "names.json",
        ]);
        let Commands::Anonymize(args) = cli.command else {
            panic!("expected anonymize");
        };
        assert_eq!(args.paths.len(), 2);
        assert_eq!(args.mode, Some(Mode::Production));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.dictionary, Some(PathBuf::from("names.json")));
    }

    #[test]
    fn test_cli_anonymize_requires_paths() {
        assert!(Cli::try_parse_from(["redakt", "anonymize"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["redakt", "anonymize", "a.txt", "--mode", "strict"]).is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["redakt", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["redakt", "--log-level", "debug", "init"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_verify() {
        let cli = Cli::parse_from(["redakt", "verify", "a_anon.txt", "a_map.json"]);
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.anon, PathBuf::from("a_anon.txt"));
        assert_eq!(args.map, PathBuf::from("a_map.json"));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["redakt", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["redakt", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
