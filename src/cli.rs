// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::RendererKind;

/// Command-line arguments for `keydag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "keydag",
    version,
    about = "Run shell tasks ordered by the keys they require and provide.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Keydag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Keydag.toml")]
    pub config: String,

    /// Only run what is needed to produce this key. Repeatable; overrides
    /// `[config].target`.
    #[arg(long = "target", value_name = "KEY")]
    pub targets: Vec<String>,

    /// How to display progress. Overrides `[config].renderer`.
    #[arg(long, value_enum, value_name = "KIND")]
    pub renderer: Option<RendererKind>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KEYDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the tasks that would run, but don't execute
    /// any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_are_repeatable() {
        let args = CliArgs::parse_from([
            "keydag",
            "--target",
            "bin",
            "--target",
            "docs",
            "--renderer",
            "quiet",
        ]);
        assert_eq!(args.targets, vec!["bin", "docs"]);
        assert_eq!(args.renderer, Some(RendererKind::Quiet));
        assert_eq!(args.config, "Keydag.toml");
        assert!(!args.dry_run);
    }
}
