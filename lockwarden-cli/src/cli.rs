//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Configuration file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "lockwarden.toml";

/// lockwarden -- zero-trust supply-chain audit for npm projects.
///
/// Walks PATH for every directory containing a package.json, resolves its
/// dependencies and checks them against OSV, the npm registry and a list of
/// popular package names.
#[derive(Parser, Debug)]
#[command(name = "lockwarden", version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan (default: current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to a lockwarden.toml configuration file.
    ///
    /// When omitted, ./lockwarden.toml is used if it exists, otherwise built-in defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Disable typosquatting detection.
    #[arg(long)]
    pub no_typosquat: bool,

    /// Exit with code 4 when any finding is reported.
    #[arg(long)]
    pub fail_on_findings: bool,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text.
    Text,
    /// Machine-readable JSON.
    Json,
}
