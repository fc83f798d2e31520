// kakushi/src/cli.rs
//! This file defines the command-line interface (CLI) for the kakushi application,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "kakushi",
    author = "Kakushi Team",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replace personal information in text with category pseudonyms",
    long_about = "Kakushi detects personal information (names, phone numbers, e-mail addresses, postal codes, addresses, card numbers, individual numbers and PINs) in text and replaces every detected span with a category pseudonym such as `phonexxx`. It can also emit the original-to-pseudonym mapping as JSON.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Specify the path to a custom YAML theme file.
    #[arg(long = "theme", value_name = "FILE", global = true, help = "Specify the path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `kakushi` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Sanitizes an input file or stdin, replacing personal information with pseudonyms.")]
    Sanitize(SanitizeCommand),

    #[command(about = "Lists the spans that would be replaced, without rewriting the input.")]
    Scan(ScanCommand),

    #[command(about = "Sanitizes every supported text file under a directory.")]
    Batch(BatchCommand),

    #[command(about = "Lists the configured pattern rules and their pseudonyms.")]
    Rules(RulesCommand),
}

/// Rule and recognizer selection shared by every command that builds an engine.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// Path to a custom rules configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", help = "Path to a custom rules configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Entity dictionary for the gazetteer recognizer (YAML).
    #[arg(long = "entities", value_name = "FILE", help = "Entity dictionary (YAML) used to recognize names, places and organisations.")]
    pub entities: Option<PathBuf>,

    /// Skip the entity recognizer entirely.
    #[arg(long = "patterns-only", conflicts_with = "entities", help = "Use pattern rules only, without an entity recognizer.")]
    pub patterns_only: bool,

    /// Enable these rule names (comma-separated), including opt-in rules.
    #[arg(long, short = 'e', value_delimiter = ',', help = "Enable these rule names (comma-separated), including opt-in rules.")]
    pub enable: Vec<String>,

    /// Disable these rule names (comma-separated).
    #[arg(long, short = 'x', value_delimiter = ',', help = "Disable these rule names (comma-separated).")]
    pub disable: Vec<String>,

    /// Literal phrase to redact; may be repeated.
    #[arg(long = "phrase", value_name = "PHRASE", help = "Literal phrase to redact (repeatable).")]
    pub phrases: Vec<String>,

    /// Match patterns case-sensitively.
    #[arg(long = "case-sensitive", help = "Match pattern rules case-sensitively.")]
    pub case_sensitive: bool,

    /// Per-value token template, e.g. "{token}_{shorthash}".
    #[arg(long = "token-format", value_name = "FMT", help = "Per-value token template over {label}, {token} and {shorthash}.")]
    pub token_format: Option<String>,
}

/// Input document format.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum InputFormat {
    /// Plain text, sanitized as one document.
    #[default]
    Text,
    /// A JSON document; every string value is sanitized.
    Json,
}

/// Arguments for the `sanitize` command.
#[derive(Parser, Debug)]
pub struct SanitizeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write sanitized output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(long = "format", value_enum, default_value = "text", help = "Input format.")]
    pub format: InputFormat,

    /// Write the original-to-pseudonym mapping to this file.
    #[arg(long = "mapping-json", value_name = "FILE", help = "Write the original-to-pseudonym mapping as JSON.")]
    pub mapping_json: Option<PathBuf>,

    /// Show a unified diff to highlight the changes made.
    #[arg(long, help = "Show a unified diff instead of the sanitized output.")]
    pub diff: bool,

    /// Suppress the replacement summary.
    #[arg(long = "no-summary", help = "Suppress the replacement summary.")]
    pub no_summary: bool,

    #[command(flatten)]
    pub rules: RuleArgs,
}

/// Arguments for the `scan` command.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Print the scan report as JSON to stdout.
    #[arg(long = "json-stdout", help = "Print the scan report to stdout as JSON.")]
    pub json_stdout: bool,

    #[command(flatten)]
    pub rules: RuleArgs,
}

/// Arguments for the `batch` command.
#[derive(Parser, Debug)]
pub struct BatchCommand {
    /// Directory to process recursively.
    #[arg(value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Where to write sanitized copies (defaults to `<DIR>_sanitized`).
    #[arg(long = "out-dir", value_name = "DIR", conflicts_with = "overwrite", help = "Output directory (defaults to <DIR>_sanitized).")]
    pub out_dir: Option<PathBuf>,

    /// Rewrite files in place.
    #[arg(long, help = "Rewrite files in place instead of writing copies.")]
    pub overwrite: bool,

    /// Write the merged mapping of all files to this file.
    #[arg(long = "mapping-json", value_name = "FILE", help = "Write the merged original-to-pseudonym mapping as JSON.")]
    pub mapping_json: Option<PathBuf>,

    #[command(flatten)]
    pub rules: RuleArgs,
}

/// Arguments for the `rules` command.
#[derive(Parser, Debug)]
pub struct RulesCommand {
    #[command(flatten)]
    pub rules: RuleArgs,
}
