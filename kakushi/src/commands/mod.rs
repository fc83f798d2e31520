// kakushi/src/commands/mod.rs
//! Subcommand implementations and dispatch.
//!
//! License: MIT OR APACHE 2.0

pub mod batch;
pub mod rules;
pub mod sanitize;
pub mod scan;
pub mod setup;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use std::io;

use crate::cli::{Cli, Commands};
use crate::ui::output_format;
use crate::ui::theme::{build_theme_map, ThemeMap};

/// Runs the selected subcommand.
pub fn run(cli: Cli) -> Result<()> {
    let theme_map = build_theme_map(cli.theme.as_deref()).context("Failed to load theme")?;
    match &cli.command {
        Commands::Sanitize(cmd) => sanitize::run_sanitize(cmd, &theme_map, cli.quiet),
        Commands::Scan(cmd) => scan::run_scan(cmd, &theme_map, cli.quiet),
        Commands::Batch(cmd) => batch::run_batch(cmd, &theme_map, cli.quiet),
        Commands::Rules(cmd) => rules::run_rules(cmd),
    }
}

// Stderr write failures are not worth aborting a run over.
pub(crate) fn info_msg(message: impl AsRef<str>, theme_map: &ThemeMap) {
    let supports_color = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), message.as_ref(), theme_map, supports_color);
}

pub(crate) fn warn_msg(message: impl AsRef<str>, theme_map: &ThemeMap) {
    let supports_color = io::stderr().is_terminal();
    let _ = output_format::print_warn_message(&mut io::stderr(), message.as_ref(), theme_map, supports_color);
}

pub(crate) fn success_msg(message: impl AsRef<str>, theme_map: &ThemeMap) {
    let supports_color = io::stderr().is_terminal();
    let _ = output_format::print_success_message(&mut io::stderr(), message.as_ref(), theme_map, supports_color);
}
