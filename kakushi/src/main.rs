// kakushi/src/main.rs
//! Kakushi entry point.
//!
//! Parses the command line, installs the logger and runs the selected
//! subcommand. Any error is printed once to stderr with exit status 1.

use clap::Parser;
use is_terminal::IsTerminal;
use std::io;

use kakushi::cli::Cli;
use kakushi::commands;
use kakushi::logger;
use kakushi::ui::output_format::print_error_message;
use kakushi::ui::theme::ThemeStyle;

fn main() {
    let cli = Cli::parse();
    logger::init_logger(logger::level_for_flags(cli.quiet, cli.debug));

    if let Err(e) = commands::run(cli) {
        let theme_map = ThemeStyle::default_theme_map();
        let supports_color = io::stderr().is_terminal();
        let _ = print_error_message(&mut io::stderr(), &format!("{:#}", e), &theme_map, supports_color);
        std::process::exit(1);
    }
}
