// kakushi/src/commands/sanitize.rs
//! `kakushi sanitize`: rewrite one input and report what was replaced.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};

use kakushi_core::{sanitize_json, sanitize_text_document, WalkReport};

use crate::cli::{InputFormat, SanitizeCommand};
use crate::commands::setup::{build_engine, read_input};
use crate::commands::{info_msg, warn_msg};
use crate::ui::diff_viewer;
use crate::ui::summary;
use crate::ui::theme::ThemeMap;

pub fn run_sanitize(cmd: &SanitizeCommand, theme_map: &ThemeMap, quiet: bool) -> Result<()> {
    info!("Starting sanitize operation.");

    let setup = build_engine(&cmd.rules)?;
    for warning in &setup.warnings {
        warn_msg(warning, theme_map);
    }

    let input = read_input(cmd.input_file.as_deref())?;

    let (sanitized, report) = match cmd.format {
        InputFormat::Text => sanitize_text_document(&setup.engine, &input),
        InputFormat::Json => {
            let mut document: serde_json::Value =
                serde_json::from_str(&input).context("Input is not valid JSON")?;
            let report = sanitize_json(&setup.engine, &mut document);
            let mut rendered = serde_json::to_string_pretty(&document)?;
            rendered.push('\n');
            (rendered, report)
        }
    };

    debug!(
        "Sanitized {} leaf(s); original length {}, sanitized length {}.",
        report.visited,
        input.len(),
        sanitized.len()
    );

    write_primary_output(cmd, &input, &sanitized, theme_map, quiet)?;

    if let Some(path) = &cmd.mapping_json {
        report
            .mapping
            .write_json(path)
            .with_context(|| format!("Failed to write mapping to {}", path.display()))?;
        if !quiet {
            info_msg(format!("Mapping written to {}", path.display()), theme_map);
        }
    }

    report_problems(&report, theme_map);

    if !cmd.no_summary && !quiet {
        let supports_color = io::stderr().is_terminal();
        summary::print_summary(
            &report.label_counts,
            setup.engine.pseudonyms(),
            &mut io::stderr(),
            theme_map,
            supports_color,
        )?;
    }

    info!("Sanitize operation completed.");
    Ok(())
}

fn write_primary_output(
    cmd: &SanitizeCommand,
    original: &str,
    sanitized: &str,
    theme_map: &ThemeMap,
    quiet: bool,
) -> Result<()> {
    if let Some(path) = &cmd.output {
        if !quiet {
            info_msg(format!("Writing sanitized content to file: {}", path.display()), theme_map);
        }
        let mut file = fs::File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        if cmd.diff {
            diff_viewer::print_diff(original, sanitized, &mut file, theme_map, false)?;
        } else {
            file.write_all(sanitized.as_bytes())?;
        }
    } else {
        let stdout = io::stdout();
        let supports_color = stdout.is_terminal();
        let mut writer = stdout.lock();
        if cmd.diff {
            diff_viewer::print_diff(original, sanitized, &mut writer, theme_map, supports_color)?;
        } else {
            writer.write_all(sanitized.as_bytes())?;
        }
        writer.flush()?;
    }
    Ok(())
}

fn report_problems(report: &WalkReport, theme_map: &ThemeMap) {
    if report.degraded > 0 {
        warn_msg(
            format!(
                "Entity recognizer failed on {} segment(s); only pattern rules were applied there.",
                report.degraded
            ),
            theme_map,
        );
    }
    if report.errors > 0 {
        warn_msg(
            format!("{} segment(s) could not be sanitized and were left unchanged.", report.errors),
            theme_map,
        );
    }
}
