// kakushi/src/commands/scan.rs
//! `kakushi scan`: list what would be replaced, without rewriting anything.
//!
//! Findings carry positions and labels only; the matched text itself is
//! never printed.

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use is_terminal::IsTerminal;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

use kakushi_core::{redact_sensitive, DetectionSource, SanitizationEngine};

use crate::cli::ScanCommand;
use crate::commands::setup::{build_engine, read_input};
use crate::commands::warn_msg;
use crate::ui::output_format::paint;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// One accepted span, located by the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFinding {
    /// 1-based line number.
    pub line: usize,
    /// 1-based character column of the span start.
    pub column: usize,
    /// Length in characters.
    pub length: usize,
    pub label: String,
    pub source: DetectionSource,
    /// Masked form of the matched text.
    pub preview: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: String,
    pub input: String,
    pub total: usize,
    pub by_label: BTreeMap<String, usize>,
    pub findings: Vec<ScanFinding>,
}

/// 1-based line and character column of a byte offset.
fn locate(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let line = before.matches('\n').count() + 1;
    (line, before[line_start..].chars().count() + 1)
}

/// Scans `text` as one document, the same way `sanitize` treats text input.
pub fn scan_text(engine: &dyn SanitizationEngine, text: &str, input_name: &str) -> Result<ScanReport> {
    let mut findings = Vec::new();
    for detection in engine.scan(text)? {
        let matched = detection.slice(text);
        let (line, column) = locate(text, detection.start);
        findings.push(ScanFinding {
            line,
            column,
            length: matched.chars().count(),
            label: detection.label.clone(),
            source: detection.source,
            preview: redact_sensitive(matched),
        });
    }

    let mut by_label = BTreeMap::new();
    for finding in &findings {
        *by_label.entry(finding.label.clone()).or_insert(0) += 1;
    }

    Ok(ScanReport {
        generated_at: Utc::now().to_rfc3339(),
        input: input_name.to_string(),
        total: findings.len(),
        by_label,
        findings,
    })
}

pub fn run_scan(cmd: &ScanCommand, theme_map: &ThemeMap, quiet: bool) -> Result<()> {
    info!("Starting scan operation.");
    let setup = build_engine(&cmd.rules)?;
    for warning in &setup.warnings {
        warn_msg(warning, theme_map);
    }

    let input = read_input(cmd.input_file.as_deref())?;
    let input_name = cmd
        .input_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdin".to_string());

    let report = scan_text(&setup.engine, &input, &input_name).context("Scan failed")?;

    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    let mut writer = stdout.lock();

    if cmd.json_stdout {
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writeln!(writer)?;
    } else {
        print_findings(&report, &mut writer, theme_map, supports_color, quiet)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_findings<W: Write>(
    report: &ScanReport,
    writer: &mut W,
    theme_map: &ThemeMap,
    supports_color: bool,
    quiet: bool,
) -> io::Result<()> {
    if report.total == 0 {
        if !quiet {
            writeln!(writer, "{}", paint("No personal information found.", ThemeEntry::Info, theme_map, supports_color))?;
        }
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .force_no_tty()
        .set_header(vec!["Line", "Column", "Length", "Label", "Source", "Preview"]);
    for finding in &report.findings {
        let source = match finding.source {
            DetectionSource::Pattern => "pattern",
            DetectionSource::Entity => "entity",
        };
        table.add_row(vec![
            Cell::new(finding.line).set_alignment(CellAlignment::Right),
            Cell::new(finding.column).set_alignment(CellAlignment::Right),
            Cell::new(finding.length).set_alignment(CellAlignment::Right),
            Cell::new(&finding.label),
            Cell::new(source),
            Cell::new(&finding.preview),
        ]);
    }
    writeln!(writer, "{}", table)?;
    writeln!(
        writer,
        "{}",
        paint(&format!("Total findings: {}", report.total), ThemeEntry::SummaryCount, theme_map, supports_color)
    )
}
