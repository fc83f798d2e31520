// kakushi/src/commands/batch.rs
//! `kakushi batch`: sanitize every supported file under a directory.
//!
//! Files are either rewritten in place (`--overwrite`) or copied, sanitized,
//! into a mirror tree. The output tree may not live inside the input tree,
//! and the walk never descends into it. Files that are not valid UTF-8 are
//! skipped; a file that fails to parse or write is counted as an error and
//! the batch carries on.

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use kakushi_core::{sanitize_json, sanitize_text_document, SanitizationEngine, WalkReport};

use crate::cli::BatchCommand;
use crate::commands::setup::build_engine;
use crate::commands::{info_msg, success_msg, warn_msg};
use crate::ui::summary;
use crate::ui::theme::ThemeMap;

/// Extensions (lowercase, without the dot) the batch command processes.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "html", "htm", "json"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Supported files found.
    pub scanned: usize,
    pub changed_files: usize,
    pub total_replacements: usize,
    /// Files left alone because they are not UTF-8 text.
    pub skipped: usize,
    pub errors: usize,
}

enum FileOutcome {
    Undecodable,
    Sanitized { output: String, report: WalkReport },
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn default_out_dir(base: &Path) -> Result<PathBuf> {
    let Some(name) = base.file_name() else {
        bail!("Cannot derive an output directory for {}; pass --out-dir", base.display());
    };
    let mut name = name.to_os_string();
    name.push("_sanitized");
    Ok(base.with_file_name(name))
}

/// Makes `path` absolute, resolving symlinks through its nearest existing
/// ancestor. The path itself need not exist.
fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing
        .canonicalize()
        .unwrap_or_else(|_| existing.to_path_buf());
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Output root for a batch run; `None` means files are rewritten in place.
pub fn resolve_out_dir(base: &Path, out_dir: Option<&Path>, overwrite: bool) -> Result<Option<PathBuf>> {
    if overwrite {
        return Ok(None);
    }
    let base = base
        .canonicalize()
        .with_context(|| format!("Input directory {} not found", base.display()))?;
    let target = match out_dir {
        Some(dir) => resolve_path(dir)?,
        None => default_out_dir(&base)?,
    };
    if target.starts_with(&base) {
        bail!(
            "Output directory {} must not be inside the input directory {}",
            target.display(),
            base.display()
        );
    }
    Ok(Some(target))
}

fn sanitize_file(engine: &dyn SanitizationEngine, path: &Path) -> Result<FileOutcome> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let Ok(text) = String::from_utf8(bytes) else {
        return Ok(FileOutcome::Undecodable);
    };

    if extension_of(path).as_deref() == Some("json") {
        let mut document: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        let report = sanitize_json(engine, &mut document);
        let output = if report.changed > 0 {
            let mut rendered = serde_json::to_string_pretty(&document)?;
            rendered.push('\n');
            rendered
        } else {
            text
        };
        Ok(FileOutcome::Sanitized { output, report })
    } else {
        let (output, report) = sanitize_text_document(engine, &text);
        Ok(FileOutcome::Sanitized { output, report })
    }
}

fn write_output(target: &Path, content: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(target, content).with_context(|| format!("Failed to write {}", target.display()))
}

/// Sanitizes every supported file under `base`. With `out_root` set, each
/// file is written to the same relative path under it; otherwise changed
/// files are rewritten in place.
pub fn batch_sanitize(
    engine: &dyn SanitizationEngine,
    base: &Path,
    out_root: Option<&Path>,
) -> Result<(BatchStats, WalkReport)> {
    if !base.is_dir() {
        bail!("{} is not a directory", base.display());
    }
    let base = base.canonicalize()?;
    let mut stats = BatchStats::default();
    let mut total = WalkReport::default();

    let walker = WalkDir::new(&base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| out_root.map_or(true, |root| !entry.path().starts_with(root)));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                stats.errors += 1;
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_supported(path) {
            continue;
        }
        stats.scanned += 1;
        debug!("Processing {}", path.display());

        let (output, report) = match sanitize_file(engine, path) {
            Ok(FileOutcome::Sanitized { output, report }) => (output, report),
            Ok(FileOutcome::Undecodable) => {
                warn!("Skipping {}: not UTF-8 text.", path.display());
                stats.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("{:#}", e);
                stats.errors += 1;
                continue;
            }
        };

        if report.errors > 0 {
            warn!("{} segment(s) of {} were left unchanged after errors.", report.errors, path.display());
        }
        let changed = report.changed > 0;

        let written = match out_root {
            Some(root) => {
                let relative = path.strip_prefix(&base).unwrap_or(path);
                write_output(&root.join(relative), &output)
            }
            None if changed => write_output(path, &output),
            None => Ok(()),
        };
        if let Err(e) = written {
            warn!("{:#}", e);
            stats.errors += 1;
            continue;
        }

        if changed {
            stats.changed_files += 1;
        }
        stats.total_replacements += report.replacements;
        total.absorb(report);
    }

    info!(
        "Batch finished: {} scanned, {} changed, {} replacement(s), {} skipped, {} error(s).",
        stats.scanned, stats.changed_files, stats.total_replacements, stats.skipped, stats.errors
    );
    Ok((stats, total))
}

pub fn run_batch(cmd: &BatchCommand, theme_map: &ThemeMap, quiet: bool) -> Result<()> {
    let setup = build_engine(&cmd.rules)?;
    for warning in &setup.warnings {
        warn_msg(warning, theme_map);
    }

    let out_root = resolve_out_dir(&cmd.input_dir, cmd.out_dir.as_deref(), cmd.overwrite)?;
    if !quiet {
        match &out_root {
            Some(root) => info_msg(format!("Writing sanitized copies to {}", root.display()), theme_map),
            None => info_msg("Rewriting files in place.", theme_map),
        }
    }

    let (stats, report) = batch_sanitize(&setup.engine, &cmd.input_dir, out_root.as_deref())?;

    if let Some(path) = &cmd.mapping_json {
        report
            .mapping
            .write_json(path)
            .with_context(|| format!("Failed to write mapping to {}", path.display()))?;
    }

    if stats.errors > 0 {
        warn_msg(format!("{} file(s) could not be processed.", stats.errors), theme_map);
    }
    if !quiet {
        success_msg(
            format!(
                "Scanned {} file(s): {} changed, {} replacement(s), {} skipped, {} error(s).",
                stats.scanned, stats.changed_files, stats.total_replacements, stats.skipped, stats.errors
            ),
            theme_map,
        );
        summary::print_summary(
            &report.label_counts,
            setup.engine.pseudonyms(),
            &mut io::stderr(),
            theme_map,
            io::stderr().is_terminal(),
        )?;
    }
    Ok(())
}
