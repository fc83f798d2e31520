// kakushi-core/src/walker.rs
//! Applies an engine to every text leaf of a host document.
//!
//! A leaf is the smallest string-bearing unit of a document: a spreadsheet
//! cell or a JSON string value. A plain-text file is a single leaf, so a
//! match may cross line breaks. Each leaf is sanitized independently.
//! Formulas in cell-like leaves and non-string values are skipped, a leaf is
//! only written back when its text changed, and a failing leaf is counted
//! and left untouched while the walk continues.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::SanitizationEngine;
use crate::mapping::ReplacementMapping;

/// A cell-like value in a host document.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

/// Totals for one walk over a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    /// Leaves seen, including skipped ones.
    pub visited: usize,
    /// Formulas and non-string leaves.
    pub skipped: usize,
    /// Leaves whose text was rewritten.
    pub changed: usize,
    /// Substitutions across all leaves.
    pub replacements: usize,
    /// Leaves that failed to sanitize and were left as-is.
    pub errors: usize,
    /// Leaves processed without the entity recognizer.
    pub degraded: usize,
    /// Substitutions per label.
    pub label_counts: BTreeMap<String, usize>,
    /// Merged original -> pseudonym mapping.
    pub mapping: ReplacementMapping,
}

impl WalkReport {
    /// Adds the totals of another walk to this one.
    pub fn absorb(&mut self, other: WalkReport) {
        self.visited += other.visited;
        self.skipped += other.skipped;
        self.changed += other.changed;
        self.replacements += other.replacements;
        self.errors += other.errors;
        self.degraded += other.degraded;
        for (label, count) in other.label_counts {
            *self.label_counts.entry(label).or_insert(0) += count;
        }
        self.mapping.merge(other.mapping);
    }
}

/// Spreadsheet-style formulas are never rewritten.
pub fn is_formula(value: &str) -> bool {
    value.starts_with('=')
}

fn sanitize_cell(engine: &dyn SanitizationEngine, value: &mut String, report: &mut WalkReport) {
    if is_formula(value) {
        report.visited += 1;
        report.skipped += 1;
        return;
    }
    sanitize_leaf(engine, value, report);
}

fn sanitize_leaf(engine: &dyn SanitizationEngine, value: &mut String, report: &mut WalkReport) {
    report.visited += 1;
    match engine.sanitize(value) {
        Ok(result) => {
            report.replacements += result.replacements;
            if result.degraded {
                report.degraded += 1;
            }
            for (label, count) in result.label_counts() {
                *report.label_counts.entry(label).or_insert(0) += count;
            }
            if result.text != *value {
                *value = result.text;
                report.changed += 1;
            }
            report.mapping.merge(result.mapping);
        }
        Err(e) => {
            warn!("Leaf {} could not be sanitized and was left unchanged: {}", report.visited, e);
            report.errors += 1;
        }
    }
}

/// Sanitizes every text leaf in place.
pub fn walk_leaves(engine: &dyn SanitizationEngine, leaves: &mut [LeafValue]) -> WalkReport {
    let mut report = WalkReport::default();
    for leaf in leaves.iter_mut() {
        match leaf {
            LeafValue::Text(value) => sanitize_cell(engine, value, &mut report),
            LeafValue::Number(_) | LeafValue::Bool(_) | LeafValue::Empty => {
                report.visited += 1;
                report.skipped += 1;
            }
        }
    }
    debug!(
        "Walked {} leaf(s): {} changed, {} replacement(s), {} error(s).",
        report.visited, report.changed, report.replacements, report.errors
    );
    report
}

/// Sanitizes every string value of a JSON document in place. Object keys
/// are left untouched.
pub fn sanitize_json(engine: &dyn SanitizationEngine, document: &mut serde_json::Value) -> WalkReport {
    let mut report = WalkReport::default();
    walk_json(engine, document, &mut report);
    report
}

fn walk_json(engine: &dyn SanitizationEngine, value: &mut serde_json::Value, report: &mut WalkReport) {
    use serde_json::Value;
    match value {
        Value::String(s) => sanitize_cell(engine, s, report),
        Value::Array(items) => {
            for item in items.iter_mut() {
                walk_json(engine, item, report);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                walk_json(engine, item, report);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            report.visited += 1;
            report.skipped += 1;
        }
    }
}

/// Sanitizes a plain-text document as one leaf. Lines starting with `=`
/// are ordinary text here, and line endings are left as they are.
pub fn sanitize_text_document(engine: &dyn SanitizationEngine, text: &str) -> (String, WalkReport) {
    let mut report = WalkReport::default();
    let mut out = text.to_string();
    sanitize_leaf(engine, &mut out, &mut report);
    (out, report)
}
