//! The entity recognizer seam.
//!
//! A semantic recognizer (statistical NER model, remote service, dictionary)
//! is plugged into the engine through `EntityRecognizer`. The engine only
//! relies on the returned spans lying inside the text; everything else about
//! the recognizer is opaque.
//!
//! License: MIT OR APACHE 2.0

use log::warn;
use std::collections::BTreeSet;

use crate::detection::Detection;
use crate::errors::Result;

/// Recognizer categories honored by default.
pub const DEFAULT_ENTITY_LABELS: [&str; 6] = ["PERSON", "GPE", "LOC", "DATE", "ORG", "ADDR"];

/// A semantic entity recognizer.
///
/// Implementations are built once and shared read-only across calls (and
/// threads), hence the `Send + Sync` bound.
pub trait EntityRecognizer: Send + Sync {
    /// Returns labeled spans found in `text`. May be empty and may overlap
    /// pattern detections.
    fn detect_entities(&self, text: &str) -> Result<Vec<Detection>>;

    /// Short name used in logs and errors.
    fn name(&self) -> &str;
}

/// A recognizer that never finds anything. Used for patterns-only runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecognizer;

impl EntityRecognizer for NoopRecognizer {
    fn detect_entities(&self, _text: &str) -> Result<Vec<Detection>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Allow-list applied to recognizer output before merging.
#[derive(Debug, Clone)]
pub struct EntityFilter {
    allowed: BTreeSet<String>,
}

impl EntityFilter {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, label: &str) -> bool {
        self.allowed.contains(label)
    }

    /// Allowed labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Drops detections with a label outside the allow-list, and any span
    /// that is empty, out of bounds, or not on char boundaries.
    pub fn apply(&self, text: &str, recognizer: &str, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|d| {
                if !d.is_valid_for(text) {
                    warn!(
                        "Recognizer '{}' returned invalid span {}..{} (text length {}); dropped.",
                        recognizer,
                        d.start,
                        d.end,
                        text.len()
                    );
                    return false;
                }
                self.allows(&d.label)
            })
            .collect()
    }
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ENTITY_LABELS)
    }
}
