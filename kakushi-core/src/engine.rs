// kakushi-core/src/engine.rs
//! Defines the core `SanitizationEngine` trait and the result of one call.
//!
//! The trait decouples callers (the leaf walkers, the CLI) from the concrete
//! engine, so a walker can be driven by any implementation, including test
//! doubles.
//!
//! License: MIT OR APACHE 2.0

use serde::Serialize;
use std::collections::BTreeMap;

use crate::detection::Detection;
use crate::errors::Result;
use crate::mapping::ReplacementMapping;
use crate::sanitizers::compiler::CompiledRules;

/// Output of a single `sanitize` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeResult {
    /// The input with every accepted span replaced by its pseudonym.
    pub text: String,
    /// Original substring -> pseudonym.
    pub mapping: ReplacementMapping,
    /// Number of accepted spans, i.e. substitutions performed.
    pub replacements: usize,
    /// Set when the entity recognizer failed and only pattern detections
    /// were applied.
    pub degraded: bool,
    /// The accepted spans, ascending, with offsets into the original input.
    pub spans: Vec<Detection>,
}

impl SanitizeResult {
    /// A result for input that needed no substitution.
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn is_changed(&self) -> bool {
        self.replacements > 0
    }

    /// Substitutions per label.
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for span in &self.spans {
            *counts.entry(span.label.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// A trait that defines the core functionality of a sanitization engine.
pub trait SanitizationEngine: Send + Sync {
    /// Detects, merges and substitutes every PII span in `text`.
    ///
    /// Has no side effects beyond logging.
    fn sanitize(&self, text: &str) -> Result<SanitizeResult>;

    /// Returns the spans `sanitize` would replace, without rewriting the text.
    fn scan(&self, text: &str) -> Result<Vec<Detection>>;

    /// The compiled pattern rules in use.
    fn compiled_rules(&self) -> &CompiledRules;
}
