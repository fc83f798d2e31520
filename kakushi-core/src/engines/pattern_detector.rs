//! Pattern-based detection: scans text with the compiled rule table and
//! emits one `Detection` per match.
//! License: MIT OR APACHE 2.0

use std::sync::Arc;

use crate::config::PatternConfig;
use crate::detection::{log_detection_debug, Detection};
use crate::errors::{KakushiError, Result};
use crate::sanitizers::compiler::{get_or_compile_rules, CompiledRule, CompiledRules};

/// Stateless scanner over a shared, read-only compiled rule table.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    compiled_rules: Arc<CompiledRules>,
}

impl PatternDetector {
    /// Compiles (or fetches from cache) the active rules of `config`.
    /// Any invalid rule fails construction.
    pub fn new(config: &PatternConfig) -> Result<Self> {
        Ok(Self {
            compiled_rules: get_or_compile_rules(config)?,
        })
    }

    pub fn from_compiled(compiled_rules: Arc<CompiledRules>) -> Self {
        Self { compiled_rules }
    }

    pub fn compiled_rules(&self) -> &CompiledRules {
        &self.compiled_rules
    }

    /// Labels of every compiled rule, in rule order, without duplicates.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for rule in &self.compiled_rules.rules {
            if !labels.contains(&rule.label.as_str()) {
                labels.push(rule.label.as_str());
            }
        }
        labels
    }

    /// Runs every rule over the full text.
    ///
    /// Results are not deduplicated or ranked; overlapping detections from
    /// different rules are left for the merger. Fails if a rule exceeds its
    /// backtracking limit.
    pub fn detect(&self, text: &str) -> Result<Vec<Detection>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for rule in &self.compiled_rules.rules {
            let before = out.len();
            scan_rule(rule, text, &mut out)?;
            log::debug!(
                "Rule '{}' produced {} detection(s).",
                rule.name,
                out.len() - before
            );
        }
        for detection in &out {
            log_detection_debug(module_path!(), detection, text);
        }
        Ok(out)
    }
}

/// Finds the non-overlapping, non-empty matches of one rule.
fn scan_rule(rule: &CompiledRule, text: &str, out: &mut Vec<Detection>) -> Result<()> {
    for found in rule.regex.find_iter(text) {
        let m = found.map_err(|source| KakushiError::RuleExecution {
            rule: rule.name.clone(),
            source,
        })?;
        if m.start() < m.end() {
            out.push(Detection::pattern(m.start(), m.end(), rule.label.as_str()));
        }
    }
    Ok(())
}
