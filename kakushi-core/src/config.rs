//! Configuration management for `kakushi-core`.
//!
//! This module defines the core data structures for pattern rules and the
//! surrounding engine configuration (case sensitivity, user phrases, entity
//! label allow-list, pseudonym overrides). It handles YAML (de)serialization
//! and provides utilities for loading, merging, filtering and validating
//! configurations.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::recognizer::DEFAULT_ENTITY_LABELS;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 2000;

/// Label of the rule synthesized from user phrases.
pub const PHRASE_LABEL: &str = "PHRASE";

/// Represents a single labeled pattern rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternRule {
    /// Unique identifier for the rule (e.g., "PHONE").
    pub name: String,
    /// Label attached to detections. Defaults to `name` when absent.
    pub label: Option<String>,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// The regex pattern string.
    pub pattern: Option<String>,
    /// Compile with insignificant whitespace (`x` flag).
    pub verbose: bool,
    /// If true, the rule is disabled unless explicitly enabled.
    pub opt_in: bool,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
}

impl Default for PatternRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            label: None,
            description: None,
            pattern: None,
            verbose: true,
            opt_in: false,
            enabled: None,
        }
    }
}

impl PatternRule {
    /// Label emitted for detections of this rule.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Whether the rule takes part in detection.
    pub fn is_active(&self) -> bool {
        self.enabled.unwrap_or(!self.opt_in)
    }

    /// The pattern prefixed with its inline flags.
    pub fn flagged_pattern(&self, case_insensitive: bool) -> Option<String> {
        let pattern = self.pattern.as_deref()?;
        let flags = match (case_insensitive, self.verbose) {
            (true, true) => "(?ix)",
            (true, false) => "(?i)",
            (false, true) => "(?x)",
            (false, false) => "",
        };
        Some(format!("{}{}", flags, pattern))
    }
}

/// How pseudonym tokens are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Optional per-value template, e.g. `"{token}_{shorthash}"`.
    /// When absent, every value of a label gets the same literal token.
    pub format: Option<String>,
}

/// What the engine does when the entity recognizer fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerPolicy {
    /// Abort the call with the recognizer's error.
    Strict,
    /// Log a warning and continue with pattern detections only.
    #[default]
    FallbackToPatterns,
}

/// Represents the top-level configuration structure for kakushi.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Case-insensitive pattern matching. Defaults to `true` when absent.
    pub case_insensitive: Option<bool>,
    /// Pattern rules.
    pub rules: Vec<PatternRule>,
    /// Literal phrases to redact, matched longest first.
    pub phrases: Vec<String>,
    /// Recognizer labels that are honored. `None` means all known labels.
    pub entity_labels: Option<Vec<String>>,
    /// Label -> pseudonym overrides.
    pub pseudonyms: BTreeMap<String, String>,
    /// Token rendering.
    pub tokens: TokenConfig,
    /// Recognizer failure policy.
    pub recognizer_policy: Option<RecognizerPolicy>,
}

impl PatternConfig {
    /// Loads a configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom rules from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: PatternConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_rules(&config.rules)?;
        info!("Loaded {} rules from file {}.", config.rules.len(), path.display());

        Ok(config)
    }

    /// Loads the built-in rule table embedded in the crate.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let config: PatternConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default rules")?;

        debug!("Loaded {} default rules.", config.rules.len());
        Ok(config)
    }

    /// Loads the first user configuration found in the candidate locations.
    pub fn load_user_config() -> Result<Option<Self>> {
        match config_candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_file(&path).map(Some),
            None => {
                debug!("No user configuration found in candidate locations.");
                Ok(None)
            }
        }
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive.unwrap_or(true)
    }

    pub fn recognizer_policy(&self) -> RecognizerPolicy {
        self.recognizer_policy.unwrap_or_default()
    }

    /// Entity labels the engine honors.
    pub fn entity_labels(&self) -> Vec<String> {
        match &self.entity_labels {
            Some(labels) => labels.clone(),
            None => DEFAULT_ENTITY_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Filters active rules based on enable/disable lists.
    ///
    /// Rules named in `enable_rules` are switched on even when opt-in or
    /// disabled in the file; rules named in `disable_rules` are removed.
    pub fn set_active_rules(&mut self, enable_rules: &[String], disable_rules: &[String]) {
        let enable_set: HashSet<&str> = enable_rules.iter().map(String::as_str).collect();
        let disable_set: HashSet<&str> = disable_rules.iter().map(String::as_str).collect();

        debug!("Initial rules count before filtering: {}", self.rules.len());

        let all_rule_names: HashSet<&str> = self.rules.iter().map(|r| r.name.as_str()).collect();

        for rule_name in enable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `enable_rules` list does not exist.", rule_name);
        }

        for rule_name in disable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `disable_rules` list does not exist.", rule_name);
        }

        for rule in self.rules.iter_mut() {
            if enable_set.contains(rule.name.as_str()) {
                rule.enabled = Some(true);
            }
        }

        self.rules
            .retain(|rule| !disable_set.contains(rule.name.as_str()) && rule.is_active());

        debug!("Final active rules count after filtering: {}", self.rules.len());
    }

    /// Keeps only the named rules, force-enabled. Used for narrow runs.
    pub fn retain_rules(&mut self, names: &[&str]) {
        self.rules.retain(|r| names.contains(&r.name.as_str()));
        for rule in self.rules.iter_mut() {
            rule.enabled = Some(true);
        }
    }

    /// Builds the synthetic rule for user phrases, if any.
    ///
    /// Blank phrases are dropped; the rest are escaped and sorted longest
    /// first so that a longer phrase wins over a phrase it contains.
    pub fn phrase_rule(&self) -> Option<PatternRule> {
        let mut cleaned: Vec<&str> = self
            .phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        cleaned.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        cleaned.dedup();

        let pattern = cleaned
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");

        Some(PatternRule {
            name: PHRASE_LABEL.to_string(),
            label: Some(PHRASE_LABEL.to_string()),
            description: Some("User-supplied literal phrases".to_string()),
            pattern: Some(pattern),
            verbose: false,
            enabled: Some(true),
            ..PatternRule::default()
        })
    }
}

/// Candidate locations for a user configuration file, highest priority first.
pub fn config_candidate_paths() -> Vec<PathBuf> {
    let candidates = vec![
        dirs::home_dir().map(|p| p.join(".kakushi").join("rules.yaml")),
        dirs::config_dir().map(|p| p.join("kakushi").join("rules.yaml")),
        Some(PathBuf::from("./kakushi.yaml")),
    ];
    candidates.into_iter().flatten().collect()
}

/// Merges a user configuration over the defaults.
///
/// Rules override by name (keeping the default ordering, new rules appended),
/// phrases are appended, pseudonym overrides are layered on top, and scalar
/// settings are replaced when the user sets them.
pub fn merge_rules(default_config: PatternConfig, user_config: Option<PatternConfig>) -> PatternConfig {
    debug!(
        "merge_rules called. Initial default rules count: {}",
        default_config.rules.len()
    );

    let mut merged = default_config;

    if let Some(user_cfg) = user_config {
        debug!("User config provided. Merging {} user rules.", user_cfg.rules.len());
        for user_rule in user_cfg.rules {
            match merged.rules.iter_mut().find(|r| r.name == user_rule.name) {
                Some(existing) => *existing = user_rule,
                None => merged.rules.push(user_rule),
            }
        }

        merged.phrases.extend(user_cfg.phrases);
        merged.pseudonyms.extend(user_cfg.pseudonyms);

        if user_cfg.case_insensitive.is_some() {
            merged.case_insensitive = user_cfg.case_insensitive;
        }
        if user_cfg.entity_labels.is_some() {
            merged.entity_labels = user_cfg.entity_labels;
        }
        if user_cfg.tokens.format.is_some() {
            debug!("Overriding token format with user value.");
            merged.tokens = user_cfg.tokens;
        }
        if user_cfg.recognizer_policy.is_some() {
            merged.recognizer_policy = user_cfg.recognizer_policy;
        }
    }

    debug!("Final total rules after merge: {}", merged.rules.len());
    merged
}

/// Validates rule integrity (names, patterns).
fn validate_rules(rules: &[PatternRule]) -> Result<()> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.clone()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        let pattern = match &rule.pattern {
            Some(p) => p,
            None => {
                errors.push(format!("Rule '{}' is missing the `pattern` field.", rule.name));
                continue;
            }
        };

        if pattern.trim().is_empty() {
            errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
            continue;
        }

        let flagged = rule.flagged_pattern(false).unwrap_or_default();
        if let Err(e) = Regex::new(&flagged) {
            errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
        }
    }

    if !errors.is_empty() {
        Err(anyhow!("Rule validation failed:\n{}", errors.join("\n")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str) -> PatternRule {
        PatternRule {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            ..PatternRule::default()
        }
    }

    #[test]
    fn test_rule_label_defaults_to_name() {
        let mut r = rule("PHONE", r"\d+");
        assert_eq!(r.label(), "PHONE");
        r.label = Some("TEL".to_string());
        assert_eq!(r.label(), "TEL");
    }

    #[test]
    fn test_opt_in_rule_inactive_until_enabled() {
        let mut r = rule("URL", "https?://");
        r.opt_in = true;
        assert!(!r.is_active());
        r.enabled = Some(true);
        assert!(r.is_active());
    }

    #[test]
    fn test_phrase_rule_sorts_longest_first_and_escapes() {
        let config = PatternConfig {
            phrases: vec![
                "ACME".to_string(),
                "  ".to_string(),
                "ACME Corp.".to_string(),
            ],
            ..PatternConfig::default()
        };
        let rule = config.phrase_rule().unwrap();
        assert_eq!(rule.pattern.as_deref(), Some(r"ACME Corp\.|ACME"));
        assert!(!rule.verbose);
        assert_eq!(rule.label(), PHRASE_LABEL);
    }

    #[test]
    fn test_phrase_rule_none_when_empty() {
        let config = PatternConfig {
            phrases: vec!["".to_string(), "   ".to_string()],
            ..PatternConfig::default()
        };
        assert!(config.phrase_rule().is_none());
    }

    #[test]
    fn test_validate_rules_reports_all_problems() {
        let rules = vec![
            rule("A", "("),
            rule("A", "ok"),
            PatternRule {
                name: "B".to_string(),
                ..PatternRule::default()
            },
        ];
        let err = validate_rules(&rules).unwrap_err().to_string();
        assert!(err.contains("invalid regex pattern"));
        assert!(err.contains("Duplicate rule name"));
        assert!(err.contains("missing the `pattern`"));
    }

    #[test]
    fn test_look_around_patterns_validate() {
        let rules = vec![rule("DIGITS", r"(?<!\d) \d{4} (?!\d)")];
        assert!(validate_rules(&rules).is_ok());
    }

    #[test]
    fn test_flagged_pattern_prefixes_inline_flags() {
        let mut r = rule("A", "a b");
        assert_eq!(r.flagged_pattern(true).as_deref(), Some("(?ix)a b"));
        r.verbose = false;
        assert_eq!(r.flagged_pattern(false).as_deref(), Some("a b"));
        r.pattern = None;
        assert!(r.flagged_pattern(true).is_none());
    }

    #[test]
    fn test_case_insensitive_defaults_to_true() {
        assert!(PatternConfig::default().case_insensitive());
        let config = PatternConfig {
            case_insensitive: Some(false),
            ..PatternConfig::default()
        };
        assert!(!config.case_insensitive());
    }
}
