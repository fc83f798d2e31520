//! compiler.rs - Manages the compilation and caching of pattern rules.
//!
//! This module provides a thread-safe, cached mechanism to convert a
//! `PatternConfig` into `CompiledRules`. It uses a global, shared cache to
//! avoid redundant compilation.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use fancy_regex::{Regex, RegexBuilder};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::config::{PatternConfig, PatternRule, MAX_PATTERN_LENGTH};
use crate::errors::{KakushiError, Result};

/// Compiled-size ceiling for a single rule.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Backtracking steps allowed per match attempt of a look-around rule.
const BACKTRACK_LIMIT: usize = 1_000_000;

/// Represents a single compiled pattern rule.
#[derive(Debug)]
pub struct CompiledRule {
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    /// The unique name of the rule.
    pub name: String,
    /// Label attached to detections.
    pub label: String,
}

/// The set of compiled rules applied by a `PatternDetector`.
#[derive(Debug)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
    pub case_insensitive: bool,
}

impl CompiledRules {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

lazy_static! {
    /// Global cache keyed by a hash of the rules that will actually be compiled.
    static ref COMPILED_RULES_CACHE: RwLock<HashMap<u64, Arc<CompiledRules>>> = RwLock::new(HashMap::new());
}

/// The rules a configuration actually compiles: active rules plus the phrase rule.
pub fn rules_to_compile(config: &PatternConfig) -> Vec<PatternRule> {
    let mut rules: Vec<PatternRule> = config
        .rules
        .iter()
        .filter(|r| r.is_active())
        .cloned()
        .collect();
    if let Some(phrases) = config.phrase_rule() {
        rules.push(phrases);
    }
    rules
}

fn hash_rules(rules: &[PatternRule], case_insensitive: bool) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut sorted: Vec<&PatternRule> = rules.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted.hash(&mut hasher);
    case_insensitive.hash(&mut hasher);
    hasher.finish()
}

fn compile_rule(rule: PatternRule, case_insensitive: bool) -> Result<CompiledRule> {
    let pattern = rule.pattern.as_deref().ok_or_else(|| {
        KakushiError::InvalidConfig(format!("Rule '{}' is missing its pattern.", rule.name))
    })?;
    let pattern_len = pattern.len();

    if pattern_len > MAX_PATTERN_LENGTH {
        return Err(KakushiError::PatternLengthExceeded(
            rule.name,
            pattern_len,
            MAX_PATTERN_LENGTH,
        ));
    }

    let flagged = rule.flagged_pattern(case_insensitive).unwrap_or_default();
    debug!("Attempting to compile rule: '{}' with pattern '{:?}'", &rule.name, flagged);

    let regex = RegexBuilder::new(&flagged)
        .delegate_size_limit(REGEX_SIZE_LIMIT)
        .backtrack_limit(BACKTRACK_LIMIT)
        .build()
        .map_err(|e| KakushiError::RuleCompilation(rule.name.clone(), e))?;

    log::debug!(
        target: "kakushi_core::compiler",
        "Rule '{}' compiled successfully.",
        &rule.name
    );

    Ok(CompiledRule {
        regex,
        label: rule.label().to_string(),
        name: rule.name,
    })
}

/// Compiles a list of `PatternRule`s into `CompiledRules`.
///
/// Every rule is attempted; if any fail, the errors are reported together
/// and nothing is returned.
pub fn compile_rules(rules_to_compile: Vec<PatternRule>, case_insensitive: bool) -> Result<CompiledRules> {
    debug!("Starting compilation of {} rules.", rules_to_compile.len());

    let mut compiled_rules = Vec::with_capacity(rules_to_compile.len());
    let mut compilation_errors = Vec::new();

    for rule in rules_to_compile {
        match compile_rule(rule, case_insensitive) {
            Ok(compiled) => compiled_rules.push(compiled),
            Err(e) => compilation_errors.push(e),
        }
    }

    match compilation_errors.len() {
        0 => {
            debug!(
                "Finished compiling rules. Total compiled: {}.",
                compiled_rules.len()
            );
            Ok(CompiledRules {
                rules: compiled_rules,
                case_insensitive,
            })
        }
        1 => Err(compilation_errors.remove(0)),
        n => {
            let error_message = compilation_errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<String>>()
                .join("\n");
            Err(KakushiError::InvalidConfig(format!(
                "Failed to compile {} rule(s):\n{}",
                n, error_message
            )))
        }
    }
}

/// Gets a `CompiledRules` instance from the cache or compiles it if not found.
pub fn get_or_compile_rules(config: &PatternConfig) -> Result<Arc<CompiledRules>> {
    let rules = rules_to_compile(config);
    let case_insensitive = config.case_insensitive();
    let cache_key = hash_rules(&rules, case_insensitive);

    {
        let cache = COMPILED_RULES_CACHE
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(compiled) = cache.get(&cache_key) {
            debug!("Serving compiled rules from cache for key: {}", &cache_key);
            return Ok(Arc::clone(compiled));
        }
    }

    debug!("Compiled rules not found in cache. Compiling now.");
    let compiled = Arc::new(compile_rules(rules, case_insensitive)?);

    COMPILED_RULES_CACHE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(cache_key, Arc::clone(&compiled));

    debug!("Successfully compiled and cached rules for key: {}", &cache_key);
    Ok(compiled)
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
    fn test_compile_rules_collects_every_error() {
        let err = compile_rules(vec![rule("a", "("), rule("b", "[")], true).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Failed to compile 2 rule(s)"));
        assert!(msg.contains("'a'"));
        assert!(msg.contains("'b'"));
    }

    #[test]
    fn test_single_failure_keeps_specific_variant() {
        let err = compile_rules(vec![rule("bad", "(")], true).unwrap_err();
        assert!(matches!(err, KakushiError::RuleCompilation(ref name, _) if name == "bad"));
    }

    #[test]
    fn test_pattern_length_limit() {
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let err = compile_rules(vec![rule("long", &long)], true).unwrap_err();
        assert!(matches!(err, KakushiError::PatternLengthExceeded(_, _, _)));
    }

    #[test]
    fn test_malformed_look_around_is_rejected() {
        let err = compile_rules(vec![rule("lb", r"(?<!\d x")], true).unwrap_err();
        assert!(matches!(err, KakushiError::RuleCompilation(ref name, _) if name == "lb"));
    }

    #[test]
    fn test_inline_flags_follow_config() {
        let compiled = compile_rules(vec![rule("word", "ab  c")], true).unwrap();
        let regex = &compiled.rules[0].regex;
        assert!(regex.is_match("ABC").unwrap());

        let compiled = compile_rules(vec![rule("word", "abc")], false).unwrap();
        assert!(!compiled.rules[0].regex.is_match("ABC").unwrap());
    }

    #[test]
    fn test_inactive_rules_not_compiled() {
        let mut opt_in = rule("URL", "https?://");
        opt_in.opt_in = true;
        let config = PatternConfig {
            rules: vec![rule("EMAIL", "@"), opt_in],
            phrases: vec!["secret".to_string()],
            ..PatternConfig::default()
        };
        let names: Vec<String> = rules_to_compile(&config).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["EMAIL".to_string(), "PHRASE".to_string()]);
    }

    #[test]
    fn test_cache_returns_shared_instance() {
        let config = PatternConfig {
            rules: vec![rule("cache_shared", "shared-[0-9]+")],
            ..PatternConfig::default()
        };
        let a = get_or_compile_rules(&config).unwrap();
        let b = get_or_compile_rules(&config).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
