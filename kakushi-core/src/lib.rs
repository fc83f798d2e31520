// kakushi-core/src/lib.rs
//! # Kakushi Core Library
//!
//! `kakushi-core` redacts personally identifiable information in free text
//! and replaces each detected span with a category pseudonym such as
//! `phonexxx` or `namexxx`. Two detector families feed one conflict
//! resolver: labeled pattern rules and an optional semantic entity
//! recognizer. Their spans are merged into a non-overlapping cover and
//! substituted right to left, yielding the rewritten text, an
//! original-to-pseudonym mapping and a replacement count.
//!
//! The library is pure: it performs no I/O beyond explicit config and
//! mapping files, and keeps no state between calls apart from a shared
//! compiled-rule cache.
//!
//! ## Modules
//!
//! * `config`: `PatternRule`s and `PatternConfig`, YAML loading and merging.
//! * `sanitizers`: rule compilation and the compiled-rule cache.
//! * `detection`: the `Detection` span type and PII-safe debug logging.
//! * `recognizer`: the `EntityRecognizer` seam and the entity-label allow-list.
//! * `merger`: greedy interval selection into `AcceptedSpans`.
//! * `pseudonym`: the injected label-to-token table.
//! * `mapping`: the original-to-token `ReplacementMapping`.
//! * `engine`: the `SanitizationEngine` trait and `SanitizeResult`.
//! * `engines`: the pattern detector, the gazetteer recognizer and `SanitizeEngine`.
//! * `walker`: applying an engine to every text leaf of a document.
//! * `headless`: one-shot convenience wrapper.
//!
//! ## Usage Example
//!
//! ```rust
//! use kakushi_core::{PatternConfig, SanitizationEngine, SanitizeEngine};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PatternConfig::load_default_rules()?;
//!     let engine = SanitizeEngine::new(config)?;
//!
//!     let result = engine.sanitize("電話は090-1234-5678です")?;
//!     assert_eq!(result.text, "電話はphonexxxです");
//!     assert_eq!(result.replacements, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Engine operations return [`KakushiError`]. Config-file loading uses
//! `anyhow` so callers get the file path in the error chain.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod detection;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod mapping;
pub mod merger;
pub mod pseudonym;
pub mod recognizer;
pub mod sanitizers;
pub mod walker;

/// Re-exports the public configuration types and functions.
pub use config::{
    config_candidate_paths,
    merge_rules,
    PatternConfig,
    PatternRule,
    RecognizerPolicy,
    TokenConfig,
    MAX_PATTERN_LENGTH,
    PHRASE_LABEL,
};

pub use errors::KakushiError;

pub use detection::{redact_sensitive, Detection, DetectionSource};

pub use engine::{SanitizationEngine, SanitizeResult};

pub use engines::gazetteer::{GazetteerConfig, GazetteerRecognizer};
pub use engines::pattern_detector::PatternDetector;
pub use engines::sanitize_engine::{pseudonyms_from_config, SanitizeEngine, SanitizeEngineBuilder};

pub use mapping::ReplacementMapping;
pub use merger::{merge_detections, AcceptedSpans};
pub use pseudonym::{fallback_token, PseudonymTable, TokenStyle, DEFAULT_PSEUDONYMS};
pub use recognizer::{EntityFilter, EntityRecognizer, NoopRecognizer, DEFAULT_ENTITY_LABELS};

pub use walker::{
    is_formula,
    sanitize_json,
    sanitize_text_document,
    walk_leaves,
    LeafValue,
    WalkReport,
};

pub use headless::headless_sanitize_string;

pub use sanitizers::compiler::{compile_rules, get_or_compile_rules, CompiledRule, CompiledRules};
