// kakushi-core/src/engines/sanitize_engine.rs
//! The standard `SanitizationEngine`: pattern rules plus an optional entity
//! recognizer, merged by greedy interval selection and replaced with
//! pseudonyms from the configured table.
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

use crate::config::{PatternConfig, RecognizerPolicy};
use crate::detection::{log_substitution_debug, Detection};
use crate::engine::{SanitizationEngine, SanitizeResult};
use crate::engines::pattern_detector::PatternDetector;
use crate::errors::{KakushiError, Result};
use crate::mapping::ReplacementMapping;
use crate::merger::{merge_detections, AcceptedSpans};
use crate::pseudonym::{PseudonymTable, TokenStyle};
use crate::recognizer::{EntityFilter, EntityRecognizer, NoopRecognizer};
use crate::sanitizers::compiler::CompiledRules;

/// Builds a [`SanitizeEngine`].
///
/// Anything not set explicitly is derived from the `PatternConfig`: the
/// entity allow-list from `entity_labels`, the pseudonym table from
/// `pseudonyms` and `tokens`, the policy from `recognizer_policy`.
#[derive(Default)]
pub struct SanitizeEngineBuilder {
    config: PatternConfig,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
    entity_filter: Option<EntityFilter>,
    pseudonyms: Option<PseudonymTable>,
    policy: Option<RecognizerPolicy>,
}

impl SanitizeEngineBuilder {
    pub fn config(mut self, config: PatternConfig) -> Self {
        self.config = config;
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn entity_filter(mut self, filter: EntityFilter) -> Self {
        self.entity_filter = Some(filter);
        self
    }

    pub fn pseudonyms(mut self, table: PseudonymTable) -> Self {
        self.pseudonyms = Some(table);
        self
    }

    pub fn policy(mut self, policy: RecognizerPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Compiles the rules and checks that no pseudonym is itself detectable.
    pub fn build(self) -> Result<SanitizeEngine> {
        let detector = PatternDetector::new(&self.config)?;

        let pseudonyms = match self.pseudonyms {
            Some(table) => table,
            None => pseudonyms_from_config(&self.config)?,
        };
        let entity_filter = self
            .entity_filter
            .unwrap_or_else(|| EntityFilter::new(self.config.entity_labels()));
        let policy = self.policy.unwrap_or(self.config.recognizer_policy());
        let recognizer = self
            .recognizer
            .unwrap_or_else(|| Arc::new(NoopRecognizer));

        check_tokens_undetectable(&detector, &pseudonyms, &entity_filter)?;

        debug!(
            "SanitizeEngine ready: {} rule(s), recognizer '{}', policy {:?}.",
            detector.compiled_rules().len(),
            recognizer.name(),
            policy
        );

        Ok(SanitizeEngine {
            detector,
            recognizer,
            entity_filter,
            pseudonyms,
            policy,
        })
    }
}

/// The pseudonym table described by a configuration.
pub fn pseudonyms_from_config(config: &PatternConfig) -> Result<PseudonymTable> {
    let table = PseudonymTable::with_overrides(config.pseudonyms.clone());
    match &config.tokens.format {
        Some(format) => table.with_style(TokenStyle::Hashed {
            format: format.clone(),
        }),
        None => Ok(table),
    }
}

/// Fails if a token the table can produce for any configured label would be
/// detected by the pattern rules. Substituted output must not be re-detected.
fn check_tokens_undetectable(
    detector: &PatternDetector,
    pseudonyms: &PseudonymTable,
    entity_filter: &EntityFilter,
) -> Result<()> {
    let mut labels: Vec<String> = detector.labels().into_iter().map(str::to_string).collect();
    for label in entity_filter.labels() {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }

    for label in &labels {
        let token = pseudonyms.sample_for(label)?;
        if let Some(hit) = detector.detect(&token)?.into_iter().next() {
            return Err(KakushiError::TokenMatchesPattern {
                label: label.clone(),
                token,
                rule: hit.label,
            });
        }
    }
    Ok(())
}

pub struct SanitizeEngine {
    detector: PatternDetector,
    recognizer: Arc<dyn EntityRecognizer>,
    entity_filter: EntityFilter,
    pseudonyms: PseudonymTable,
    policy: RecognizerPolicy,
}

impl fmt::Debug for SanitizeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SanitizeEngine")
            .field("detector", &self.detector)
            .field("recognizer", &self.recognizer.name())
            .field("entity_filter", &self.entity_filter)
            .field("pseudonyms", &self.pseudonyms)
            .field("policy", &self.policy)
            .finish()
    }
}

impl SanitizeEngine {
    pub fn builder() -> SanitizeEngineBuilder {
        SanitizeEngineBuilder::default()
    }

    /// Patterns-only engine for `config`.
    pub fn new(config: PatternConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn pseudonyms(&self) -> &PseudonymTable {
        &self.pseudonyms
    }

    pub fn policy(&self) -> RecognizerPolicy {
        self.policy
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Runs both detectors and merges their output.
    ///
    /// Pattern detections are listed before entity detections so that exact
    /// duplicates resolve in favor of the pattern rule.
    fn accepted_spans(&self, text: &str) -> Result<(AcceptedSpans, bool)> {
        let mut detections: Vec<Detection> = self.detector.detect(text)?;
        let mut degraded = false;

        match self.recognizer.detect_entities(text) {
            Ok(entities) => {
                let entities = self.entity_filter.apply(text, self.recognizer.name(), entities);
                debug!(
                    "Recognizer '{}' contributed {} detection(s).",
                    self.recognizer.name(),
                    entities.len()
                );
                detections.extend(entities);
            }
            Err(e) => match self.policy {
                RecognizerPolicy::Strict => {
                    return Err(match e {
                        err @ KakushiError::Recognizer { .. } => err,
                        other => KakushiError::recognizer(self.recognizer.name(), other.to_string()),
                    });
                }
                RecognizerPolicy::FallbackToPatterns => {
                    warn!(
                        "Entity recognizer '{}' failed ({}); continuing with pattern detections only.",
                        self.recognizer.name(),
                        e
                    );
                    degraded = true;
                }
            },
        }

        let raw = detections.len();
        let accepted = merge_detections(detections);
        debug!("Merged {} detection(s) into {} span(s).", raw, accepted.len());
        Ok((accepted, degraded))
    }
}

impl SanitizationEngine for SanitizeEngine {
    fn sanitize(&self, text: &str) -> Result<SanitizeResult> {
        if text.is_empty() {
            return Ok(SanitizeResult::unchanged(text));
        }

        let (accepted, degraded) = self.accepted_spans(text)?;

        let mut sanitized = text.to_string();
        let mut mapping = ReplacementMapping::new();

        // Right to left: earlier offsets stay valid after each splice.
        for span in accepted.iter_descending() {
            let original = span.slice(text);
            let token = self.pseudonyms.pseudonym_for(&span.label, original)?;
            log_substitution_debug(module_path!(), original, &token, &span.label);
            sanitized.replace_range(span.start..span.end, &token);
            mapping.insert(original, token);
        }

        Ok(SanitizeResult {
            text: sanitized,
            mapping,
            replacements: accepted.len(),
            degraded,
            spans: accepted.into_vec(),
        })
    }

    fn scan(&self, text: &str) -> Result<Vec<Detection>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let (accepted, _) = self.accepted_spans(text)?;
        Ok(accepted.into_vec())
    }

    fn compiled_rules(&self) -> &CompiledRules {
        self.detector.compiled_rules()
    }
}
