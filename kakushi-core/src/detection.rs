// kakushi-core/src/detection.rs
//! Core data structures for detections, plus the logging helpers that keep
//! matched PII out of debug logs.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Initialized once: whether original PII may appear in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("KAKUSHI_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Which detector family produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Pattern,
    Entity,
}

/// A labeled span proposed by a detector.
///
/// `start` and `end` are byte offsets into the source `&str` (half-open).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub source: DetectionSource,
}

impl Detection {
    pub fn new(start: usize, end: usize, label: impl Into<String>, source: DetectionSource) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            source,
        }
    }

    pub fn pattern(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self::new(start, end, label, DetectionSource::Pattern)
    }

    pub fn entity(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self::new(start, end, label, DetectionSource::Entity)
    }

    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if `0 <= start < end <= text.len()` and both ends sit on char boundaries.
    pub fn is_valid_for(&self, text: &str) -> bool {
        self.start < self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
    }

    /// The covered substring. Callers must check `is_valid_for` first.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let chars = s.chars().count();
    if chars <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", chars)
    }
}

pub(crate) fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub(crate) fn log_detection_debug(module_path: &str, detection: &Detection, text: &str) {
    debug!(
        "{} Detection: Label='{}', Source={:?}, Span={}..{}, Original='{}'",
        module_path,
        detection.label,
        detection.source,
        detection.start,
        detection.end,
        get_loggable_content(detection.slice(text))
    );
}

pub(crate) fn log_substitution_debug(module_path: &str, original: &str, token: &str, label: &str) {
    debug!(
        "{} Substitution: Original='{}', Pseudonym='{}' for label '{}'",
        module_path,
        get_loggable_content(original),
        token,
        label
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_short_string() {
        assert_eq!(redact_sensitive("abc"), "[REDACTED]".to_string());
    }

    #[test]
    fn test_redact_sensitive_counts_chars_not_bytes() {
        assert_eq!(redact_sensitive("山田太郎"), "[REDACTED]".to_string());
        assert_eq!(
            redact_sensitive("090-1234-5678"),
            "[REDACTED: 13 chars]".to_string()
        );
    }

    #[test]
    fn test_is_valid_for_checks_bounds_and_boundaries() {
        let text = "電話";
        assert!(Detection::pattern(0, 3, "X").is_valid_for(text));
        assert!(!Detection::pattern(0, 2, "X").is_valid_for(text));
        assert!(!Detection::pattern(3, 3, "X").is_valid_for(text));
        assert!(!Detection::pattern(3, 9, "X").is_valid_for(text));
    }
}
