// kakushi-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for using the engine in headless mode (non-UI).
//! Provides helper functions for a full, one-shot sanitization of strings.

use anyhow::{Context, Result};

use crate::config::PatternConfig;
use crate::engine::{SanitizationEngine, SanitizeResult};
use crate::engines::sanitize_engine::SanitizeEngine;

/// Fully sanitizes an input string with a patterns-only engine built from
/// `config`, returning the rewritten text, mapping and count.
///
/// Builds a fresh engine per call; hold a [`SanitizeEngine`] instead when
/// sanitizing many inputs.
pub fn headless_sanitize_string(config: PatternConfig, content: &str) -> Result<SanitizeResult> {
    let engine = SanitizeEngine::new(config).context("Failed to build sanitization engine")?;
    engine
        .sanitize(content)
        .context("Failed to sanitize content")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternRule;

    #[test]
    fn test_headless_sanitize_string() -> Result<()> {
        let config = PatternConfig {
            rules: vec![PatternRule {
                name: "EMAIL".to_string(),
                pattern: Some(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[A-Za-z]{2,}".to_string()),
                ..PatternRule::default()
            }],
            ..PatternConfig::default()
        };

        let result = headless_sanitize_string(
            config,
            "My email is test@example.com, and another is another@example.net.",
        )?;

        assert_eq!(result.text, "My email is mailxxx, and another is mailxxx.");
        assert_eq!(result.replacements, 2);
        assert_eq!(result.mapping.len(), 2);
        Ok(())
    }
}
