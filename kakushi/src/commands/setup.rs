// kakushi/src/commands/setup.rs
//! Turns the shared rule flags into a configuration and a ready engine.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use kakushi_core::{
    merge_rules, EntityRecognizer, GazetteerRecognizer, NoopRecognizer, PatternConfig,
    SanitizeEngine,
};

use crate::cli::RuleArgs;

/// An engine plus the configuration it was built from.
pub struct EngineSetup {
    pub engine: SanitizeEngine,
    pub config: PatternConfig,
    /// Non-fatal problems the user should be told about.
    pub warnings: Vec<String>,
}

/// Defaults merged with the user's rules file and the command-line overrides.
/// Rule activation (`--enable` / `--disable`) is not applied yet.
pub fn load_merged_config(args: &RuleArgs) -> Result<PatternConfig> {
    let defaults = PatternConfig::load_default_rules()?;
    let user = match &args.config {
        Some(path) => Some(
            PatternConfig::load_from_file(path)
                .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        ),
        None => PatternConfig::load_user_config()?,
    };
    let mut config = merge_rules(defaults, user);

    config.phrases.extend(args.phrases.iter().cloned());
    if args.case_sensitive {
        config.case_insensitive = Some(false);
    }
    if let Some(format) = &args.token_format {
        config.tokens.format = Some(format.clone());
    }
    Ok(config)
}

fn load_recognizer(args: &RuleArgs, warnings: &mut Vec<String>) -> Arc<dyn EntityRecognizer> {
    if args.patterns_only {
        debug!("Patterns-only run; no entity recognizer installed.");
        return Arc::new(NoopRecognizer);
    }
    let Some(path) = &args.entities else {
        return Arc::new(NoopRecognizer);
    };
    match GazetteerRecognizer::from_file(path) {
        Ok(recognizer) => {
            info!(
                "Loaded entity dictionary {} ({} terms).",
                path.display(),
                recognizer.term_count()
            );
            Arc::new(recognizer)
        }
        Err(e) => {
            let message = format!(
                "Entity dictionary {} could not be loaded ({}); continuing with pattern rules only.",
                path.display(),
                e
            );
            warn!("{}", message);
            warnings.push(message);
            Arc::new(NoopRecognizer)
        }
    }
}

pub fn build_engine(args: &RuleArgs) -> Result<EngineSetup> {
    let mut config = load_merged_config(args)?;
    config.set_active_rules(&args.enable, &args.disable);

    let mut warnings = Vec::new();
    let recognizer = load_recognizer(args, &mut warnings);

    let engine = SanitizeEngine::builder()
        .config(config.clone())
        .recognizer(recognizer)
        .build()
        .context("Failed to build sanitization engine")?;

    Ok(EngineSetup {
        engine,
        config,
        warnings,
    })
}

/// Reads the whole input from a file, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakushi_core::SanitizationEngine;

    #[test]
    fn flags_override_config() {
        let args = RuleArgs {
            phrases: vec!["Hayabusa".to_string()],
            case_sensitive: true,
            token_format: Some("{token}-{shorthash}".to_string()),
            ..RuleArgs::default()
        };
        let config = load_merged_config(&args).unwrap();
        assert!(!config.case_insensitive());
        assert!(config.phrases.contains(&"Hayabusa".to_string()));
        assert_eq!(config.tokens.format.as_deref(), Some("{token}-{shorthash}"));
    }

    #[test]
    fn missing_dictionary_degrades_with_warning() {
        let args = RuleArgs {
            entities: Some("/nonexistent/entities.yaml".into()),
            ..RuleArgs::default()
        };
        let setup = build_engine(&args).unwrap();
        assert_eq!(setup.warnings.len(), 1);
        assert_eq!(setup.engine.recognizer_name(), "none");
        let result = setup.engine.sanitize("TEL 03-1234-5678").unwrap();
        assert_eq!(result.text, "TEL phonexxx");
    }
}
