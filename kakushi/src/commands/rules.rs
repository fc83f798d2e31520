// kakushi/src/commands/rules.rs
//! `kakushi rules`: show every configured rule, whether it would run, and
//! the pseudonym it produces.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use std::collections::HashSet;
use std::io::{self, Write};

use kakushi_core::{pseudonyms_from_config, PatternConfig};

use crate::cli::{RuleArgs, RulesCommand};
use crate::commands::setup::load_merged_config;

/// Names of the rules left active once `--enable` / `--disable` are applied.
pub fn enabled_rule_names(config: &PatternConfig, args: &RuleArgs) -> HashSet<String> {
    let mut active = config.clone();
    active.set_active_rules(&args.enable, &args.disable);
    active.rules.into_iter().map(|r| r.name).collect()
}

pub fn build_rules_table(config: &PatternConfig, args: &RuleArgs) -> Result<Table> {
    let pseudonyms = pseudonyms_from_config(config)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .force_no_tty()
        .set_header(vec!["Rule", "Label", "Enabled", "Pseudonym", "Description"]);

    let enabled = enabled_rule_names(config, args);
    let mut rows: Vec<(_, bool)> = config
        .rules
        .iter()
        .map(|rule| (rule, enabled.contains(&rule.name)))
        .collect();
    // Phrases always run once configured.
    let phrase_rule = config.phrase_rule();
    if let Some(rule) = &phrase_rule {
        rows.push((rule, true));
    }

    for (rule, enabled) in rows {
        table.add_row(vec![
            rule.name.clone(),
            rule.label().to_string(),
            if enabled { "yes" } else { "no" }.to_string(),
            pseudonyms.describe(rule.label()),
            rule.description.clone().unwrap_or_default(),
        ]);
    }
    Ok(table)
}

pub fn run_rules(cmd: &RulesCommand) -> Result<()> {
    let config = load_merged_config(&cmd.rules)?;
    let table = build_rules_table(&config, &cmd.rules)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", table)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PatternConfig {
        PatternConfig::load_default_rules().unwrap()
    }

    #[test]
    fn opt_in_rule_shown_disabled_until_enabled() {
        let names = enabled_rule_names(&defaults(), &RuleArgs::default());
        assert!(!names.contains("URL"));
        assert!(names.contains("PHONE"));

        let args = RuleArgs {
            enable: vec!["URL".to_string()],
            ..RuleArgs::default()
        };
        assert!(enabled_rule_names(&defaults(), &args).contains("URL"));
    }

    #[test]
    fn disable_wins_over_enable() {
        let args = RuleArgs {
            enable: vec!["PHONE".to_string()],
            disable: vec!["PHONE".to_string()],
            ..RuleArgs::default()
        };
        assert!(!enabled_rule_names(&defaults(), &args).contains("PHONE"));
    }

    #[test]
    fn config_disabled_rule_follows_set_active_rules() {
        let mut config = defaults();
        for rule in config.rules.iter_mut().filter(|r| r.name == "EMAIL") {
            rule.enabled = Some(false);
        }
        assert!(!enabled_rule_names(&config, &RuleArgs::default()).contains("EMAIL"));
    }

    #[test]
    fn table_lists_default_rules_with_tokens() {
        let rendered = build_rules_table(&defaults(), &RuleArgs::default()).unwrap().to_string();
        assert!(rendered.contains("PHONE"));
        assert!(rendered.contains("phonexxx"));
        assert!(rendered.contains("URL"));
    }

    #[test]
    fn hashed_tokens_shown_as_format() {
        let mut config = defaults();
        config.tokens.format = Some("{token}-{shorthash}".to_string());
        let rendered = build_rules_table(&config, &RuleArgs::default()).unwrap().to_string();
        assert!(rendered.contains("phonexxx-{shorthash}"));
    }
}
