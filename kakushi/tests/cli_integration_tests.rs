// kakushi/tests/cli_integration_tests.rs
//! Command-line integration tests for the `kakushi` binary.
//!
//! Each test runs the real executable through `assert_cmd` with HOME and the
//! config directory pointed at an empty temp dir, so no user rules file on
//! the machine can leak into the results. Console output may be colored;
//! `strip_ansi_escapes` is used before comparing text.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

use strip_ansi_escapes::strip as strip_ansi_escapes_fn;

/// A `kakushi` command isolated from any user configuration.
fn kakushi(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kakushi").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("RUST_LOG", "warn")
        .current_dir(home);
    cmd
}

fn plain(bytes: &[u8]) -> String {
    String::from_utf8(strip_ansi_escapes_fn(bytes)).unwrap()
}

fn home() -> TempDir {
    tempdir().unwrap()
}

#[test]
fn test_sanitize_stdin_replaces_phone_and_email() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["sanitize", "--no-summary"])
        .write_stdin("電話は090-1234-5678、メールは taro@example.com です\n")
        .output()?;
    assert!(output.status.success());
    assert_eq!(
        plain(&output.stdout),
        "電話はphonexxx、メールは mailxxx です\n"
    );
    Ok(())
}

#[test]
fn test_summary_goes_to_stderr() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["sanitize"])
        .write_stdin("TEL 03-1234-5678\n")
        .output()?;
    assert!(output.status.success());
    assert_eq!(plain(&output.stdout), "TEL phonexxx\n");
    let stderr = plain(&output.stderr);
    assert!(stderr.contains("PHONE"));
    assert!(stderr.contains("Total replacements: 1"));
    Ok(())
}

#[test]
fn test_text_without_pii_passes_through() -> Result<()> {
    let home = home();
    kakushi(home.path())
        .args(["sanitize", "--no-summary"])
        .write_stdin("nothing to hide\r\nat all")
        .assert()
        .success()
        .stdout("nothing to hide\r\nat all");
    Ok(())
}

#[test]
fn test_mapping_json_written() -> Result<()> {
    let home = home();
    let mapping = home.path().join("mapping.json");
    kakushi(home.path())
        .args(["sanitize", "--no-summary", "--mapping-json"])
        .arg(&mapping)
        .write_stdin("a@x.com と 090-1234-5678\n")
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&mapping)?)?;
    assert_eq!(json["a@x.com"], "mailxxx");
    assert_eq!(json["090-1234-5678"], "phonexxx");
    Ok(())
}

#[test]
fn test_sanitize_file_to_output_file() -> Result<()> {
    let home = home();
    let input = home.path().join("in.txt");
    let out = home.path().join("out.txt");
    fs::write(&input, "〒100-0001\n")?;
    kakushi(home.path())
        .args(["-q", "sanitize", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read_to_string(&out)?, "zipxxx\n");
    Ok(())
}

#[test]
fn test_json_format_keeps_keys() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["sanitize", "--no-summary", "--format", "json"])
        .write_stdin(r#"{"a@x.com": ["090-1234-5678", 42, "=SUM(A1:A3)"]}"#)
        .output()?;
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["a@x.com"][0], "phonexxx");
    assert_eq!(json["a@x.com"][1], 42);
    assert_eq!(json["a@x.com"][2], "=SUM(A1:A3)");
    Ok(())
}

#[test]
fn test_json_format_keeps_key_order() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["sanitize", "--no-summary", "--format", "json"])
        .write_stdin(r#"{"zeta": "a@x.com", "alpha": 1, "mid": "none"}"#)
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let zeta = stdout.find("zeta").unwrap();
    let alpha = stdout.find("alpha").unwrap();
    let mid = stdout.find("mid").unwrap();
    assert!(zeta < alpha && alpha < mid, "{}", stdout);
    assert!(stdout.contains("mailxxx"));
    Ok(())
}

#[test]
fn test_text_line_starting_with_equals_is_sanitized() -> Result<()> {
    let home = home();
    kakushi(home.path())
        .args(["sanitize", "--no-summary"])
        .write_stdin("連絡先\n=TEL 090-1234-5678 a@x.com\n")
        .assert()
        .success()
        .stdout("連絡先\n=TEL phonexxx mailxxx\n");
    Ok(())
}

#[test]
fn test_phone_followed_by_extra_digits_keeps_shorter_match() -> Result<()> {
    let home = home();
    kakushi(home.path())
        .args(["sanitize", "--no-summary"])
        .write_stdin("TEL 090-1234-56789\n0312-345-67890\n")
        .assert()
        .success()
        .stdout("TEL phonexxx-56789\nphonexxx-67890\n");
    Ok(())
}

#[test]
fn test_invalid_json_input_fails() -> Result<()> {
    let home = home();
    kakushi(home.path())
        .args(["sanitize", "--format", "json"])
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input is not valid JSON"));
    Ok(())
}

#[test]
fn test_phrase_flag_redacts_literal() -> Result<()> {
    let home = home();
    kakushi(home.path())
        .args(["sanitize", "--no-summary", "--phrase", "Project Falcon"])
        .write_stdin("status of project falcon\n")
        .assert()
        .success()
        .stdout("status of xxx\n");
    Ok(())
}

#[test]
fn test_opt_in_url_rule_enabled_by_flag() -> Result<()> {
    let home = home();
    let input = "see https://example.com/a\n";
    kakushi(home.path())
        .args(["sanitize", "--no-summary"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(input);
    kakushi(home.path())
        .args(["sanitize", "--no-summary", "-e", "URL"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout("see urlxxx\n");
    Ok(())
}

#[test]
fn test_disable_rule() -> Result<()> {
    let home = home();
    kakushi(home.path())
        .args(["sanitize", "--no-summary", "-x", "EMAIL"])
        .write_stdin("a@x.com\n")
        .assert()
        .success()
        .stdout("a@x.com\n");
    Ok(())
}

#[test]
fn test_entities_dictionary_and_patterns_only() -> Result<()> {
    let home = home();
    let dict = home.path().join("entities.yaml");
    fs::write(&dict, "entries:\n  PERSON:\n    - 山田太郎\n")?;

    kakushi(home.path())
        .args(["sanitize", "--no-summary", "--entities"])
        .arg(&dict)
        .write_stdin("担当は山田太郎です\n")
        .assert()
        .success()
        .stdout("担当はnamexxxです\n");

    kakushi(home.path())
        .args(["sanitize", "--no-summary", "--patterns-only"])
        .write_stdin("担当は山田太郎です\n")
        .assert()
        .success()
        .stdout("担当は山田太郎です\n");
    Ok(())
}

#[test]
fn test_missing_dictionary_warns_and_continues() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["sanitize", "--no-summary", "--entities", "missing.yaml"])
        .write_stdin("TEL 03-1234-5678\n")
        .output()?;
    assert!(output.status.success());
    assert_eq!(plain(&output.stdout), "TEL phonexxx\n");
    assert!(plain(&output.stderr).contains("Warning: Entity dictionary"));
    Ok(())
}

#[test]
fn test_custom_config_file_adds_rule() -> Result<()> {
    let home = home();
    let config = home.path().join("rules.yaml");
    fs::write(
        &config,
        r#"
rules:
  - name: EMPLOYEE_ID
    label: EMPLOYEE_ID
    pattern: 'EMP-\d{5}'
pseudonyms:
  EMPLOYEE_ID: empxxx
"#,
    )?;
    kakushi(home.path())
        .args(["sanitize", "--no-summary", "--config"])
        .arg(&config)
        .write_stdin("id EMP-12345\n")
        .assert()
        .success()
        .stdout("id empxxx\n");
    Ok(())
}

#[test]
fn test_invalid_config_reports_error() -> Result<()> {
    let home = home();
    let config = home.path().join("rules.yaml");
    fs::write(&config, "rules:\n  - name: BROKEN\n    pattern: '(unclosed'\n")?;
    kakushi(home.path())
        .args(["sanitize", "--config"])
        .arg(&config)
        .write_stdin("x\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    Ok(())
}

#[test]
fn test_diff_output() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["sanitize", "--no-summary", "--diff"])
        .write_stdin("keep\nTEL 03-1234-5678\n")
        .output()?;
    assert!(output.status.success());
    let stdout = plain(&output.stdout);
    assert!(stdout.contains("-TEL 03-1234-5678"));
    assert!(stdout.contains("+TEL phonexxx"));
    Ok(())
}

#[test]
fn test_scan_json_report_has_no_raw_values() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["scan", "--json-stdout"])
        .write_stdin("first line\nmail a@x.com / 090-1234-5678\n")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(!stdout.contains("a@x.com"));
    assert!(!stdout.contains("090-1234-5678"));

    let report: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(report["total"], 2);
    assert_eq!(report["input"], "stdin");
    assert_eq!(report["by_label"]["EMAIL"], 1);
    assert_eq!(report["by_label"]["PHONE"], 1);
    assert_eq!(report["findings"][0]["line"], 2);
    assert_eq!(report["findings"][0]["column"], 6);
    assert!(report["generated_at"].is_string());
    Ok(())
}

#[test]
fn test_scan_table_output() -> Result<()> {
    let home = home();
    let output = kakushi(home.path())
        .args(["scan"])
        .write_stdin("TEL 03-1234-5678\n")
        .output()?;
    assert!(output.status.success());
    let stdout = plain(&output.stdout);
    assert!(stdout.contains("PHONE"));
    assert!(stdout.contains("Total findings: 1"));
    Ok(())
}

#[test]
fn test_batch_writes_sibling_tree_and_mapping() -> Result<()> {
    let home = home();
    let base = home.path().join("docs");
    fs::create_dir_all(base.join("nested"))?;
    fs::write(base.join("a.txt"), "TEL 03-1234-5678\n")?;
    fs::write(base.join("nested/b.md"), "# Contact\n\na@x.com\n")?;
    fs::write(base.join("c.csv"), "03-1234-5678\n")?;
    let mapping = home.path().join("mapping.json");

    let output = kakushi(home.path())
        .args(["batch", "docs", "--mapping-json"])
        .arg(&mapping)
        .output()?;
    assert!(output.status.success());
    assert!(plain(&output.stderr).contains("Scanned 2 file(s): 2 changed"));

    let out = home.path().join("docs_sanitized");
    assert_eq!(fs::read_to_string(out.join("a.txt"))?, "TEL phonexxx\n");
    assert_eq!(fs::read_to_string(out.join("nested/b.md"))?, "# Contact\n\nmailxxx\n");
    assert!(!out.join("c.csv").exists());
    assert_eq!(fs::read_to_string(base.join("a.txt"))?, "TEL 03-1234-5678\n");

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&mapping)?)?;
    assert_eq!(json["a@x.com"], "mailxxx");
    Ok(())
}

#[test]
fn test_batch_refuses_nested_out_dir() -> Result<()> {
    let home = home();
    fs::create_dir(home.path().join("docs"))?;
    kakushi(home.path())
        .args(["batch", "docs", "--out-dir", "docs/clean"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be inside"));
    Ok(())
}

#[test]
fn test_batch_overwrite_in_place() -> Result<()> {
    let home = home();
    let base = home.path().join("docs");
    fs::create_dir(&base)?;
    fs::write(base.join("a.txt"), "a@x.com\n")?;
    kakushi(home.path())
        .args(["-q", "batch", "docs", "--overwrite"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(base.join("a.txt"))?, "mailxxx\n");
    assert!(!home.path().join("docs_sanitized").exists());
    Ok(())
}

#[test]
fn test_rules_lists_opt_in_rules() -> Result<()> {
    let home = home();
    let output = kakushi(home.path()).args(["rules"]).output()?;
    assert!(output.status.success());
    let stdout = plain(&output.stdout);
    assert!(stdout.contains("PHONE"));
    assert!(stdout.contains("phonexxx"));
    assert!(stdout.contains("URL"));
    Ok(())
}

#[test]
fn test_no_subcommand_prints_help() {
    let home = home();
    kakushi(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
