// kakushi-core/src/mapping.rs
//! Original-to-pseudonym mapping produced by a sanitization call.
//!
//! Keys are the exact original substrings, values the tokens that replaced
//! them. Later insertions of the same original overwrite earlier ones, so a
//! mapping merged across many calls reflects the last token seen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplacementMapping {
    entries: BTreeMap<String, String>,
}

impl ReplacementMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: impl Into<String>, token: impl Into<String>) {
        self.entries.insert(original.into(), token.into());
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    /// Last-write-wins merge of `other` into `self`.
    pub fn merge(&mut self, other: ReplacementMapping) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the mapping as pretty-printed UTF-8 JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl FromIterator<(String, String)> for ReplacementMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_last_write_wins() {
        let mut a = ReplacementMapping::new();
        a.insert("x", "one");
        a.insert("y", "keep");
        let mut b = ReplacementMapping::new();
        b.insert("x", "two");
        a.merge(b);
        assert_eq!(a.get("x"), Some("two"));
        assert_eq!(a.get("y"), Some("keep"));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let mut m = ReplacementMapping::new();
        m.insert("090-1234-5678", "phonexxx");
        let value: serde_json::Value = serde_json::from_str(&m.to_json().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"090-1234-5678": "phonexxx"}));
    }

    #[test]
    fn test_write_json_keeps_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        let mut m = ReplacementMapping::new();
        m.insert("山田太郎", "namexxx");
        m.write_json(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("山田太郎"));
        let back: ReplacementMapping = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, m);
    }
}
