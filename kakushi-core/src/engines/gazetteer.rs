//! Dictionary-backed entity recognizer.
//!
//! Looks up known names, places and organisations with a leftmost-longest
//! Aho-Corasick automaton. It is the local stand-in for a statistical NER
//! model: cheap to build, read-only once built, safe to share across threads.

use daachorse::{DoubleArrayAhoCorasick, DoubleArrayAhoCorasickBuilder, MatchKind};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::detection::Detection;
use crate::errors::{KakushiError, Result};
use crate::recognizer::{EntityRecognizer, DEFAULT_ENTITY_LABELS};

/// On-disk dictionary format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    /// ASCII case folding for terms and text.
    pub case_insensitive: bool,
    /// Label -> terms.
    pub entries: BTreeMap<String, Vec<String>>,
}

impl GazetteerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading gazetteer from: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let config: GazetteerConfig = serde_yml::from_str(&text)?;
        Ok(config)
    }
}

pub struct GazetteerRecognizer {
    automaton: DoubleArrayAhoCorasick<u32>,
    labels: Vec<String>,
    case_insensitive: bool,
    term_count: usize,
}

impl fmt::Debug for GazetteerRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GazetteerRecognizer")
            .field("automaton", &"<DoubleArrayAhoCorasick>")
            .field("labels", &self.labels)
            .field("case_insensitive", &self.case_insensitive)
            .field("term_count", &self.term_count)
            .finish()
    }
}

impl GazetteerRecognizer {
    pub fn new(config: &GazetteerConfig) -> Result<Self> {
        let mut labels: Vec<String> = Vec::new();
        let mut patvals: Vec<(String, u32)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (label, terms) in &config.entries {
            if !DEFAULT_ENTITY_LABELS.contains(&label.as_str()) {
                return Err(KakushiError::Gazetteer(format!(
                    "unknown entity label '{}' (expected one of {})",
                    label,
                    DEFAULT_ENTITY_LABELS.join(", ")
                )));
            }
            let index = labels.len() as u32;
            labels.push(label.clone());

            for term in terms {
                let term = term.trim();
                if term.is_empty() {
                    return Err(KakushiError::Gazetteer(format!(
                        "empty term under label '{}'",
                        label
                    )));
                }
                let key = if config.case_insensitive {
                    term.to_ascii_lowercase()
                } else {
                    term.to_string()
                };
                if !seen.insert(key.clone()) {
                    return Err(KakushiError::Gazetteer(format!(
                        "duplicate term '{}' under label '{}'",
                        term, label
                    )));
                }
                patvals.push((key, index));
            }
        }

        if patvals.is_empty() {
            return Err(KakushiError::Gazetteer("dictionary has no terms".to_string()));
        }

        let term_count = patvals.len();
        let automaton = DoubleArrayAhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build_with_values(patvals)
            .map_err(|e| KakushiError::Gazetteer(e.to_string()))?;

        debug!(
            "Built gazetteer with {} term(s) across {} label(s).",
            term_count,
            labels.len()
        );

        Ok(Self {
            automaton,
            labels,
            case_insensitive: config.case_insensitive,
            term_count,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(&GazetteerConfig::load_from_file(path)?)
    }

    pub fn term_count(&self) -> usize {
        self.term_count
    }
}

/// An ASCII word character on either side of a match that itself starts or
/// ends with one means the term is embedded in a longer word.
fn is_embedded(haystack: &[u8], start: usize, end: usize) -> bool {
    let first = haystack[start];
    let last = haystack[end - 1];
    let before = start > 0 && haystack[start - 1].is_ascii_alphanumeric();
    let after = end < haystack.len() && haystack[end].is_ascii_alphanumeric();
    (first.is_ascii_alphanumeric() && before) || (last.is_ascii_alphanumeric() && after)
}

impl EntityRecognizer for GazetteerRecognizer {
    fn detect_entities(&self, text: &str) -> Result<Vec<Detection>> {
        let folded;
        let haystack: &[u8] = if self.case_insensitive {
            folded = text.to_ascii_lowercase();
            folded.as_bytes()
        } else {
            text.as_bytes()
        };

        let mut out = Vec::new();
        for m in self.automaton.leftmost_find_iter(haystack) {
            if is_embedded(haystack, m.start(), m.end()) {
                continue;
            }
            let label = &self.labels[m.value() as usize];
            out.push(Detection::entity(m.start(), m.end(), label.as_str()));
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "gazetteer"
    }
}
