//! Label -> pseudonym lookup.
//!
//! The table is injected configuration: built-in defaults overlaid with the
//! caller's overrides. By default every value of a label is replaced by the
//! same literal token (category-level pseudonymization). A token format can
//! instead derive a stable per-value token from a short hash of the original.
//!
//! License: MIT OR Apache-2.0

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tinytemplate::TinyTemplate;

use crate::errors::{KakushiError, Result};

/// Built-in label -> token pairs.
pub const DEFAULT_PSEUDONYMS: &[(&str, &str)] = &[
    ("PERSON", "namexxx"),
    ("EMAIL", "mailxxx"),
    ("PHONE", "phonexxx"),
    ("ZIP", "zipxxx"),
    ("IP", "ipxxx"),
    ("CREDIT_CARD", "cardxxx"),
    ("GPE", "prefxxx"),
    ("LOC", "cityxxx"),
    ("DATE", "datexxx"),
    ("ORG", "orgxxx"),
    ("ADDR", "addrxxx"),
    ("MY_NUMBER", "mynumberxxx"),
    ("PIN_USER", "pinuserxxx"),
    ("PIN_SIGNATURE", "pinsigxxx"),
    ("PIN_KENMEN", "pinkmxxx"),
    ("PIN_JUMIN", "pinjuminxxx"),
    ("IPV6", "ipv6xxx"),
    ("WINDOWS_PATH", "pathxxx"),
    ("UNC_PATH", "pathxxx"),
    ("UNIX_PATH", "pathxxx"),
    ("URL", "urlxxx"),
    ("MAC_ADDRESS", "macxxx"),
    ("PHRASE", "xxx"),
];

/// Token for a label with no table entry.
pub fn fallback_token(label: &str) -> String {
    format!("<{}hogehoge>", label)
}

/// First 32 bits of SHA-256 over `label:original`, one letter `a`-`p` per
/// nibble. Contains no digits, so no numeric rule can match it.
pub fn short_hash(label: &str, original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(b":");
    hasher.update(original.as_bytes());
    let digest = hasher.finalize();
    digest[..4]
        .iter()
        .flat_map(|byte| [byte >> 4, byte & 0x0f])
        .map(|nibble| char::from(b'a' + nibble))
        .collect()
}

/// How tokens are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenStyle {
    /// One literal per label.
    #[default]
    Category,
    /// A template over `{label}`, `{token}` and `{shorthash}`.
    Hashed { format: String },
}

#[derive(Serialize)]
struct TokenContext<'a> {
    label: &'a str,
    token: &'a str,
    shorthash: &'a str,
}

fn render(format: &str, label: &str, token: &str, shorthash: &str) -> Result<String> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("token", format)
        .map_err(|e| KakushiError::Template(e.to_string()))?;
    let ctx = TokenContext {
        label,
        token,
        shorthash,
    };
    tt.render("token", &ctx)
        .map_err(|e| KakushiError::Template(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudonymTable {
    tokens: BTreeMap<String, String>,
    style: TokenStyle,
}

impl Default for PseudonymTable {
    fn default() -> Self {
        Self {
            tokens: DEFAULT_PSEUDONYMS
                .iter()
                .map(|(l, t)| (l.to_string(), t.to_string()))
                .collect(),
            style: TokenStyle::Category,
        }
    }
}

impl PseudonymTable {
    /// A table with no entries: every label gets the fallback token.
    pub fn empty() -> Self {
        Self {
            tokens: BTreeMap::new(),
            style: TokenStyle::Category,
        }
    }

    /// Defaults overlaid with `overrides`.
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::default();
        table
            .tokens
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        table
    }

    /// Switches to per-value tokens. The format is checked by rendering a sample.
    pub fn with_style(mut self, style: TokenStyle) -> Result<Self> {
        if let TokenStyle::Hashed { format } = &style {
            render(format, "LABEL", "labelxxx", "aaaaaaaa")?;
        }
        self.style = style;
        Ok(self)
    }

    pub fn style(&self) -> &TokenStyle {
        &self.style
    }

    /// The literal token for a label, or the templated fallback.
    pub fn token_for<'a>(&'a self, label: &str) -> Cow<'a, str> {
        match self.tokens.get(label) {
            Some(token) => Cow::Borrowed(token.as_str()),
            None => Cow::Owned(fallback_token(label)),
        }
    }

    /// The substitute for one original value under the configured style.
    pub fn pseudonym_for(&self, label: &str, original: &str) -> Result<String> {
        let token = self.token_for(label);
        match &self.style {
            TokenStyle::Category => Ok(token.into_owned()),
            TokenStyle::Hashed { format } => {
                render(format, label, &token, &short_hash(label, original))
            }
        }
    }

    /// A representative token for a label, used to check that tokens are
    /// not themselves detected by the pattern rules.
    pub fn sample_for(&self, label: &str) -> Result<String> {
        match &self.style {
            TokenStyle::Category => Ok(self.token_for(label).into_owned()),
            TokenStyle::Hashed { format } => {
                render(format, label, &self.token_for(label), &short_hash(label, ""))
            }
        }
    }

    /// What substitutes for a label look like: the token itself, or the
    /// format with `{shorthash}` left unfilled.
    pub fn describe(&self, label: &str) -> String {
        let token = self.token_for(label);
        match &self.style {
            TokenStyle::Category => token.into_owned(),
            TokenStyle::Hashed { format } => {
                render(format, label, &token, "{shorthash}").unwrap_or_else(|_| format.clone())
            }
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}
