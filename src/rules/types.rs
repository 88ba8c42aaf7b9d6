//! Rule system types: keys, tiers, documents and resolution outcomes.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};

/// Identifier of a rule document, e.g. `technology/csharp/coding-standards`.
///
/// A key has at least two non-empty `/`-separated segments. Beyond that
/// shape it is an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleKey(String);

impl RuleKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize(raw);
        let normalized = normalized.as_str();

        let invalid = |reason| RuleError::InvalidKey {
            key: raw.to_string(),
            reason,
        };

        if normalized.is_empty() {
            return Err(invalid("key is empty"));
        }

        let mut segments = 0;
        for segment in normalized.split('/') {
            match segment {
                "" => return Err(invalid("key contains an empty segment")),
                "." | ".." => return Err(invalid("key contains a relative segment")),
                _ => segments += 1,
            }
        }

        if segments < 2 {
            return Err(invalid("key must have the form category/name"));
        }

        Ok(Self(normalized.to_string()))
    }

    /// Build a key from a path relative to a rules root, dropping the file extension.
    pub(crate) fn from_relative_path(path: &Path) -> Result<Self> {
        let stem = path.with_extension("");
        let mut segments = Vec::new();
        for component in stem.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                _ => {
                    return Err(RuleError::InvalidKey {
                        key: path.display().to_string(),
                        reason: "path is not relative to the rules root",
                    });
                }
            }
        }
        Self::parse(&segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Last segment of the key.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(self.0.as_str())
    }

    pub fn category(&self) -> RuleCategory {
        let mut segments = self.segments();
        let first = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();

        match first {
            "general" => RuleCategory::General,
            "shared" => RuleCategory::Shared,
            "technology" if rest.len() >= 2 => RuleCategory::Technology(rest[0].to_string()),
            other => RuleCategory::Other(other.to_string()),
        }
    }

    /// Whether this key lives under `prefix`, matching whole segments only.
    ///
    /// `technology/c` matches `technology/c/style` but not `technology/csharp/style`.
    pub fn in_namespace(&self, prefix: &str) -> bool {
        self.in_normalized_namespace(&normalize(prefix))
    }

    /// [`in_namespace`](Self::in_namespace) for a prefix already passed through [`normalize`].
    pub(crate) fn in_normalized_namespace(&self, prefix: &str) -> bool {
        if prefix.is_empty() || self.0 == prefix {
            return true;
        }
        self.0
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Normalize a key or key prefix: trim whitespace, use `/` separators and
/// drop leading and trailing slashes.
pub(crate) fn normalize(raw: &str) -> String {
    raw.trim().replace('\\', "/").trim_matches('/').to_string()
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RuleKey {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RuleKey {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RuleKey> for String {
    fn from(key: RuleKey) -> Self {
        key.0
    }
}

impl Borrow<str> for RuleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RuleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Namespacing label derived from the first key segment(s).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// `general/...`
    General,
    /// `technology/<tech>/...`
    Technology(String),
    /// `shared/...`
    Shared,
    /// Any other namespace.
    Other(String),
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("general"),
            Self::Technology(tech) => write!(f, "technology/{}", tech),
            Self::Shared => f.write_str("shared"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Which store a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Base,
    Override,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Override => "override",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort metadata read from a document. Never required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleMetadata {
    /// Extract metadata from YAML frontmatter, falling back to the first `# ` heading.
    ///
    /// Malformed frontmatter is ignored.
    pub fn from_content(content: &str) -> Self {
        #[derive(Deserialize)]
        struct Frontmatter {
            #[serde(default)]
            title: Option<String>,
            #[serde(default)]
            description: Option<String>,
        }

        let mut metadata = Self::default();
        let mut body = content;

        if let Some((frontmatter, rest)) = split_frontmatter(content) {
            if let Ok(fm) = serde_yaml_bw::from_str::<Frontmatter>(frontmatter) {
                metadata.title = fm.title;
                metadata.description = fm.description;
            }
            body = rest;
        }

        if metadata.title.is_none() {
            metadata.title = body
                .lines()
                .find_map(|line| line.strip_prefix("# "))
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty());
        }

        metadata
    }
}

/// Split a leading `---` block from the body. The block closes on a line that
/// is exactly `---`, or at end of input when that line is last.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// A loaded rule document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDocument {
    key: RuleKey,
    tier: Tier,
    source: String,
    #[serde(flatten)]
    metadata: RuleMetadata,
    content: String,
}

impl RuleDocument {
    pub fn new(key: RuleKey, tier: Tier, source: impl Into<String>, content: String) -> Self {
        Self {
            metadata: RuleMetadata::from_content(&content),
            key,
            tier,
            source: source.into(),
            content,
        }
    }

    pub fn key(&self) -> &RuleKey {
        &self.key
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Where the document was read from (file path or bundle label).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    /// Raw text exactly as loaded.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn category(&self) -> RuleCategory {
        self.key.category()
    }
}

/// Outcome of resolving one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a RuleDocument),
    NotFound(RuleKey),
}

impl<'a> Resolution<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn tier(&self) -> Option<Tier> {
        self.document().map(RuleDocument::tier)
    }

    pub fn document(&self) -> Option<&'a RuleDocument> {
        match self {
            Self::Found(doc) => Some(doc),
            Self::NotFound(_) => None,
        }
    }

    /// Convert into the document, turning absence into [`RuleError::NotFound`].
    pub fn into_document(self) -> Result<&'a RuleDocument> {
        match self {
            Self::Found(doc) => Ok(doc),
            Self::NotFound(key) => Err(RuleError::NotFound(key)),
        }
    }
}

/// Entry of the effective catalog: which tier wins for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry<'a> {
    pub key: &'a RuleKey,
    pub tier: Tier,
    /// True when an override document hides a base document.
    pub shadows_base: bool,
}

/// Ordered collection of resolved rules, plus the keys that resolved to nothing.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRules<'a> {
    rules: Vec<&'a RuleDocument>,
    missing: Vec<RuleKey>,
}

impl<'a> ResolvedRules<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resolution: Resolution<'a>) {
        match resolution {
            Resolution::Found(doc) => {
                if !self.rules.iter().any(|r| r.key() == doc.key()) {
                    self.rules.push(doc);
                }
            }
            Resolution::NotFound(key) => {
                if !self.missing.contains(&key) {
                    self.missing.push(key);
                }
            }
        }
    }

    pub fn rules(&self) -> &[&'a RuleDocument] {
        &self.rules
    }

    pub fn missing(&self) -> &[RuleKey] {
        &self.missing
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Render all found rules as one Markdown document.
    ///
    /// `max_chars` bounds the total rule content; the rule that crosses the
    /// limit is cut on a char boundary and rendering stops with a marker line.
    pub fn to_prompt(&self, max_chars: usize) -> String {
        if self.rules.is_empty() {
            return String::new();
        }

        let mut prompt = String::with_capacity(
            self.rules
                .iter()
                .map(|r| r.content().len())
                .sum::<usize>()
                .min(max_chars.saturating_mul(4)),
        );
        prompt.push_str("# Applicable Rules\n\n");

        let mut remaining = max_chars;
        for rule in &self.rules {
            let len = rule.content().chars().count();
            if len > remaining {
                if remaining > 0 {
                    prompt.push_str(&format!("## {} ({})\n", rule.key(), rule.tier()));
                    prompt.extend(rule.content().chars().take(remaining));
                    prompt.push_str("\n\n");
                }
                prompt.push_str("[truncated]\n");
                break;
            }

            prompt.push_str(&format!("## {} ({})\n", rule.key(), rule.tier()));
            prompt.push_str(rule.content());
            prompt.push_str("\n\n");
            remaining -= len;
        }

        prompt
    }
}
