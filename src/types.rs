//! Shared types used across all pipeline stages.
//!
//! These types are serialized to JSON between stages (scan → index → check)
//! and must be identical across all three modules.

use serde::{Deserialize, Serialize};

/// A document parsed from a Markdown file in the content root.
///
/// Metadata fields hold *resolved* values: front-matter first, then the
/// directory defaults cascade, then derived fallbacks (title falls back to
/// the humanized slug, date to the filename prefix). The body text itself
/// is not carried — only what later stages need from it (link references
/// and a word count).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the content root, forward slashes.
    pub source_path: String,
    /// URL path segment (filename stem with the date prefix stripped).
    pub slug: String,
    /// Publication date (`YYYY-MM-DD`), from front-matter or the filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Template tag for a downstream renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Title from front-matter, or the humanized slug.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Navigation grouping key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav: Option<String>,
    /// Series membership, as authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    /// Position within the series, as authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_order: Option<i64>,
    /// Ordered category tags. Carried verbatim; no index is derived.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Front-matter keys outside the schema, sorted. Reported by check.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_keys: Vec<String>,
    /// Link and image references extracted from the body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkRef>,
    /// Prose word count of the body (code blocks excluded).
    pub word_count: usize,
}

/// A link or image reference found in a document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRef {
    /// Destination exactly as authored.
    pub url: String,
    pub kind: LinkKind,
    /// 1-based line in the source file (front-matter lines included).
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Link,
    Image,
}

/// A file the scan stage could not turn into a document.
///
/// Skipped files stay in the manifest so `scan` can list them and `check`
/// can fail on them; the rest of the pipeline ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Path relative to the content root, forward slashes.
    pub path: String,
    /// Human-readable reason (missing front-matter, YAML error, ...).
    pub reason: String,
}
