//! Front-matter parsing for Markdown documents.
//!
//! A document opens with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! layout: post
//! title: "Understanding type inference"
//! seriesId: thinking-in-types
//! seriesOrder: 2
//! categories: [types, inference]
//! ---
//! Body text…
//! ```
//!
//! The opening fence must be the first line of the file (a UTF-8 BOM is
//! tolerated). Everything between the fences is YAML; everything after the
//! closing fence is the body. Schema keys are typed here; keys outside the
//! schema are collected rather than rejected, so the check stage can report
//! them with their names instead of failing the parse.
//!
//! Splitting and parsing are separate so callers keep borrowed access to
//! the body slice and its position in the file — link findings need real
//! source line numbers, and the body starts several lines down.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("missing front-matter block (file must start with ---)")]
    Missing,
    #[error("unterminated front-matter block (no closing ---)")]
    Unclosed,
    #[error("invalid front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Front-matter exactly as authored, before the defaults cascade.
///
/// Field names mirror the on-disk schema (`seriesId`, `seriesOrder` are
/// camelCase in the files). `extra` catches everything else.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrontMatter {
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nav: Option<String>,
    #[serde(default, rename = "seriesId")]
    pub series_id: Option<String>,
    #[serde(default, rename = "seriesOrder")]
    pub series_order: Option<i64>,
    /// Accepts both a YAML sequence and a single bare string.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub categories: Vec<String>,
    /// Overrides the filename date prefix.
    #[serde(default)]
    pub date: Option<String>,
    /// Keys outside the schema, preserved for the unknown-key check.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl RawFrontMatter {
    /// Names of authored keys outside the schema, sorted.
    pub fn unknown_keys(&self) -> Vec<String> {
        self.extra.keys().cloned().collect()
    }
}

/// A split and parsed document, borrowing the body from the source text.
#[derive(Debug)]
pub struct Parsed<'a> {
    pub matter: RawFrontMatter,
    pub body: &'a str,
    /// 1-based line of the source file where the body begins.
    pub body_start_line: usize,
}

/// Split the fences and parse the YAML between them.
pub fn parse(content: &str) -> Result<Parsed<'_>, FrontMatterError> {
    let (yaml, body, body_offset) = split(content)?;
    // An empty block is legal and means "no metadata".
    let matter: RawFrontMatter = if yaml.trim().is_empty() {
        RawFrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    let body_start_line = 1 + newlines_before(content, body_offset);
    Ok(Parsed {
        matter,
        body,
        body_start_line,
    })
}

/// Split `content` into (yaml, body, body byte offset).
///
/// The opening fence must be the very first line; the closing fence is the
/// next line consisting of `---`. A later `---` in the body (a thematic
/// break) is never reached because the first closing fence wins.
fn split(content: &str) -> Result<(&str, &str, usize), FrontMatterError> {
    let stripped = content.strip_prefix('\u{feff}').unwrap_or(content);
    let bom_len = content.len() - stripped.len();

    let after_open = stripped.strip_prefix("---").ok_or(FrontMatterError::Missing)?;
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
        .ok_or(FrontMatterError::Missing)?;
    let yaml_offset = bom_len + (stripped.len() - after_open.len());

    let (yaml_len, body_rel) = find_close(after_open).ok_or(FrontMatterError::Unclosed)?;
    let yaml = &after_open[..yaml_len];
    let body = &after_open[body_rel..];
    Ok((yaml, body, yaml_offset + body_rel))
}

/// Locate the closing fence inside the text that follows the opening fence.
///
/// Returns (yaml length, body start), both relative to the input. The fence
/// must start a line and be followed by a line break or end of file.
fn find_close(s: &str) -> Option<(usize, usize)> {
    // Empty block: the closing fence is the first line.
    if let Some(rest) = s.strip_prefix("---") {
        if let Some(skip) = line_break_len(rest) {
            return Some((0, 3 + skip));
        }
    }
    let mut from = 0;
    while let Some(pos) = s[from..].find("\n---") {
        let idx = from + pos;
        let after = &s[idx + 4..];
        if let Some(skip) = line_break_len(after) {
            return Some((idx + 1, idx + 4 + skip));
        }
        from = idx + 1;
    }
    None
}

/// Length of a leading line break, or 0 at end of input. `None` means the
/// next character continues the line (so `---foo` is not a fence).
fn line_break_len(s: &str) -> Option<usize> {
    if s.is_empty() {
        Some(0)
    } else if s.starts_with("\r\n") {
        Some(2)
    } else if s.starts_with('\n') {
        Some(1)
    } else {
        None
    }
}

fn newlines_before(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(OneOrMany::One(s)) => Ok(vec![s]),
        Some(OneOrMany::Many(v)) => Ok(v),
    }
}
