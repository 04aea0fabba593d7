//! Link and image extraction from Markdown bodies, plus URL classification.
//!
//! Extraction walks the Markdown event stream rather than the raw text, so
//! links inside fenced or indented code blocks are never picked up. Raw HTML
//! embedded in the Markdown (`<a href>`, `<img src>`) is scanned with a
//! regex, since the Markdown parser passes HTML through untokenized.
//!
//! Classification decides what the check stage does with each URL:
//! same-page fragments and off-site links are skipped, everything else is
//! normalized to a site-absolute path and verified against the document
//! and asset inventory.

use crate::types::{LinkKind, LinkRef};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

/// Everything the check stage needs from one document body.
#[derive(Debug, Default)]
pub struct BodyScan {
    pub links: Vec<LinkRef>,
    /// Prose words only; code blocks and inline code are not counted.
    pub word_count: usize,
}

/// Walk a Markdown body and collect every link and image reference.
///
/// `body_start_line` is the 1-based line of the source file where the body
/// begins (after the front-matter block), so reported line numbers point
/// into the original file rather than the stripped body.
pub fn scan_body(body: &str, body_start_line: usize) -> BodyScan {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut scan = BodyScan::default();
    let mut in_code_block = false;

    for (event, range) in Parser::new_ext(body, options).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Start(Tag::Link { dest_url, .. }) => {
                scan.links.push(LinkRef {
                    url: dest_url.to_string(),
                    kind: LinkKind::Link,
                    line: line_at(body, range.start, body_start_line),
                });
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                scan.links.push(LinkRef {
                    url: dest_url.to_string(),
                    kind: LinkKind::Image,
                    line: line_at(body, range.start, body_start_line),
                });
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                extract_html_refs(&html, range.start, body, body_start_line, &mut scan.links);
            }
            Event::Text(text) if !in_code_block => {
                scan.word_count += text.split_whitespace().count();
            }
            _ => {}
        }
    }

    scan
}

/// Pull `href` and `src` attributes out of a raw HTML snippet.
fn extract_html_refs(
    html: &str,
    html_offset: usize,
    body: &str,
    body_start_line: usize,
    out: &mut Vec<LinkRef>,
) {
    static HREF_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#).unwrap());
    static SRC_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#).unwrap());

    for (re, kind) in [(&HREF_RE, LinkKind::Link), (&SRC_RE, LinkKind::Image)] {
        for caps in re.captures_iter(html) {
            let m = caps.get(1).unwrap();
            out.push(LinkRef {
                url: m.as_str().to_string(),
                kind,
                line: line_at(body, html_offset + m.start(), body_start_line),
            });
        }
    }
}

/// 1-based source line of a byte offset into the body.
fn line_at(body: &str, offset: usize, body_start_line: usize) -> usize {
    let offset = offset.min(body.len());
    body_start_line + body.as_bytes()[..offset].iter().filter(|b| **b == b'\n').count()
}

// =============================================================================
// Classification
// =============================================================================

/// What the check stage should do with a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    /// Site-local target, normalized to an absolute path. Checked against
    /// the document URL set and the asset inventory.
    Internal(String),
    /// Off-site or scheme'd (`https:`, `mailto:`, protocol-relative). Skipped.
    External,
    /// Same-page anchor or empty href. Skipped.
    Fragment,
}

/// Check if a link carries a scheme (`http:`, `mailto:`, `ftp:`, ...).
#[inline]
pub fn is_external_link(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        link[..pos]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Classify a URL found in the document at `doc_url`.
///
/// When `base_url` is configured, absolute links under that host are folded
/// back into internal paths, so `https://example.com/posts/intro/` and
/// `/posts/intro/` check identically. Relative links resolve against the
/// directory holding the document's source file, so `images/x.png` written
/// next to `posts/intro.md` means `/posts/images/x.png`.
pub fn classify(url: &str, doc_url: &str, base_url: Option<&str>) -> LinkClass {
    if url.is_empty() || url.starts_with('#') {
        return LinkClass::Fragment;
    }
    if url.starts_with("//") {
        return LinkClass::External;
    }
    if let Some(base) = base_url {
        if let Some(rest) = url.strip_prefix(base) {
            if rest.is_empty() {
                return LinkClass::Internal("/".to_string());
            }
            if rest.starts_with('/') {
                return LinkClass::Internal(normalize_target(rest));
            }
        }
    }
    if is_external_link(url) {
        return LinkClass::External;
    }
    if url.starts_with('/') {
        return LinkClass::Internal(normalize_target(url));
    }
    LinkClass::Internal(normalize_target(&resolve_relative(doc_url, url)))
}

/// Resolve a relative URL against the directory holding the document's
/// source file. A document URL's last segment is the document itself
/// (`/posts/intro/` comes from `posts/…-intro.md`), so relative references
/// resolve one level above it, where the file's neighbors live.
fn resolve_relative(doc_url: &str, rel: &str) -> String {
    let dir = doc_url.strip_suffix('/').unwrap_or(doc_url);
    let base = match dir.rfind('/') {
        Some(pos) => &dir[..=pos],
        None => "/",
    };
    format!("{base}{rel}")
}

/// Normalize an internal target for lookup.
///
/// Strips the query and fragment, collapses `.` and `..` segments, and adds
/// a trailing slash when the final segment looks like a page rather than a
/// file (no extension), matching the directory form document URLs use.
pub fn normalize_target(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let had_trailing_slash = path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(seg),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out = String::with_capacity(path.len() + 1);
    for seg in &segments {
        out.push('/');
        out.push_str(seg);
    }
    let last = segments[segments.len() - 1];
    if had_trailing_slash || !last.contains('.') {
        out.push('/');
    }
    out
}
