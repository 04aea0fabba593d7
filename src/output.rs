//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (document, series, navigation group) is its semantic
//! identity, the title plus a positional index, with filesystem paths shown
//! as secondary context via indented `Source:` lines. This makes the output
//! readable as a content inventory while still letting authors trace every
//! entry back to a specific file.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Documents
//! 001 About (24 words)
//!     Source: about.md
//!
//! posts/
//! 001 Types: an introduction (310 words)
//!     Source: 2014-01-12-types-intro.md
//!     Date: 2014-01-12
//!     Series: thinking-in-types #1
//!     Why static types help you think.
//!
//! Assets
//!     posts/images/lattice.png
//!
//! Scanned 2 documents, 1 assets, 0 skipped
//! 1 cached, 1 parsed (2 total)
//! ```
//!
//! ## Index
//!
//! ```text
//! 001 About → /about/
//! 002 Types: an introduction → /posts/types-intro/
//! 003 Types: inference → /posts/types-inference/
//!
//! Series
//! 001 thinking in types (2 parts)
//!     001 Types: an introduction → /posts/types-intro/
//!     002 Types: inference → /posts/types-inference/
//!
//! Navigation
//!     001 articles (2 links)
//!
//! Indexed 3 documents, 1 series
//! ```
//!
//! ## Check
//!
//! ```text
//! about.md: warning: unknown front-matter key 'author'
//! posts/2014-01-12-types-intro.md:9: error: broken internal link: /posts/types-inferrence/
//!
//! Found 1 errors, 1 warnings
//! ```
//!
//! A clean tree prints `==> Content is valid` instead.
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure, no I/O, no side effects.

use crate::cache::CacheStats;
use crate::check::Report;
use crate::index::SiteIndex;
use crate::scan::Manifest;
use crate::types::Document;
use std::collections::BTreeMap;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format an entity header: positional index + title, with an optional
/// count-and-noun detail.
///
/// ```text
/// 001 Thinking in types (3 parts)
/// 002 About
/// ```
fn entity_header(index: usize, title: &str, count: Option<(usize, &str)>) -> String {
    match count {
        Some((n, noun)) => format!("{} {} ({} {})", format_index(index), title, n, noun),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Truncate text to at most `max` bytes, appending `...` if truncated.
/// The cut backs up to a char boundary so multi-byte text never splits
/// mid-character.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output showing the discovered content inventory,
/// grouped by directory.
///
/// Information-first: each document leads with its positional index (within
/// its directory) and title. Source filename, date, series membership, and
/// a description preview are shown as indented context lines.
pub fn format_scan_output(manifest: &Manifest, stats: &CacheStats) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Documents".to_string());

    // BTreeMap puts the root group ("") first, then directories by name.
    let mut by_dir: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
    for doc in &manifest.documents {
        let dir = doc
            .source_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("");
        by_dir.entry(dir).or_default().push(doc);
    }

    for (dir, docs) in &by_dir {
        if !dir.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}/", dir));
        }
        for (i, doc) in docs.iter().enumerate() {
            let filename = doc
                .source_path
                .rsplit_once('/')
                .map(|(_, name)| name)
                .unwrap_or(&doc.source_path);
            lines.push(entity_header(
                i + 1,
                &doc.title,
                Some((doc.word_count, "words")),
            ));
            lines.push(format!("    Source: {}", filename));

            if let Some(ref date) = doc.date {
                lines.push(format!("    Date: {}", date));
            }

            if let Some(ref id) = doc.series_id {
                match doc.series_order {
                    Some(order) => lines.push(format!("    Series: {} #{}", id, order)),
                    None => lines.push(format!("    Series: {}", id)),
                }
            }

            // Description preview (truncated)
            if let Some(ref desc) = doc.description {
                let preview = truncate_desc(desc.trim(), 60);
                if !preview.is_empty() {
                    lines.push(format!("    {}", preview));
                }
            }
        }
    }

    if !manifest.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &manifest.assets {
            lines.push(format!("    {}", asset));
        }
    }

    if !manifest.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skip in &manifest.skipped {
            lines.push(format!("    {}: {}", skip.path, skip.reason));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Scanned {} documents, {} assets, {} skipped",
        manifest.documents.len(),
        manifest.assets.len(),
        manifest.skipped.len()
    ));
    lines.push(stats.to_string());

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest, stats: &CacheStats) {
    for line in format_scan_output(manifest, stats) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Index output
// ============================================================================

/// Format index stage output showing every document's URL plus the derived
/// series and navigation structure.
///
/// Information-first: each entity leads with its positional index and title,
/// followed by `→` and the URL it resolves to.
pub fn format_index_output(index: &SiteIndex) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, doc) in index.documents.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            doc.title,
            doc.url
        ));
    }

    if !index.series.is_empty() {
        lines.push(String::new());
        lines.push("Series".to_string());
        for (i, series) in index.series.iter().enumerate() {
            lines.push(entity_header(
                i + 1,
                &series.title,
                Some((series.members.len(), "parts")),
            ));
            for (j, member) in series.members.iter().enumerate() {
                lines.push(format!(
                    "    {} {} \u{2192} {}",
                    format_index(j + 1),
                    member.title,
                    member.url
                ));
            }
        }
    }

    if !index.nav_groups.is_empty() {
        lines.push(String::new());
        lines.push("Navigation".to_string());
        for (i, group) in index.nav_groups.iter().enumerate() {
            lines.push(format!(
                "    {} {} ({} links)",
                format_index(i + 1),
                group.name,
                group.links.len()
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Indexed {} documents, {} series",
        index.documents.len(),
        index.series.len()
    ));

    lines
}

/// Print index output to stdout.
pub fn print_index_output(index: &SiteIndex) {
    for line in format_index_output(index) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Check output
// ============================================================================

/// Format check stage output listing findings in compiler style.
///
/// Findings arrive pre-sorted by path then line, so the report reads file
/// by file. A clean report collapses to a single line.
pub fn format_check_output(report: &Report) -> Vec<String> {
    if report.is_clean() {
        return vec!["==> Content is valid".to_string()];
    }

    let mut lines = Vec::new();
    for finding in &report.findings {
        lines.push(finding.to_string());
    }
    lines.push(String::new());
    lines.push(format!(
        "Found {} errors, {} warnings",
        report.error_count(),
        report.warning_count()
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &Report) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
