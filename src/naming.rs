//! Centralized filename parsing for the `YYYY-MM-DD-slug` convention.
//!
//! Document filenames carry an optional date prefix followed by the slug
//! that becomes the URL path segment. This module provides a single parsing
//! function so the scan stage, the cache, and the tests all agree on how a
//! stem splits.
//!
//! ## Display Titles
//!
//! Dashes in the slug are converted to spaces for display. The humanized
//! form is the title fallback when front-matter provides none:
//! - `2014-01-12-understanding-parser-combinators.md` → "understanding parser combinators"
//! - `about.md` → "about"
//!
//! A prefix is only treated as a date when it is shape-valid (`YYYY-MM-DD`
//! with month 1–12 and day 1–31). Anything else stays part of the slug, so
//! `2013-13-99-notes` is just a slug that happens to start with digits.

/// Result of parsing a document file stem like `2014-01-12-my-article`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStem {
    /// Date prefix if present and shape-valid (e.g. `2014-01-12`).
    pub date: Option<String>,
    /// Slug after the date prefix. For undated stems, the full input.
    /// Empty if the stem was a bare date.
    pub slug: String,
    /// Display title: slug with dashes converted to spaces.
    pub display_title: String,
}

/// Parse a file stem following the `YYYY-MM-DD-slug` convention.
///
/// Handles these patterns:
/// - `"2014-01-12-my-article"` → date=Some("2014-01-12"), slug="my-article"
/// - `"2014-01-12"` → date=Some("2014-01-12"), slug=""
/// - `"my-article"` → date=None, slug="my-article"
/// - `"2013-13-99-notes"` → date=None, slug="2013-13-99-notes" (month out of range)
pub fn parse_stem(stem: &str) -> ParsedStem {
    if let Some(date) = leading_date(stem) {
        let rest = &stem[date.len()..];
        let slug = rest.strip_prefix('-').unwrap_or(rest);
        return ParsedStem {
            date: Some(date.to_string()),
            slug: slug.to_string(),
            display_title: humanize(slug),
        };
    }
    ParsedStem {
        date: None,
        slug: stem.to_string(),
        display_title: humanize(stem),
    }
}

/// Convert a slug to its display form: dashes become spaces.
pub fn humanize(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Extract a shape-valid `YYYY-MM-DD` prefix, if the stem starts with one.
///
/// The prefix must be exactly ten characters and either end the stem or be
/// followed by a dash. Month must be 1–12 and day 1–31; no calendar lookup
/// beyond that (the 31st of February is an authoring problem, not ours).
fn leading_date(stem: &str) -> Option<&str> {
    let bytes = stem.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    if bytes.len() > 10 && bytes[10] != b'-' {
        return None;
    }
    // Keeps the slice below on a char boundary for non-ASCII stems.
    if !bytes[..10].iter().all(|b| b.is_ascii_digit() || *b == b'-') {
        return None;
    }
    let candidate = &stem[..10];
    let mut parts = candidate.split('-');
    let year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    year.parse::<u32>().ok()?;
    let m: u32 = month.parse().ok()?;
    let d: u32 = day.parse().ok()?;
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) {
        return None;
    }
    Some(candidate)
}
