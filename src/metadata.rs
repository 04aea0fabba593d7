//! Document metadata resolution.
//!
//! Each metadata field on a document can come from several independent
//! sources:
//!
//! - **Front-matter**: the authored value in the document's YAML block.
//! - **Directory defaults**: the `[defaults]` table of the merged config
//!   chain for the document's directory (`layout` and `nav` only).
//! - **Derived fallbacks**: the title falls back to the humanized slug,
//!   the date to the filename prefix.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first non-empty value wins:
//!
//! - **title**: front-matter → humanized slug
//! - **layout**: front-matter → directory default → None
//! - **nav**: front-matter → directory default → None
//! - **description**: front-matter → None
//! - **date**: front-matter → filename prefix → None
//!
//! The rationale: the author's own words beat mechanical derivation, and a
//! value typed into one document beats a directory-wide default. Empty and
//! whitespace-only strings count as absent, so `nav: ""` in front-matter
//! does not shadow a directory default.
//!
//! ## Slug canonical form
//!
//! Slugs become URL path segments. The canonical form is lowercase
//! `[a-z0-9-]` with no repeated, leading, or trailing dashes, capped at a
//! length that keeps URLs and filenames sane. Scan never rewrites an
//! authored slug — the check stage reports non-canonical ones instead,
//! using [`sanitize_slug`] as the reference form.

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed. This is the core merge operation
/// behind every resolved field on a Document.
///
/// ```text
/// title:  resolve(&[matter_title, Some(&humanized_slug)])
/// layout: resolve(&[matter_layout, default_layout])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

const MAX_SLUG_LEN: usize = 80;

/// Reduce a string to the canonical slug form.
///
/// - Lowercases ASCII letters
/// - Replaces non-alphanumeric characters (except dashes) with dashes
/// - Collapses consecutive dashes into one
/// - Strips leading and trailing dashes
/// - Truncates to `MAX_SLUG_LEN` characters (breaks at last dash before limit)
pub fn sanitize_slug(raw: &str) -> String {
    let slug: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    // Collapse consecutive dashes
    let mut collapsed = String::with_capacity(slug.len());
    let mut prev_dash = false;
    for c in slug.chars() {
        if c == '-' {
            if !prev_dash {
                collapsed.push('-');
            }
            prev_dash = true;
        } else {
            collapsed.push(c);
            prev_dash = false;
        }
    }

    // Strip leading/trailing dashes
    let trimmed = collapsed.trim_matches('-');

    // Truncate at word boundary (last dash before limit)
    if trimmed.len() <= MAX_SLUG_LEN {
        trimmed.to_string()
    } else {
        let truncated = &trimmed[..MAX_SLUG_LEN];
        match truncated.rfind('-') {
            Some(pos) => truncated[..pos].to_string(),
            None => truncated.to_string(),
        }
    }
}

/// Whether a slug is already in canonical form.
pub fn is_canonical_slug(slug: &str) -> bool {
    !slug.is_empty() && sanitize_slug(slug) == slug
}
