//! Shared test utilities for the anthology test suite.
//!
//! Provides fixture builders, lookup helpers, and series assertions that
//! work with the pipeline data structures (`Manifest`, `SiteIndex`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_sample_site();
//! let temp = TempDir::new().unwrap();
//! let (manifest, _) = scan(tmp.path(), temp.path(), false).unwrap();
//! let index = build_index(&manifest);
//!
//! let doc = find_document(&manifest, "types-intro");
//! assert_eq!(doc.series_order, Some(1));
//!
//! assert_series_shape(&index, &[
//!     ("thinking-in-types", &["types-intro", "types-inference", "types-variance"]),
//! ]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::index::{IndexedDocument, Series, SiteIndex};
use crate::scan::Manifest;
use crate::types::Document;

// =========================================================================
// Fixture builders
// =========================================================================

/// Write a document file with front-matter fences around `front`.
///
/// `front` is the raw YAML without fences; pass `""` for an empty block.
/// Parent directories are created as needed.
pub fn write_doc(root: &Path, rel: &str, front: &str, body: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let front = front.trim_end();
    let content = if front.is_empty() {
        format!("---\n---\n{body}")
    } else {
        format!("---\n{front}\n---\n{body}")
    };
    fs::write(path, content).unwrap();
}

/// Build a small but complete content tree in a temp directory.
///
/// The layout exercises every pipeline feature: a three-part series with
/// cross-links, an undated page, a section with its own defaults, and an
/// asset referenced by one of the posts.
pub fn setup_sample_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    fs::write(
        root.join("config.toml"),
        "[site]\ntitle = \"Field Notes\"\n\n[defaults]\nlayout = \"post\"\n",
    )
    .unwrap();

    write_doc(
        root,
        "about.md",
        "title: About\nnav: top\nlayout: page",
        "This site collects programming notes.\n",
    );

    write_doc(
        root,
        "posts/2014-01-12-types-intro.md",
        "title: \"Types: an introduction\"\n\
         description: Why type systems earn their keep\n\
         nav: articles\n\
         seriesId: thinking-in-types\n\
         seriesOrder: 1",
        "Start here, then read [inference](/posts/types-inference/).\n\
         \n\
         ![lattice](images/lattice.png)\n",
    );

    write_doc(
        root,
        "posts/2014-02-03-types-inference.md",
        "title: Type inference\n\
         description: How compilers fill in the blanks\n\
         nav: articles\n\
         seriesId: thinking-in-types\n\
         seriesOrder: 2",
        "Back to [the introduction](/posts/types-intro/).\n",
    );

    write_doc(
        root,
        "posts/2014-03-10-types-variance.md",
        "title: Variance\n\
         description: Co, contra, and in between\n\
         nav: articles\n\
         seriesId: thinking-in-types\n\
         seriesOrder: 3",
        "The last part of the series.\n",
    );

    fs::create_dir_all(root.join("posts/images")).unwrap();
    fs::write(root.join("posts/images/lattice.png"), b"\x89PNG").unwrap();

    fs::create_dir_all(root.join("guides")).unwrap();
    fs::write(
        root.join("guides/config.toml"),
        "[defaults]\nnav = \"guides\"\n",
    )
    .unwrap();
    write_doc(
        root,
        "guides/setup.md",
        "title: Setup guide",
        "Install the toolchain first.\n",
    );

    tmp
}

// =========================================================================
// Manifest lookups — panics with a clear message on miss
// =========================================================================

/// Find a document by slug. Panics if not found.
pub fn find_document<'a>(manifest: &'a Manifest, slug: &str) -> &'a Document {
    manifest
        .documents
        .iter()
        .find(|d| d.slug == slug)
        .unwrap_or_else(|| {
            let slugs = doc_slugs(manifest);
            panic!("document '{slug}' not found. Available: {slugs:?}")
        })
}

/// All document slugs in manifest order.
pub fn doc_slugs(manifest: &Manifest) -> Vec<&str> {
    manifest.documents.iter().map(|d| d.slug.as_str()).collect()
}

// =========================================================================
// Index lookups
// =========================================================================

/// Find an indexed document by slug. Panics if not found.
pub fn find_entry<'a>(index: &'a SiteIndex, slug: &str) -> &'a IndexedDocument {
    index
        .documents
        .iter()
        .find(|d| d.slug == slug)
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = index.documents.iter().map(|d| d.slug.as_str()).collect();
            panic!("indexed document '{slug}' not found. Available: {slugs:?}")
        })
}

/// Find a series by id. Panics if not found.
pub fn find_series<'a>(index: &'a SiteIndex, id: &str) -> &'a Series {
    index.series.iter().find(|s| s.id == id).unwrap_or_else(|| {
        let ids: Vec<&str> = index.series.iter().map(|s| s.id.as_str()).collect();
        panic!("series '{id}' not found. Available: {ids:?}")
    })
}

/// All indexed URLs in index order.
pub fn entry_urls(index: &SiteIndex) -> Vec<&str> {
    index.documents.iter().map(|d| d.url.as_str()).collect()
}

/// Assert that the series table matches an expected shape.
///
/// Each entry is `(series id, member slugs in reading order)`.
///
/// ```rust
/// assert_series_shape(&index, &[
///     ("thinking-in-types", &["types-intro", "types-inference"]),
/// ]);
/// ```
pub fn assert_series_shape(index: &SiteIndex, expected: &[(&str, &[&str])]) {
    let actual_ids: Vec<&str> = index.series.iter().map(|s| s.id.as_str()).collect();
    let expected_ids: Vec<&str> = expected.iter().map(|(id, _)| *id).collect();
    assert_eq!(actual_ids, expected_ids, "series ids mismatch");

    for (id, slugs) in expected {
        let series = find_series(index, id);
        let actual: Vec<&str> = series.members.iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(actual, slugs.to_vec(), "members of series '{id}' mismatch");
    }
}
