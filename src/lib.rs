//! # Anthology
//!
//! A build and lint pipeline for repositories of Markdown articles. Your
//! filesystem is the data source: Markdown files with YAML front-matter
//! become documents, directories become URL paths, and filename date
//! prefixes become publication dates.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Anthology processes content through three independent stages, each
//! producing an artifact that the next stage consumes:
//!
//! ```text
//! 1. Scan    content/          →  manifest.json   (filesystem → structured documents)
//! 2. Index   manifest          →  index.json      (series, navigation, URLs)
//! 3. Check   manifest + index  →  findings        (content integrity report)
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Debuggability**: each artifact is human-readable JSON you can inspect.
//! - **Incremental builds**: the parse cache re-parses only changed documents.
//! - **Testability**: index and check are pure functions over the manifest,
//!   so unit tests can exercise pipeline logic without touching the
//!   filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the content tree, parses front-matter, produces the manifest |
//! | [`index`] | Stage 2: derives URLs, series with next/previous links, and navigation groups |
//! | [`check`] | Stage 3: evaluates every integrity rule into a findings report |
//! | [`config`] | Hierarchical `config.toml` loading, validation, and merging |
//! | [`frontmatter`] | YAML front-matter splitting and schema parsing |
//! | [`links`] | Markdown body scanning and link classification |
//! | [`cache`] | Parse cache keyed by source path and content hash |
//! | [`types`] | Shared records serialized between stages (`Document`, `LinkRef`) |
//! | [`naming`] | `[YYYY-MM-DD-]slug` filename convention parser |
//! | [`metadata`] | Field resolution across front-matter and directory defaults |
//! | [`output`] | CLI output formatting for every stage |
//!
//! # Design Decisions
//!
//! ## Findings, Not Failures
//!
//! One broken document must not hide every other problem in the tree. Scan
//! records files with malformed front-matter as skipped entries and keeps
//! going; check turns them into error findings alongside everything else it
//! found, so a single run reports the whole repair list. Hard errors are
//! reserved for the environment: IO failures and invalid `config.toml`
//! files.
//!
//! ## Code Fences Never Leak Links
//!
//! Bodies are scanned with `pulldown-cmark`'s event stream rather than
//! regexes over raw text, so a tutorial can show `[link](...)` syntax
//! inside a fenced code block without tripping the link checker. Embedded
//! HTML is the one place regexes run (`href=`/`src=` extraction), because
//! the event stream hands HTML through as opaque text.
//!
//! ## Path-Keyed Parse Cache
//!
//! Parsing is pure per file, so results are cached by relative path with
//! two SHA-256 guards: the file bytes and the parse parameters (the
//! directory's effective defaults). Changing either re-parses exactly the
//! affected documents. A version-mismatched or corrupt cache is discarded
//! wholesale rather than migrated.
//!
//! ## Config Cascading (Root → Section)
//!
//! Configuration files at any level of the directory tree override their
//! parent:
//!
//! ```text
//! content/config.toml            ← root (overrides stock defaults)
//! content/posts/config.toml      ← section (overrides root)
//! ```
//!
//! Authors want per-section defaults (a `layout` for all posts, a `nav`
//! group for all guides) without repeating them in every file. The merge
//! logic lives in [`config::merge_toml`].
//!
//! ## Date-Prefix Filenames
//!
//! `2014-01-12-types-intro.md` carries its publication date and URL slug in
//! the filename, parsed by [`naming::parse_stem`]. Front-matter `date:`
//! overrides the prefix. URLs are built from directories and slug only, so
//! re-dating a post never breaks its links. The filesystem is the source of
//! truth; no database and no separate ordering file.
//!
//! ## Stops at the Renderer's Doorstep
//!
//! `index.json` is the complete contract a downstream renderer needs:
//! per-document URL and metadata, series members in reading order with
//! `prev`/`next` wiring, and navigation groups. Producing HTML is a
//! different tool's job. Keeping rendering out keeps the artifacts
//! inspectable and the integrity checks fast enough to run on every edit.

pub mod cache;
pub mod check;
pub mod config;
pub mod frontmatter;
pub mod index;
pub mod links;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
