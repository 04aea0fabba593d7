//! Content discovery and manifest generation.
//!
//! Stage 1 of the anthology pipeline. Walks the content root to discover
//! documents and assets, parses front-matter, and produces a structured
//! manifest that subsequent stages consume.
//!
//! ## Directory Structure
//!
//! The content root is an ordinary directory of Markdown files:
//!
//! ```text
//! content/                                  # Content root
//! ├── config.toml                           # Site configuration (optional)
//! ├── about.md                              # Undated page → /about/
//! ├── posts/
//! │   ├── config.toml                       # Section defaults (optional)
//! │   ├── 2014-01-12-parser-combinators.md  # → /posts/parser-combinators/
//! │   ├── 2014-02-03-recursive-descent.md
//! │   └── images/
//! │       └── grammar.png                   # Asset
//! └── guides/
//!     └── setup.md                          # → /guides/setup/
//! ```
//!
//! ## Naming Conventions
//!
//! - **Document filenames** follow `[YYYY-MM-DD-]slug.md`. The date prefix
//!   is stripped into the document's date; the slug becomes the last URL
//!   segment. Two files in one directory that reduce to the same slug are
//!   a conflict: the first in walk order wins, the rest are skipped.
//! - **Extensions** listed in `[content].extensions` are parsed as
//!   documents; every other file is recorded as an asset.
//! - **Hidden files and directories** (leading dot) are ignored, which also
//!   covers the default temp directory. Keep the output directory outside
//!   the content root.
//!
//! ## Configuration Cascade
//!
//! A `config.toml` may sit in any directory. Walking down the tree, each
//! one merges over its parent's effective config, so a section can set
//! `[defaults]` for all documents beneath it.
//!
//! ## Output
//!
//! Produces a [`Manifest`] containing:
//! - All parsed documents with resolved metadata and extracted links
//! - Files that could not become documents, with the reason
//! - Asset paths
//! - The root site configuration
//!
//! ## Errors
//!
//! Authoring problems never abort the scan: a file with broken or missing
//! front-matter becomes a [`SkippedFile`] entry that the check stage turns
//! into a finding. Hard errors are reserved for the environment — IO
//! failures and invalid `config.toml` files.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::{self, DefaultsConfig, SiteConfig};
use crate::frontmatter;
use crate::links;
use crate::metadata;
use crate::naming;
use crate::types::{Document, SkippedFile};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Config error in {path}: {source}")]
    DirConfig {
        path: PathBuf,
        source: config::ConfigError,
    },
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest not found at {0} (run `scan` first)")]
    ManifestMissing(PathBuf),
}

/// Name of the manifest file within the temp directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Manifest output from the scan stage.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<String>,
    pub config: SiteConfig,
}

/// Scan the content root and parse every document.
///
/// `temp_dir` hosts the parse cache; pass `use_cache = false` to force a
/// full re-parse. Returns the manifest in walk order (lexicographic within
/// each directory) along with cache statistics for the run.
pub fn scan(
    root: &Path,
    temp_dir: &Path,
    use_cache: bool,
) -> Result<(Manifest, CacheStats), ScanError> {
    let root_value = match config::load_raw_config(root)? {
        Some(overlay) => config::merge_toml(config::stock_defaults_value(), overlay),
        None => config::stock_defaults_value(),
    };
    let root_config = config::resolve_config(root_value.clone(), None)?;

    let (doc_files, assets) = collect_files(root, root_value, &root_config)?;

    let cache_manifest = if use_cache {
        CacheManifest::load(temp_dir)
    } else {
        CacheManifest::empty()
    };

    let outcomes: Result<Vec<FileOutcome>, ScanError> = doc_files
        .par_iter()
        .map(|file| parse_file(file, &cache_manifest))
        .collect();

    let mut cache_manifest = cache_manifest;
    let mut stats = CacheStats::default();
    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    let mut live_paths: HashSet<String> = HashSet::new();
    // (directory, slug) -> first source path claiming it.
    let mut seen_slugs: HashMap<(String, String), String> = HashMap::new();

    for outcome in outcomes? {
        match outcome.parsed {
            Ok(document) => {
                live_paths.insert(outcome.rel.clone());
                if outcome.from_cache {
                    stats.hit();
                } else {
                    stats.miss();
                    cache_manifest.insert(
                        outcome.rel.clone(),
                        outcome.source_hash,
                        outcome.params_hash,
                        document.clone(),
                    );
                }

                // Two files in one directory reducing to the same slug would
                // claim the same URL. First in walk order wins.
                let dir = outcome
                    .rel
                    .rsplit_once('/')
                    .map(|(dir, _)| dir)
                    .unwrap_or("")
                    .to_string();
                let key = (dir, document.slug.clone());
                if let Some(first) = seen_slugs.get(&key) {
                    skipped.push(SkippedFile {
                        path: outcome.rel,
                        reason: format!(
                            "slug '{}' is already taken by {}",
                            document.slug, first
                        ),
                    });
                } else {
                    seen_slugs.insert(key, outcome.rel);
                    documents.push(document);
                }
            }
            Err(skip) => skipped.push(skip),
        }
    }

    cache_manifest.retain_paths(&live_paths);
    fs::create_dir_all(temp_dir)?;
    cache_manifest.save(temp_dir)?;

    Ok((
        Manifest {
            documents,
            skipped,
            assets,
            config: root_config,
        },
        stats,
    ))
}

/// A document file waiting to be parsed, with its directory's effective
/// defaults already resolved.
struct DocFile {
    path: PathBuf,
    rel: String,
    defaults: DefaultsConfig,
}

struct FileOutcome {
    rel: String,
    source_hash: String,
    params_hash: String,
    parsed: Result<Document, SkippedFile>,
    from_cache: bool,
}

/// Walk the tree, cascading configs per directory, splitting files into
/// documents and assets.
fn collect_files(
    root: &Path,
    root_value: toml::Value,
    root_config: &SiteConfig,
) -> Result<(Vec<DocFile>, Vec<String>), ScanError> {
    // Effective (raw value, resolved config) per directory. Pre-order walk
    // guarantees a parent is visited before its children.
    let mut dir_state: HashMap<PathBuf, (toml::Value, SiteConfig)> = HashMap::new();
    dir_state.insert(root.to_path_buf(), (root_value, root_config.clone()));

    let mut doc_files = Vec::new();
    let mut assets = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        let path = entry.path();

        if entry.file_type().is_dir() {
            let parent = path.parent().unwrap_or(root);
            let (parent_value, parent_config) = dir_state[parent].clone();
            let state = match load_raw_dir_config(path)? {
                Some(overlay) => {
                    let value = config::merge_toml(parent_value, overlay);
                    let resolved = config::resolve_config(value.clone(), None)
                        .map_err(|source| ScanError::DirConfig {
                            path: path.to_path_buf(),
                            source,
                        })?;
                    (value, resolved)
                }
                None => (parent_value, parent_config),
            };
            dir_state.insert(path.to_path_buf(), state);
            continue;
        }

        if entry.file_name() == "config.toml" {
            continue;
        }

        let rel = rel_string(path, root);
        let parent = path.parent().unwrap_or(root);
        let dir_config = &dir_state[parent].1;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        if dir_config.content.matches_extension(&ext) {
            doc_files.push(DocFile {
                path: path.to_path_buf(),
                rel,
                defaults: dir_config.defaults.clone(),
            });
        } else {
            assets.push(rel);
        }
    }

    Ok((doc_files, assets))
}

fn load_raw_dir_config(path: &Path) -> Result<Option<toml::Value>, ScanError> {
    config::load_raw_config(path).map_err(|source| ScanError::DirConfig {
        path: path.to_path_buf(),
        source,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Hash, cache-check, and parse one document file.
fn parse_file(file: &DocFile, cache_manifest: &CacheManifest) -> Result<FileOutcome, ScanError> {
    let bytes = fs::read(&file.path)?;
    let source_hash = cache::hash_bytes(&bytes);
    let params_hash = cache::hash_parse_params(&file.defaults);

    if let Some(document) = cache_manifest.find_cached(&file.rel, &source_hash, &params_hash) {
        return Ok(FileOutcome {
            rel: file.rel.clone(),
            source_hash,
            params_hash,
            parsed: Ok(document.clone()),
            from_cache: true,
        });
    }

    let parsed = match String::from_utf8(bytes) {
        Ok(text) => parse_document(&text, &file.rel, &file.defaults),
        Err(_) => Err(SkippedFile {
            path: file.rel.clone(),
            reason: "file is not valid UTF-8".to_string(),
        }),
    };

    Ok(FileOutcome {
        rel: file.rel.clone(),
        source_hash,
        params_hash,
        parsed,
        from_cache: false,
    })
}

/// Parse one document's content into a [`Document`] record.
///
/// Resolution order for each metadata field: front-matter first, then the
/// directory defaults, then derived fallbacks (title from the humanized
/// slug, date from the filename prefix).
pub fn parse_document(
    content: &str,
    rel_path: &str,
    defaults: &DefaultsConfig,
) -> Result<Document, SkippedFile> {
    let skip = |reason: String| SkippedFile {
        path: rel_path.to_string(),
        reason,
    };

    let parsed = frontmatter::parse(content).map_err(|e| skip(e.to_string()))?;
    let matter = parsed.matter;

    let stem = Path::new(rel_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let parsed_stem = naming::parse_stem(&stem);
    if parsed_stem.slug.is_empty() {
        return Err(skip(
            "filename has no slug (nothing after the date prefix)".to_string(),
        ));
    }

    let body_scan = links::scan_body(parsed.body, parsed.body_start_line);

    let title = metadata::resolve(&[
        matter.title.as_deref(),
        Some(&parsed_stem.display_title),
    ])
    .unwrap_or_else(|| parsed_stem.slug.clone());

    // Taken before the struct literal moves `matter.categories`.
    let unknown_keys = matter.unknown_keys();

    Ok(Document {
        source_path: rel_path.to_string(),
        slug: parsed_stem.slug,
        date: metadata::resolve(&[matter.date.as_deref()]).or(parsed_stem.date),
        layout: metadata::resolve(&[matter.layout.as_deref(), defaults.layout()]),
        title,
        description: metadata::resolve(&[matter.description.as_deref()]),
        nav: metadata::resolve(&[matter.nav.as_deref(), defaults.nav()]),
        series_id: metadata::resolve(&[matter.series_id.as_deref()]),
        series_order: matter.series_order,
        categories: matter.categories,
        unknown_keys,
        links: body_scan.links,
        word_count: body_scan.word_count,
    })
}

/// Source-relative path with forward slashes, for stable manifests across
/// platforms.
fn rel_string(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// =============================================================================
// Manifest IO
// =============================================================================

/// Write the manifest JSON into the temp directory, creating it if needed.
pub fn write_manifest(manifest: &Manifest, temp_dir: &Path) -> Result<PathBuf, ScanError> {
    fs::create_dir_all(temp_dir)?;
    let path = temp_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Read a manifest previously written by [`write_manifest`].
pub fn read_manifest(temp_dir: &Path) -> Result<Manifest, ScanError> {
    let path = temp_dir.join(MANIFEST_FILENAME);
    if !path.exists() {
        return Err(ScanError::ManifestMissing(path));
    }
    let content = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}
