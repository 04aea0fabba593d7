//! Parse cache for incremental scans.
//!
//! Parsing is cheap per file but adds up: front-matter deserialization plus
//! a full Markdown walk for link extraction, over every document in the
//! tree, on every scan. This module lets the scan stage reuse the parsed
//! record for any file whose content and resolution inputs haven't changed
//! since the last run.
//!
//! # Design
//!
//! The cache is **path-keyed**: entries map the source-relative path to the
//! parsed [`Document`] and the hashes it was produced under. Path-keyed
//! rather than content-addressed because the parse result depends on the
//! path itself — the slug comes from the filename and the URL from the
//! directory chain — so a file moved to a new location must re-parse even
//! when its bytes are identical.
//!
//! A cache hit requires both hashes to match:
//!
//! - **`source_hash`**: SHA-256 of the file contents. Content-based rather
//!   than mtime-based so it survives `git checkout` (which resets
//!   modification times).
//!
//! - **`params_hash`**: SHA-256 of everything outside the file that feeds
//!   resolution — the effective `[defaults]` for the file's directory.
//!   Editing a section's `config.toml` re-parses that section and leaves
//!   the rest of the tree cached.
//!
//! ## Storage
//!
//! The cache manifest is a JSON file at `<temp_dir>/.cache-manifest.json`,
//! alongside the scan manifest, so clearing the temp directory clears both.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `scan` or `build` to force a full re-parse. This
//! loads an empty manifest, so every file is parsed fresh.

use crate::config::DefaultsConfig;
use crate::types::Document;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the temp directory.
const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or the parse output changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached parse result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
    pub document: Document,
}

/// On-disk cache manifest mapping source-relative paths to parse results.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or a first scan).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the temp directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(temp_dir: &Path) -> Self {
        let path = temp_dir.join(MANIFEST_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(),
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest
    }

    /// Save to the temp directory.
    pub fn save(&self, temp_dir: &Path) -> io::Result<()> {
        let path = temp_dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Look up a cached parse result.
    ///
    /// Returns `Some(document)` only when an entry exists for this path and
    /// both the source and params hashes match what the caller computed.
    pub fn find_cached(
        &self,
        rel_path: &str,
        source_hash: &str,
        params_hash: &str,
    ) -> Option<&Document> {
        let entry = self.entries.get(rel_path)?;
        if entry.source_hash == source_hash && entry.params_hash == params_hash {
            Some(&entry.document)
        } else {
            None
        }
    }

    /// Record a parse result for a source file.
    pub fn insert(
        &mut self,
        rel_path: String,
        source_hash: String,
        params_hash: String,
        document: Document,
    ) {
        self.entries.insert(
            rel_path,
            CacheEntry {
                source_hash,
                params_hash,
                document,
            },
        );
    }

    /// Drop entries for files that no longer exist in the tree, keeping the
    /// manifest from growing across renames and deletions.
    pub fn retain_paths(&mut self, live: &std::collections::HashSet<String>) {
        self.entries.retain(|path, _| live.contains(path));
    }
}

/// SHA-256 hash of a byte buffer, returned as a hex string.
///
/// The scan stage reads each source file once and feeds the same bytes to
/// the hash and the parser, so this takes the buffer rather than a path.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)
}

/// SHA-256 hash of the resolution inputs for one file.
///
/// Inputs: the effective directory defaults (layout, nav). If the cascade
/// produces different defaults for this file, the hash changes and the
/// file is re-parsed.
pub fn hash_parse_params(defaults: &DefaultsConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"parse\0");
    hasher.update(defaults.layout.as_bytes());
    hasher.update(b"\0");
    hasher.update(defaults.nav.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a scan run.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} parsed ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} parsed", self.misses)
        }
    }
}

/// Resolve the cache manifest path for a temp directory.
pub fn manifest_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(MANIFEST_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn doc(slug: &str) -> Document {
        Document {
            slug: slug.to_string(),
            title: slug.to_string(),
            ..Document::default()
        }
    }

    // =========================================================================
    // CacheManifest basics
    // =========================================================================

    #[test]
    fn empty_manifest_has_no_entries() {
        let m = CacheManifest::empty();
        assert_eq!(m.version, MANIFEST_VERSION);
        assert!(m.entries.is_empty());
    }

    #[test]
    fn find_cached_hit() {
        let mut m = CacheManifest::empty();
        m.insert("posts/a.md".into(), "src123".into(), "prm456".into(), doc("a"));

        let found = m.find_cached("posts/a.md", "src123", "prm456");
        assert_eq!(found.map(|d| d.slug.as_str()), Some("a"));
    }

    #[test]
    fn find_cached_miss_wrong_source_hash() {
        let mut m = CacheManifest::empty();
        m.insert("a.md".into(), "hash_a".into(), "params".into(), doc("a"));

        assert_eq!(m.find_cached("a.md", "hash_b", "params"), None);
    }

    #[test]
    fn find_cached_miss_wrong_params_hash() {
        let mut m = CacheManifest::empty();
        m.insert("a.md".into(), "hash".into(), "params_a".into(), doc("a"));

        assert_eq!(m.find_cached("a.md", "hash", "params_b"), None);
    }

    #[test]
    fn find_cached_miss_no_entry() {
        let m = CacheManifest::empty();
        assert_eq!(m.find_cached("a.md", "h", "p"), None);
    }

    #[test]
    fn same_content_at_new_path_misses() {
        // The slug and URL come from the path, so a moved file re-parses.
        let mut m = CacheManifest::empty();
        m.insert("old/a.md".into(), "src".into(), "prm".into(), doc("a"));

        assert_eq!(m.find_cached("new/a.md", "src", "prm"), None);
    }

    #[test]
    fn insert_overwrites_existing_path() {
        let mut m = CacheManifest::empty();
        m.insert("a.md".into(), "h1".into(), "p".into(), doc("one"));
        m.insert("a.md".into(), "h2".into(), "p".into(), doc("two"));

        assert_eq!(m.entries.len(), 1);
        let found = m.find_cached("a.md", "h2", "p");
        assert_eq!(found.map(|d| d.slug.as_str()), Some("two"));
    }

    #[test]
    fn retain_paths_drops_deleted_files() {
        let mut m = CacheManifest::empty();
        m.insert("keep.md".into(), "h".into(), "p".into(), doc("keep"));
        m.insert("gone.md".into(), "h".into(), "p".into(), doc("gone"));

        let live: HashSet<String> = ["keep.md".to_string()].into_iter().collect();
        m.retain_paths(&live);

        assert!(m.entries.contains_key("keep.md"));
        assert!(!m.entries.contains_key("gone.md"));
    }

    // =========================================================================
    // Save / Load roundtrip
    // =========================================================================

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("x.md".into(), "s1".into(), "p1".into(), doc("x"));
        m.insert("y.md".into(), "s2".into(), "p2".into(), doc("y"));

        m.save(tmp.path()).unwrap();
        let loaded = CacheManifest::load(tmp.path());

        assert_eq!(loaded.version, MANIFEST_VERSION);
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries["x.md"].source_hash, "s1");
        assert_eq!(loaded.entries["x.md"].document.slug, "x");
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let m = CacheManifest::load(tmp.path());
        assert!(m.entries.is_empty());
    }

    #[test]
    fn load_corrupt_json_returns_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MANIFEST_FILENAME), "not json").unwrap();
        let m = CacheManifest::load(tmp.path());
        assert!(m.entries.is_empty());
    }

    #[test]
    fn load_wrong_version_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let json = format!(r#"{{"version": {}, "entries": {{}}}}"#, MANIFEST_VERSION + 1);
        fs::write(tmp.path().join(MANIFEST_FILENAME), json).unwrap();
        let m = CacheManifest::load(tmp.path());
        assert!(m.entries.is_empty());
    }

    // =========================================================================
    // Hash functions
    // =========================================================================

    #[test]
    fn hash_bytes_deterministic() {
        let h1 = hash_bytes(b"hello world");
        let h2 = hash_bytes(b"hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64); // SHA-256 hex is 64 chars
    }

    #[test]
    fn hash_bytes_changes_with_content() {
        assert_ne!(hash_bytes(b"version 1"), hash_bytes(b"version 2"));
    }

    #[test]
    fn hash_parse_params_deterministic() {
        let defaults = DefaultsConfig {
            layout: "post".into(),
            nav: "articles".into(),
        };
        assert_eq!(hash_parse_params(&defaults), hash_parse_params(&defaults));
    }

    #[test]
    fn hash_parse_params_varies_with_layout() {
        let a = DefaultsConfig {
            layout: "post".into(),
            nav: String::new(),
        };
        let b = DefaultsConfig {
            layout: "page".into(),
            nav: String::new(),
        };
        assert_ne!(hash_parse_params(&a), hash_parse_params(&b));
    }

    #[test]
    fn hash_parse_params_fields_do_not_collide() {
        // layout="x" nav="" vs layout="" nav="x" must hash differently.
        let a = DefaultsConfig {
            layout: "x".into(),
            nav: String::new(),
        };
        let b = DefaultsConfig {
            layout: String::new(),
            nav: "x".into(),
        };
        assert_ne!(hash_parse_params(&a), hash_parse_params(&b));
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_display_with_hits() {
        let mut s = CacheStats::default();
        s.hits = 5;
        s.misses = 2;
        assert_eq!(format!("{}", s), "5 cached, 2 parsed (7 total)");
    }

    #[test]
    fn cache_stats_display_no_hits() {
        let mut s = CacheStats::default();
        s.misses = 3;
        assert_eq!(format!("{}", s), "3 parsed");
    }
}
