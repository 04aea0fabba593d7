//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml` files. Configuration
//! is hierarchical: stock defaults are overridden by user config files at any
//! level of the content tree (root → section → subsection).
//!
//! ## Config File Location
//!
//! Place `config.toml` in the content root and/or any subdirectory:
//!
//! ```text
//! content/
//! ├── config.toml              # Root config (overrides stock defaults)
//! ├── posts/
//! │   ├── config.toml          # Section config (overrides root)
//! │   └── ...
//! └── guides/
//!     └── ...
//! ```
//!
//! Subdirectory configs matter mostly for `[defaults]`: a section can give
//! all of its documents a layout or nav group without repeating the key in
//! every front-matter block.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = ""                  # Shown in scan output headers
//! # base_url = "https://example.com"   # absolute links under this host are internal
//!
//! [content]
//! extensions = ["md", "markdown"]  # Document extensions; everything else is an asset
//!
//! [frontmatter]
//! extra_keys = []             # Allowed front-matter keys beyond the schema
//! layouts = []                # If non-empty, other layouts are check errors
//!
//! [defaults]
//! layout = ""                 # Front-matter fallbacks; empty = unset
//! nav = ""
//!
//! [checks]
//! internal_links = true       # Verify internal links resolve
//! assets = true               # Verify referenced asset files exist
//! require_description = false # Warn on documents without a description
//! ignore_links = []           # URL prefixes exempt from link checking
//!
//! [processing]
//! max_processes = 4           # Max parallel parse workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! # Give everything under this directory a default layout
//! [defaults]
//! layout = "post"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity (title, canonical host).
    pub site: SiteSection,
    /// What counts as a document in the content tree.
    pub content: ContentConfig,
    /// Front-matter schema extensions and layout whitelist.
    pub frontmatter: FrontMatterConfig,
    /// Front-matter fallbacks, cascaded per directory.
    pub defaults: DefaultsConfig,
    /// Which integrity checks run and what they ignore.
    pub checks: ChecksConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "content.extensions must not be empty".into(),
            ));
        }
        for ext in &self.content.extensions {
            if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "content.extensions entry {ext:?} must be a bare extension like \"md\""
                )));
            }
        }
        if let Some(url) = &self.site.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(
                    "site.base_url must start with http:// or https://".into(),
                ));
            }
            if url.ends_with('/') {
                return Err(ConfigError::Validation(
                    "site.base_url must not end with a slash".into(),
                ));
            }
        }
        for key in &self.frontmatter.extra_keys {
            if SCHEMA_KEYS.contains(&key.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "frontmatter.extra_keys contains schema key {key:?}"
                )));
            }
        }
        if let Some(n) = self.processing.max_processes {
            if n > 512 {
                return Err(ConfigError::Validation(
                    "processing.max_processes must be 512 or less".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Front-matter keys the parser types directly.
const SCHEMA_KEYS: &[&str] = &[
    "layout",
    "title",
    "description",
    "nav",
    "seriesId",
    "seriesOrder",
    "categories",
    "date",
];

/// Site identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Display title for scan output headers. Empty = omitted.
    pub title: String,
    /// Canonical site host, e.g. `https://example.com`. Absolute links
    /// under this host are treated as internal by the link check.
    pub base_url: Option<String>,
}

/// What counts as a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// File extensions parsed as documents. Everything else becomes an asset.
    pub extensions: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "markdown".to_string()],
        }
    }
}

impl ContentConfig {
    /// Case-insensitive extension match.
    pub fn matches_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Front-matter schema extensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontMatterConfig {
    /// Keys beyond the schema that are allowed without a warning.
    pub extra_keys: Vec<String>,
    /// Known layout names. Empty disables the layout check; non-empty makes
    /// any other resolved layout a check error.
    pub layouts: Vec<String>,
}

/// Front-matter fallbacks, cascaded per directory. Empty strings mean unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub layout: String,
    pub nav: String,
}

impl DefaultsConfig {
    pub fn layout(&self) -> Option<&str> {
        if self.layout.is_empty() {
            None
        } else {
            Some(&self.layout)
        }
    }

    pub fn nav(&self) -> Option<&str> {
        if self.nav.is_empty() { None } else { Some(&self.nav) }
    }
}

/// Which integrity checks run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChecksConfig {
    /// Verify internal links resolve to a document or an asset.
    pub internal_links: bool,
    /// Verify referenced asset files exist.
    pub assets: bool,
    /// Warn on documents without a description.
    pub require_description: bool,
    /// URL prefixes exempt from link checking (e.g. "/downloads/").
    pub ignore_links: Vec<String>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            internal_links: true,
            assets: true,
            require_description: false,
            ignore_links: Vec::new(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel parse workers.
    /// When absent, null, or zero, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` or `Some(0)` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    match config.max_processes {
        None | Some(0) => cores,
        Some(n) => n.min(cores),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
///
/// Used to resolve a fully-merged config at any point in the directory
/// hierarchy: the scan stage calls this once per directory that carries a
/// `config.toml`, with the parent's merged value as the base.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Anthology Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Config files can be placed at any level of the content tree:
#   content/config.toml           -> root (overrides stock defaults)
#   content/posts/config.toml     -> section (overrides root)
#
# Each level only needs the keys it wants to override. Subdirectory
# configs matter mostly for [defaults]. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Display title for scan output headers.
title = ""

# Canonical site host. Absolute links under this host are treated as
# internal by the link check, e.g. https://example.com/posts/intro/.
# base_url = "https://example.com"

# ---------------------------------------------------------------------------
# Content discovery
# ---------------------------------------------------------------------------
[content]
# File extensions parsed as documents. Everything else in the tree is
# recorded as an asset that links and images may point at.
extensions = ["md", "markdown"]

# ---------------------------------------------------------------------------
# Front-matter schema
# ---------------------------------------------------------------------------
[frontmatter]
# Keys beyond the schema (layout, title, description, nav, seriesId,
# seriesOrder, categories, date) that are allowed without a warning.
extra_keys = []

# Known layout names. Leave empty to disable the layout check; when
# non-empty, any other resolved layout is an error.
layouts = []

# ---------------------------------------------------------------------------
# Front-matter defaults (cascade per directory)
# ---------------------------------------------------------------------------
[defaults]
# Fallbacks for documents that do not set these keys themselves.
# Empty strings mean unset.
layout = ""
nav = ""

# ---------------------------------------------------------------------------
# Integrity checks
# ---------------------------------------------------------------------------
[checks]
# Verify internal links resolve to a document URL or an asset file.
internal_links = true

# Verify referenced asset files exist on disk.
assets = true

# Warn on documents without a description.
require_description = false

# URL prefixes exempt from link checking.
ignore_links = []

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel parse workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
