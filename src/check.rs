//! Integrity checks over the scanned and indexed content.
//!
//! Stage 3 of the anthology pipeline. Consumes the scan manifest and the
//! site index and produces a [`Report`] of findings. Nothing here touches
//! the filesystem — both inputs are complete snapshots — so the rules are
//! plain functions over data and the stage is trivially testable.
//!
//! ## Errors (fail the build)
//!
//! - Files whose front-matter could not be parsed
//! - Duplicate `seriesOrder` values within one series
//! - Two source files producing the same URL
//! - Internal links that resolve to no document or asset
//! - Image references that resolve to no asset
//! - Layouts outside the configured `[frontmatter].layouts` list
//!
//! ## Warnings (reported, build still passes)
//!
//! - Series members without a `seriesOrder`
//! - A `seriesOrder` without a `seriesId`
//! - Series with a single member
//! - Front-matter keys outside the schema and `[frontmatter].extra_keys`
//! - Slugs that are not in canonical form
//! - Missing descriptions (only with `[checks] require_description = true`)
//!
//! Link and asset checking can be disabled per site through `[checks]`;
//! `ignore_links` prefixes exempt known-special URLs from checking.

use crate::index::{self, SiteIndex};
use crate::links::{self, LinkClass};
use crate::metadata;
use crate::scan::Manifest;
use crate::types::LinkKind;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One problem found in the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Source path the finding is about (relative to the content root).
    pub path: String,
    /// 1-based source line, where the rule has one (link findings do).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}: {}", self.path, line, self.severity, self.message),
            None => write!(f, "{}: {}: {}", self.path, self.severity, self.message),
        }
    }
}

/// The full set of findings for one check run, sorted by path then line so
/// the report reads file by file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Report {
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn error(&mut self, path: &str, line: Option<usize>, message: String) {
        self.findings.push(Finding {
            severity: Severity::Error,
            path: path.to_string(),
            line,
            message,
        });
    }

    fn warning(&mut self, path: &str, line: Option<usize>, message: String) {
        self.findings.push(Finding {
            severity: Severity::Warning,
            path: path.to_string(),
            line,
            message,
        });
    }
}

/// Run every check over a manifest and its index.
pub fn run(manifest: &Manifest, index: &SiteIndex) -> Report {
    let mut report = Report::default();
    let config = &manifest.config;

    for skip in &manifest.skipped {
        report.error(&skip.path, None, skip.reason.clone());
    }

    check_series(index, &mut report);
    check_urls(index, &mut report);
    check_links(manifest, index, &mut report);
    check_metadata(manifest, &mut report);

    if !config.frontmatter.layouts.is_empty() {
        check_layouts(manifest, &mut report);
    }

    report.findings.sort_by(|a, b| {
        (&a.path, a.line, a.severity, &a.message).cmp(&(&b.path, b.line, b.severity, &b.message))
    });
    report
}

fn check_series(index: &SiteIndex, report: &mut Report) {
    for conflict in &index.order_conflicts {
        report.error(
            &conflict.source_paths[0],
            None,
            format!(
                "series '{}' uses order {} more than once: {}",
                conflict.series_id,
                conflict.order,
                conflict.source_paths.join(", ")
            ),
        );
    }
    for missing in &index.missing_order {
        report.warning(
            &missing.source_path,
            None,
            format!("member of series '{}' has no seriesOrder", missing.series_id),
        );
    }
    for path in &index.dangling_order {
        report.warning(path, None, "seriesOrder without a seriesId".to_string());
    }

    // Singleton series: probably a typo in the id or a series-to-be.
    let source_by_url: HashMap<&str, &str> = index
        .documents
        .iter()
        .map(|d| (d.url.as_str(), d.source_path.as_str()))
        .collect();
    for series in &index.series {
        if series.members.len() == 1 {
            let member = &series.members[0];
            let path = source_by_url
                .get(member.url.as_str())
                .copied()
                .unwrap_or(member.slug.as_str());
            report.warning(
                path,
                None,
                format!("series '{}' has a single member", series.id),
            );
        }
    }
}

fn check_urls(index: &SiteIndex, report: &mut Report) {
    for conflict in &index.url_conflicts {
        report.error(
            &conflict.source_paths[0],
            None,
            format!(
                "URL {} is produced by multiple files: {}",
                conflict.url,
                conflict.source_paths.join(", ")
            ),
        );
    }
}

fn check_links(manifest: &Manifest, index: &SiteIndex, report: &mut Report) {
    let config = &manifest.config;
    if !config.checks.internal_links && !config.checks.assets {
        return;
    }

    let mut targets: HashSet<&str> = index.documents.iter().map(|d| d.url.as_str()).collect();
    // The site root always exists, whatever renders it.
    targets.insert("/");

    let asset_urls: HashSet<String> = manifest
        .assets
        .iter()
        .map(|rel| format!("/{rel}"))
        .collect();

    let base_url = config.site.base_url.as_deref();

    for doc in &manifest.documents {
        let doc_url = index::document_url(&doc.source_path, &doc.slug);
        for link in &doc.links {
            if config
                .checks
                .ignore_links
                .iter()
                .any(|prefix| link.url.starts_with(prefix.as_str()))
            {
                continue;
            }
            let target = match links::classify(&link.url, &doc_url, base_url) {
                LinkClass::Internal(target) => target,
                LinkClass::External | LinkClass::Fragment => continue,
            };
            if targets.contains(target.as_str()) || asset_urls.contains(&target) {
                continue;
            }

            let mut message = match link.kind {
                LinkKind::Link => {
                    if !config.checks.internal_links {
                        continue;
                    }
                    format!("broken internal link: {}", link.url)
                }
                LinkKind::Image => {
                    if !config.checks.assets {
                        continue;
                    }
                    format!("missing image asset: {}", link.url)
                }
            };
            if target != link.url {
                message.push_str(&format!(" (resolves to {target})"));
            }
            report.error(&doc.source_path, Some(link.line), message);
        }
    }
}

fn check_metadata(manifest: &Manifest, report: &mut Report) {
    let config = &manifest.config;
    let allowed: HashSet<&str> = config
        .frontmatter
        .extra_keys
        .iter()
        .map(String::as_str)
        .collect();

    for doc in &manifest.documents {
        for key in &doc.unknown_keys {
            if !allowed.contains(key.as_str()) {
                report.warning(
                    &doc.source_path,
                    None,
                    format!("unknown front-matter key '{key}'"),
                );
            }
        }

        if !metadata::is_canonical_slug(&doc.slug) {
            report.warning(
                &doc.source_path,
                None,
                format!(
                    "slug '{}' is not canonical (suggest '{}')",
                    doc.slug,
                    metadata::sanitize_slug(&doc.slug)
                ),
            );
        }

        if config.checks.require_description && doc.description.is_none() {
            report.warning(&doc.source_path, None, "missing description".to_string());
        }
    }
}

fn check_layouts(manifest: &Manifest, report: &mut Report) {
    let config = &manifest.config;
    let known: HashSet<&str> = config
        .frontmatter
        .layouts
        .iter()
        .map(String::as_str)
        .collect();

    for doc in &manifest.documents {
        if let Some(layout) = &doc.layout {
            if !known.contains(layout.as_str()) {
                report.error(
                    &doc.source_path,
                    None,
                    format!(
                        "unknown layout '{}' (known: {})",
                        layout,
                        config.frontmatter.layouts.join(", ")
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::scan::scan;
    use crate::test_helpers::*;
    use crate::types::Document;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn check_tree(root: &Path) -> Report {
        let temp = TempDir::new().unwrap();
        let (manifest, _) = scan(root, temp.path(), false).unwrap();
        let index = build_index(&manifest);
        run(&manifest, &index)
    }

    fn messages(report: &Report) -> Vec<&str> {
        report.findings.iter().map(|f| f.message.as_str()).collect()
    }

    // =========================================================================
    // Clean tree
    // =========================================================================

    #[test]
    fn sample_site_is_clean() {
        let tmp = setup_sample_site();
        let report = check_tree(tmp.path());
        assert!(report.is_clean(), "unexpected findings: {:?}", report.findings);
    }

    #[test]
    fn findings_sort_by_path_then_line() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "b.md", "author: me", "x\n");
        write_doc(tmp.path(), "a.md", "", "See [gone](/nowhere/).\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        // File-by-file order, not severity order.
        assert_eq!(report.findings[0].path, "a.md");
        assert_eq!(report.findings[0].severity, Severity::Error);
        assert_eq!(report.findings[1].path, "b.md");
        assert_eq!(report.findings[1].severity, Severity::Warning);
    }

    // =========================================================================
    // Skipped files
    // =========================================================================

    #[test]
    fn skipped_file_becomes_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("plain.md"), "no front-matter\n").unwrap();

        let report = check_tree(tmp.path());
        assert!(report.has_errors());
        assert_eq!(report.findings[0].path, "plain.md");
    }

    // =========================================================================
    // Series rules
    // =========================================================================

    #[test]
    fn duplicate_order_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "seriesId: s\nseriesOrder: 1", "x\n");
        write_doc(tmp.path(), "b.md", "seriesId: s\nseriesOrder: 1", "x\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
        assert!(messages(&report)[0].contains("order 1 more than once"));
        // Singleton warning must not fire for a two-member series.
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn missing_order_is_a_warning() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "seriesId: s\nseriesOrder: 1", "x\n");
        write_doc(tmp.path(), "b.md", "seriesId: s", "x\n");

        let report = check_tree(tmp.path());
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.findings[0].path, "b.md");
        assert!(messages(&report)[0].contains("no seriesOrder"));
    }

    #[test]
    fn dangling_order_is_a_warning() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "odd.md", "seriesOrder: 2", "x\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.warning_count(), 1);
        assert!(messages(&report)[0].contains("without a seriesId"));
    }

    #[test]
    fn singleton_series_is_a_warning() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "only.md", "seriesId: solo\nseriesOrder: 1", "x\n");

        let report = check_tree(tmp.path());
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.findings[0].path, "only.md");
        assert!(messages(&report)[0].contains("single member"));
    }

    // =========================================================================
    // URL conflicts
    // =========================================================================

    #[test]
    fn url_conflict_is_an_error() {
        // Scan skips same-directory slug collisions at walk time, so a
        // conflicting pair can only arrive via a hand-edited manifest.
        let manifest = Manifest {
            documents: vec![
                Document {
                    source_path: "posts/2014-01-01-intro.md".into(),
                    slug: "intro".into(),
                    title: "A".into(),
                    ..Default::default()
                },
                Document {
                    source_path: "posts/2015-06-01-intro.md".into(),
                    slug: "intro".into(),
                    title: "B".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let report = run(&manifest, &build_index(&manifest));
        assert_eq!(report.error_count(), 1);
        assert!(messages(&report)[0].contains("URL /posts/intro/"));
        assert!(messages(&report)[0].contains("multiple files"));
    }

    // =========================================================================
    // Link rules
    // =========================================================================

    #[test]
    fn broken_internal_link_is_an_error_with_line() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "title: A", "Line one.\n\nSee [gone](/nowhere/).\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.path, "a.md");
        // Front-matter is three lines, body starts at 4, link is on body line 3.
        assert_eq!(finding.line, Some(6));
        assert!(finding.message.contains("/nowhere/"));
    }

    #[test]
    fn link_to_existing_document_is_fine() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "", "See [b](/b/).\n");
        write_doc(tmp.path(), "b.md", "", "x\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn relative_link_resolved_from_source_directory() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "posts/a.md", "", "See [b](../guides/b/).\n");
        write_doc(tmp.path(), "guides/b.md", "", "x\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean(), "findings: {:?}", report.findings);
    }

    #[test]
    fn broken_relative_link_reports_resolved_target() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "posts/a.md", "", "See [b](../gone/).\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
        assert!(messages(&report)[0].contains("resolves to /gone/"));
    }

    #[test]
    fn missing_image_asset_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "posts/a.md", "", "![pic](images/gone.png)\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
        assert!(messages(&report)[0].starts_with("missing image asset"));
    }

    #[test]
    fn present_asset_resolves() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "posts/a.md", "", "![pic](images/here.png)\n");
        fs::create_dir_all(tmp.path().join("posts/images")).unwrap();
        fs::write(tmp.path().join("posts/images/here.png"), b"png").unwrap();

        let report = check_tree(tmp.path());
        assert!(report.is_clean(), "findings: {:?}", report.findings);
    }

    #[test]
    fn external_links_are_not_checked() {
        let tmp = TempDir::new().unwrap();
        write_doc(
            tmp.path(),
            "a.md",
            "",
            "[out](https://example.org/) and [mail](mailto:x@y.z) and [frag](#below).\n",
        );

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn base_url_folds_absolute_links_into_internal() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[site]\nbase_url = \"https://example.com\"\n",
        )
        .unwrap();
        write_doc(
            tmp.path(),
            "a.md",
            "",
            "Good: [b](https://example.com/b/). Bad: [c](https://example.com/c/).\n",
        );
        write_doc(tmp.path(), "b.md", "", "x\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
        assert!(messages(&report)[0].contains("example.com/c/"));
    }

    #[test]
    fn ignored_prefixes_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[checks]\nignore_links = [\"/downloads/\"]\n",
        )
        .unwrap();
        write_doc(tmp.path(), "a.md", "", "[get](/downloads/tool.zip)\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn link_check_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[checks]\ninternal_links = false\n",
        )
        .unwrap();
        write_doc(tmp.path(), "a.md", "", "[gone](/nowhere/)\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn asset_check_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[checks]\nassets = false\n").unwrap();
        write_doc(tmp.path(), "a.md", "", "![gone](images/x.png)\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn site_root_link_always_resolves() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "", "[home](/)\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    // =========================================================================
    // Metadata rules
    // =========================================================================

    #[test]
    fn unknown_key_is_a_warning() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "title: A\nauthor: me", "x\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.warning_count(), 1);
        assert!(messages(&report)[0].contains("'author'"));
    }

    #[test]
    fn extra_keys_allowlist_suppresses_warning() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[frontmatter]\nextra_keys = [\"author\"]\n",
        )
        .unwrap();
        write_doc(tmp.path(), "a.md", "title: A\nauthor: me", "x\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn non_canonical_slug_is_a_warning() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "My_Notes.md", "title: Notes", "x\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.warning_count(), 1);
        assert!(messages(&report)[0].contains("not canonical"));
        assert!(messages(&report)[0].contains("my-notes"));
    }

    #[test]
    fn missing_description_warns_only_when_required() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "title: A", "x\n");
        let report = check_tree(tmp.path());
        assert!(report.is_clean());

        fs::write(
            tmp.path().join("config.toml"),
            "[checks]\nrequire_description = true\n",
        )
        .unwrap();
        let report = check_tree(tmp.path());
        assert_eq!(report.warning_count(), 1);
        assert!(messages(&report)[0].contains("missing description"));
    }

    // =========================================================================
    // Layout rules
    // =========================================================================

    #[test]
    fn unknown_layout_is_an_error_when_layouts_configured() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[frontmatter]\nlayouts = [\"post\", \"page\"]\n",
        )
        .unwrap();
        write_doc(tmp.path(), "a.md", "layout: fancy", "x\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
        assert!(messages(&report)[0].contains("'fancy'"));
    }

    #[test]
    fn known_layout_passes() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[frontmatter]\nlayouts = [\"post\"]\n",
        )
        .unwrap();
        write_doc(tmp.path(), "a.md", "layout: post", "x\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn layouts_unchecked_when_list_empty() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", "layout: anything", "x\n");

        let report = check_tree(tmp.path());
        assert!(report.is_clean());
    }

    #[test]
    fn layout_from_defaults_is_also_checked() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[frontmatter]\nlayouts = [\"page\"]\n\n[defaults]\nlayout = \"post\"\n",
        )
        .unwrap();
        write_doc(tmp.path(), "a.md", "", "x\n");

        let report = check_tree(tmp.path());
        assert_eq!(report.error_count(), 1);
    }
}
