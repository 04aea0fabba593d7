//! Site index generation.
//!
//! Stage 2 of the anthology pipeline. Takes the manifest from the scan
//! stage and derives everything that relates documents to each other:
//!
//! - **URLs**: each document's path in the published site, built from its
//!   directory chain and slug (`posts/2014-01-12-intro.md` → `/posts/intro/`).
//! - **Series**: documents sharing a `seriesId`, sorted into reading order
//!   by `seriesOrder`, with previous/next neighbor links for each member.
//! - **Navigation groups**: documents sharing a `nav` key, for menu
//!   rendering.
//! - **Diagnostics**: duplicate orders, members without an order, orders
//!   without a series, and URL collisions. Recorded here where the
//!   relationships are computed; the check stage turns them into findings.
//!
//! Everything in the output is deterministically ordered — documents by
//! URL, series by id, members by `(order, slug)` — so `index.json` diffs
//! cleanly between runs.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! └── index.json        # SiteIndex: documents, series, nav groups
//! ```

use crate::config::SiteConfig;
use crate::naming;
use crate::scan::Manifest;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Index not found at {0} (run `index` first)")]
    IndexMissing(PathBuf),
}

/// Name of the index file within the output directory.
pub const INDEX_FILENAME: &str = "index.json";

/// The derived site index, written as `index.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteIndex {
    /// Every document, sorted by URL.
    pub documents: Vec<IndexedDocument>,
    /// Every series, sorted by id, members in reading order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<Series>,
    /// Navigation groups keyed by the `nav` front-matter value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nav_groups: Vec<NavGroup>,
    /// Two or more members of one series claiming the same order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_conflicts: Vec<OrderConflict>,
    /// Series members without a `seriesOrder`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_order: Vec<MissingOrder>,
    /// Documents with a `seriesOrder` but no `seriesId` (source paths).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dangling_order: Vec<String>,
    /// Distinct source files mapping to the same URL.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url_conflicts: Vec<UrlConflict>,
    pub config: SiteConfig,
}

/// One document as seen by a renderer: URL, display metadata, and its
/// position within a series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub url: String,
    pub slug: String,
    pub title: String,
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_order: Option<i64>,
    /// Link to the previous document in the series, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<DocLink>,
    /// Link to the next document in the series, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<DocLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// A series of documents in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    /// Display title: the humanized id (`thinking-in-types` → "thinking in types").
    pub title: String,
    /// Ordered members first (by order, slug), then members without an
    /// order (by slug). The unordered tail is outside the neighbor chain.
    pub members: Vec<SeriesMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMember {
    pub slug: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Two or more members of one series claiming the same order value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConflict {
    pub series_id: String,
    pub order: i64,
    /// Source paths of the clashing members, sorted.
    pub source_paths: Vec<String>,
}

/// A series member without a `seriesOrder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingOrder {
    pub series_id: String,
    pub source_path: String,
}

/// Distinct source files producing the same URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlConflict {
    pub url: String,
    pub source_paths: Vec<String>,
}

/// A navigation menu group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavGroup {
    pub name: String,
    /// Links in `(date, slug)` order, undated documents first.
    pub links: Vec<DocLink>,
}

/// A titled link to a document. Used for navigation entries and for the
/// `prev`/`next` neighbor references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocLink {
    pub url: String,
    pub title: String,
}

/// A document's URL: its directory chain plus the slug, directory-style.
pub fn document_url(source_path: &str, slug: &str) -> String {
    let mut url = String::from("/");
    if let Some(parent) = Path::new(source_path).parent() {
        for comp in parent.components() {
            url.push_str(&comp.as_os_str().to_string_lossy());
            url.push('/');
        }
    }
    url.push_str(slug);
    url.push('/');
    url
}

/// Derive the site index from a scan manifest.
pub fn build_index(manifest: &Manifest) -> SiteIndex {
    let docs = &manifest.documents;
    let urls: Vec<String> = docs
        .iter()
        .map(|d| document_url(&d.source_path, &d.slug))
        .collect();

    let url_conflicts = find_url_conflicts(docs, &urls);

    // Group by series id, collecting orphaned order values along the way.
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut dangling_order = Vec::new();
    for (i, doc) in docs.iter().enumerate() {
        match &doc.series_id {
            Some(id) => groups.entry(id).or_default().push(i),
            None => {
                if doc.series_order.is_some() {
                    dangling_order.push(doc.source_path.clone());
                }
            }
        }
    }
    dangling_order.sort();

    let mut series = Vec::new();
    let mut order_conflicts = Vec::new();
    let mut missing_order = Vec::new();
    // Neighbor links per document index, filled in per series.
    let mut neighbors: HashMap<usize, (Option<DocLink>, Option<DocLink>)> = HashMap::new();

    for (id, indices) in &groups {
        let mut ordered: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| docs[i].series_order.is_some())
            .collect();
        let mut unordered: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| docs[i].series_order.is_none())
            .collect();

        // Reading order: by order value, slug as the deterministic tiebreak.
        ordered.sort_by(|&a, &b| {
            (docs[a].series_order, &docs[a].slug).cmp(&(docs[b].series_order, &docs[b].slug))
        });
        unordered.sort_by(|&a, &b| docs[a].slug.cmp(&docs[b].slug));

        record_order_conflicts(docs, id, &ordered, &mut order_conflicts);
        for &i in &unordered {
            missing_order.push(MissingOrder {
                series_id: id.to_string(),
                source_path: docs[i].source_path.clone(),
            });
        }

        // Neighbor chain over the ordered members only.
        for (pos, &i) in ordered.iter().enumerate() {
            let prev = pos.checked_sub(1).map(|p| doc_link(docs, &urls, ordered[p]));
            let next = ordered.get(pos + 1).map(|&n| doc_link(docs, &urls, n));
            neighbors.insert(i, (prev, next));
        }

        let members = ordered
            .iter()
            .chain(unordered.iter())
            .map(|&i| SeriesMember {
                slug: docs[i].slug.clone(),
                url: urls[i].clone(),
                title: docs[i].title.clone(),
                order: docs[i].series_order,
            })
            .collect();

        series.push(Series {
            id: id.to_string(),
            title: naming::humanize(id),
            members,
        });
    }

    let nav_groups = build_nav_groups(docs, &urls);

    let mut documents: Vec<IndexedDocument> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let (prev, next) = neighbors.get(&i).cloned().unwrap_or((None, None));
            IndexedDocument {
                url: urls[i].clone(),
                slug: doc.slug.clone(),
                title: doc.title.clone(),
                source_path: doc.source_path.clone(),
                date: doc.date.clone(),
                description: doc.description.clone(),
                layout: doc.layout.clone(),
                nav: doc.nav.clone(),
                series_id: doc.series_id.clone(),
                series_order: doc.series_order,
                prev,
                next,
                categories: doc.categories.clone(),
            }
        })
        .collect();
    documents.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.source_path.cmp(&b.source_path)));

    SiteIndex {
        documents,
        series,
        nav_groups,
        order_conflicts,
        missing_order,
        dangling_order,
        url_conflicts,
        config: manifest.config.clone(),
    }
}

fn doc_link(docs: &[Document], urls: &[String], i: usize) -> DocLink {
    DocLink {
        url: urls[i].clone(),
        title: docs[i].title.clone(),
    }
}

fn find_url_conflicts(docs: &[Document], urls: &[String]) -> Vec<UrlConflict> {
    let mut by_url: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (doc, url) in docs.iter().zip(urls) {
        by_url.entry(url).or_default().push(&doc.source_path);
    }
    by_url
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(url, mut paths)| {
            paths.sort();
            UrlConflict {
                url: url.to_string(),
                source_paths: paths.into_iter().map(String::from).collect(),
            }
        })
        .collect()
}

fn record_order_conflicts(
    docs: &[Document],
    series_id: &str,
    ordered: &[usize],
    out: &mut Vec<OrderConflict>,
) {
    let mut by_order: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
    for &i in ordered {
        if let Some(order) = docs[i].series_order {
            by_order.entry(order).or_default().push(&docs[i].source_path);
        }
    }
    for (order, mut paths) in by_order {
        if paths.len() > 1 {
            paths.sort();
            out.push(OrderConflict {
                series_id: series_id.to_string(),
                order,
                source_paths: paths.into_iter().map(String::from).collect(),
            });
        }
    }
}

/// Group documents by their `nav` value. Links within a group are sorted by
/// `(date, slug)`, undated documents first.
fn build_nav_groups(docs: &[Document], urls: &[String]) -> Vec<NavGroup> {
    let mut by_nav: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, doc) in docs.iter().enumerate() {
        if let Some(nav) = &doc.nav {
            by_nav.entry(nav).or_default().push(i);
        }
    }
    by_nav
        .into_iter()
        .map(|(name, mut members)| {
            members.sort_by(|&a, &b| {
                (&docs[a].date, &docs[a].slug).cmp(&(&docs[b].date, &docs[b].slug))
            });
            NavGroup {
                name: name.to_string(),
                links: members
                    .into_iter()
                    .map(|i| doc_link(docs, urls, i))
                    .collect(),
            }
        })
        .collect()
}

// =============================================================================
// Index IO
// =============================================================================

/// Write the index JSON into the output directory, creating it if needed.
pub fn write_index(index: &SiteIndex, output_dir: &Path) -> Result<PathBuf, IndexError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(INDEX_FILENAME);
    let json = serde_json::to_string_pretty(index)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Read an index previously written by [`write_index`].
pub fn read_index(output_dir: &Path) -> Result<SiteIndex, IndexError> {
    let path = output_dir.join(INDEX_FILENAME);
    if !path.exists() {
        return Err(IndexError::IndexMissing(path));
    }
    let content = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}
