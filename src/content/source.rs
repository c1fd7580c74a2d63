//! Content sources and bundles.
//!
//! A [`ContentSource`] is the parsed representation of one source file (or
//! a fabricated stand-in for a missing index). Sources are keyed by their
//! relative path and linked to parents, children, and tag terms by path,
//! never by reference, so the cyclic page graph stays lookup-based.

use crate::content::front_matter::{FrontMatter, ParamValue};
use crate::content::kind::Kind;
use crate::log;
use crate::utils::date;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Index file name for leaf bundles.
pub const LEAF_INDEX: &str = "index.md";
/// Index file name for branch bundles.
pub const BRANCH_INDEX: &str = "_index.md";

/// How a source's directory is treated during resource discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BundleType {
    /// Standalone file, no attached resources.
    #[default]
    None,
    /// `index.md`: every sibling file is a resource, `.md` included.
    Leaf,
    /// `_index.md`: siblings are resources except other `.md` files.
    Branch,
}

impl BundleType {
    /// Classify an index file name; non-index files are `None`.
    pub fn from_file_name(name: &str) -> Self {
        match name {
            LEAF_INDEX => Self::Leaf,
            BRANCH_INDEX => Self::Branch,
            _ => Self::None,
        }
    }
}

/// Is this relative path a bundle index file?
pub fn is_index_file(path: &str) -> bool {
    let name = file_name(path);
    name == LEAF_INDEX || name == BRANCH_INDEX
}

/// Last path component of a relative source path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File stem of a relative source path (`blog/post1.md` → `post1`).
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    name.strip_suffix(".md").unwrap_or(name)
}

/// Directory part of a relative source path (`""` for root files).
pub fn dir_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Section name: the first directory component of a relative path.
pub fn section_of(path: &str) -> &str {
    path.split_once('/').map_or("", |(first, _)| first)
}

/// A discovered bundle file (image, PDF, ...) attached to a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Path relative to the content root, used to read/copy the bytes.
    pub rel_path: String,
    /// Public URL, derived from the owning page's permalink directory.
    pub rel_permalink: String,
    /// File name within the bundle.
    pub name: String,
    pub title: Option<String>,
    pub params: BTreeMap<String, ParamValue>,
}

/// One parsed source file plus its graph links.
#[derive(Debug, Clone, Default)]
pub struct ContentSource {
    /// Relative source path; unique key in the source table.
    pub path: String,
    pub front: FrontMatter,
    pub raw_content: String,
    pub bundle: BundleType,
    pub kind: Kind,
    /// Parent source path; a lookup relation, not an ownership edge.
    pub parent: Option<String>,
    /// Child source paths, insertion-ordered and duplicate-free.
    pub children: Vec<String>,
    /// Term source paths this content is tagged into.
    pub tag_terms: Vec<String>,
    /// Bundle resources, filled on first post-process.
    pub resources: Vec<Resource>,
    /// Resource discovery already ran for this source.
    pub resources_scanned: bool,
    /// Ids of produced pages in the site arena; empty until expansion.
    pub pages: Vec<usize>,
}

impl ContentSource {
    pub fn new(path: impl Into<String>, front: FrontMatter, raw: String) -> Self {
        let path = path.into();
        let bundle = BundleType::from_file_name(file_name(&path));
        Self {
            path,
            front,
            raw_content: raw,
            bundle,
            ..Default::default()
        }
    }

    /// Fabricate a system source for a directory without an index file.
    pub fn system(path: impl Into<String>, kind: Kind) -> Self {
        let mut source = Self::new(path, FrontMatter::default(), String::new());
        source.kind = kind;
        source
    }

    /// Add a child path, keeping the set duplicate-free.
    pub fn add_child(&mut self, child: &str) {
        if self.children.iter().all(|c| c != child) {
            self.children.push(child.to_string());
        }
    }

    /// Record the term source this content was linked under.
    pub fn add_tag_term(&mut self, term_path: &str) {
        if self.tag_terms.iter().all(|t| t != term_path) {
            self.tag_terms.push(term_path.to_string());
        }
    }

    pub fn is_index(&self) -> bool {
        is_index_file(&self.path)
    }

    /// Date gate: not expired (unless building expired content) and
    /// already publishable (unless building future content).
    pub fn is_date_valid(&self, now: DateTime<Utc>, future: bool, expired: bool) -> bool {
        let front = &self.front;
        if !expired && date::is_expired(front.expiry_date, now) {
            return false;
        }
        if !future && !date::is_publishable(front.publish_date, front.date, now) {
            return false;
        }
        true
    }

    /// Full validity gate for page materialization.
    pub fn is_valid(&self, now: DateTime<Utc>, drafts: bool, future: bool, expired: bool) -> bool {
        if self.front.draft && !drafts {
            return false;
        }
        self.is_date_valid(now, future, expired)
    }

    /// Discover bundle resources on disk.
    ///
    /// `permalink_dir` is the owning page's permalink directory; each
    /// resource's URL is that directory plus its file name. I/O failures
    /// are logged and treated as "no resources".
    pub fn scan_for_resources(&self, content_root: &Path, permalink_dir: &str) -> Vec<Resource> {
        if self.bundle == BundleType::None {
            return Vec::new();
        }

        let dir = content_root.join(dir_of(&self.path));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                log!("resources"; "skipping {}: {err}", dir.display());
                return Vec::new();
            }
        };

        let own_name = file_name(&self.path);
        let mut resources: Vec<Resource> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name != own_name)
            .filter(|name| self.bundle == BundleType::Leaf || !name.ends_with(".md"))
            .map(|name| {
                let rel_dir = dir_of(&self.path);
                let rel_path = if rel_dir.is_empty() {
                    name.clone()
                } else {
                    format!("{rel_dir}/{name}")
                };
                let rel_permalink = format!("{}/{name}", permalink_dir.trim_end_matches('/'));

                let def = self.front.resources.iter().find(|d| d.src == name);
                Resource {
                    rel_path,
                    rel_permalink,
                    name: def
                        .and_then(|d| d.name.clone())
                        .unwrap_or_else(|| name.clone()),
                    title: def.and_then(|d| d.title.clone()),
                    params: def.map(|d| d.params.clone()).unwrap_or_default(),
                }
            })
            .collect();

        resources.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        resources
    }
}
