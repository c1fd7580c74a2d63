//! Recursive content scanning.
//!
//! Walks the content directory, parses every Markdown file into a
//! [`ContentSource`], fabricates system sources for the root and for
//! top-level sections lacking an index file, and carries cascade front
//! matter and parent linkage down the tree. Sibling files and sibling
//! directories are processed on rayon workers; the source table absorbs
//! concurrent registration.

use crate::content::front_matter::{self, FrontMatter};
use crate::content::kind::Kind;
use crate::content::source::{self, ContentSource};
use crate::log;
use crate::site::Site;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Scan one directory level and recurse.
///
/// `rel` is the directory's path relative to the content root (empty at
/// the root), `parent` the relative path of the index source governing
/// this subtree, `cascade` the front matter inherited from above.
pub fn scan_dir(
    site: &Site,
    dir: &Path,
    rel: &str,
    depth: usize,
    parent: Option<&str>,
    cascade: Option<&FrontMatter>,
) -> Result<()> {
    let mut files: Vec<String> = Vec::new();
    let mut subdirs: Vec<String> = Vec::new();

    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read content directory {}", dir.display()))?;
    for entry in entries.filter_map(Result::ok) {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        match entry.file_type() {
            Ok(t) if t.is_dir() => subdirs.push(name),
            Ok(t) if t.is_file() && name.ends_with(".md") => files.push(name),
            _ => {}
        }
    }
    files.sort();
    subdirs.sort();

    // At most one file is the directory's own source; branch wins when
    // both index forms exist.
    let index_name = [source::BRANCH_INDEX, source::LEAF_INDEX]
        .into_iter()
        .find(|name| files.iter().any(|f| f == name));

    let (own_index, next_cascade) = match index_name {
        Some(name) => scan_index(site, dir, rel, depth, name, parent, cascade),
        None => (fabricate_index(site, rel, depth, parent), None),
    };

    let parent_for_children = own_index.as_deref().or(parent);
    let cascade_for_children = next_cascade.as_deref().or(cascade);

    files
        .par_iter()
        .filter(|name| Some(name.as_str()) != index_name)
        .for_each(|name| {
            scan_file(site, dir, rel, name, parent_for_children, cascade_for_children);
        });

    subdirs
        .par_iter()
        .map(|name| {
            scan_dir(
                site,
                &dir.join(name),
                &join_rel(rel, name),
                depth + 1,
                parent_for_children,
                cascade_for_children,
            )
        })
        .collect::<Result<()>>()
}

/// Parse the directory's own index file.
///
/// Returns its relative path and the cascade it pushes down (its own
/// `cascade` block replaces the inherited one for the whole subtree).
fn scan_index(
    site: &Site,
    dir: &Path,
    rel: &str,
    depth: usize,
    name: &str,
    parent: Option<&str>,
    cascade: Option<&FrontMatter>,
) -> (Option<String>, Option<Box<FrontMatter>>) {
    let rel_path = join_rel(rel, name);
    let Some(mut src) = parse_file(dir, rel, name, parent, cascade) else {
        return (None, None);
    };

    src.kind = index_kind(&src, depth);
    if depth == 1 && src.front.type_name.is_none() {
        src.front.type_name = Some("section".to_string());
    }

    let next_cascade = src.front.cascade.clone();
    site.add_source(src);
    (Some(rel_path), next_cascade)
}

/// Kind of an index source: the root is always home, depth 1 defaults to
/// section, deeper indexes default by bundle form (`_index.md` lists,
/// `index.md` is a standalone page bundle). An explicit `kind` front
/// matter value wins everywhere below the root.
fn index_kind(src: &ContentSource, depth: usize) -> Kind {
    if depth == 0 {
        return Kind::HOME;
    }
    if let Some(name) = src.front.kind.as_deref()
        && let Some(kind) = Kind::parse(name)
    {
        return kind;
    }
    if depth == 1 || source::file_name(&src.path) == source::BRANCH_INDEX {
        Kind::SECTION
    } else {
        Kind::PAGE
    }
}

/// Fabricate a system source for a directory without an index file.
/// Only the root (home) and top-level sections get one.
fn fabricate_index(site: &Site, rel: &str, depth: usize, parent: Option<&str>) -> Option<String> {
    let kind = match depth {
        0 => Kind::HOME,
        1 => Kind::SECTION,
        _ => return None,
    };

    let rel_path = join_rel(rel, source::BRANCH_INDEX);
    if site.cache.mark_synthetic(&rel_path) {
        let mut src = ContentSource::system(rel_path.clone(), kind);
        src.parent = parent.map(str::to_string);
        if depth == 1 {
            src.front.type_name = Some("section".to_string());
        }
        site.add_source(src);
    }
    Some(rel_path)
}

/// Parse one non-index Markdown file into a registered source.
fn scan_file(
    site: &Site,
    dir: &Path,
    rel: &str,
    name: &str,
    parent: Option<&str>,
    cascade: Option<&FrontMatter>,
) {
    if let Some(mut src) = parse_file(dir, rel, name, parent, cascade) {
        if let Some(kind) = src.front.kind.as_deref().and_then(Kind::parse) {
            src.kind = kind;
        }
        site.add_source(src);
    }
}

/// Read and parse a Markdown file, applying the inherited cascade.
/// Failures are logged and the file is skipped.
fn parse_file(
    dir: &Path,
    rel: &str,
    name: &str,
    parent: Option<&str>,
    cascade: Option<&FrontMatter>,
) -> Option<ContentSource> {
    let rel_path = join_rel(rel, name);
    let text = match fs::read_to_string(dir.join(name)) {
        Ok(text) => text,
        Err(err) => {
            log!("scan"; "skipping {rel_path}: {err}");
            return None;
        }
    };

    let (mut front, body) = match front_matter::parse(&text) {
        Ok(parsed) => parsed,
        Err(err) => {
            log!("scan"; "skipping {rel_path}: {err}");
            return None;
        }
    };
    if let Some(cascade) = cascade {
        cascade.merge_into(&mut front);
    }

    let mut src = ContentSource::new(rel_path, front, body);
    src.parent = parent.map(str::to_string);
    Some(src)
}

fn join_rel(rel: &str, name: &str) -> String {
    if rel.is_empty() {
        name.to_string()
    } else {
        format!("{rel}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    fn site_for(dir: &TempDir) -> Site {
        let mut config = SiteConfig::default();
        config.build.content = dir.path().to_path_buf();
        Site::new(Box::leak(Box::new(config)))
    }

    #[test]
    fn test_scan_discovers_and_links() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_index.md"), "---\ntitle: Home\n---\n").unwrap();
        fs::create_dir(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("blog/_index.md"), "---\ntitle: Blog\n---\n").unwrap();
        fs::write(dir.path().join("blog/post1.md"), "---\ntitle: Post 1\n---\nbody").unwrap();

        let site = site_for(&dir);
        site.scan().unwrap();

        assert_eq!(site.source_count(), 3);
        site.with_source("_index.md", |s| assert_eq!(s.kind, Kind::HOME))
            .unwrap();
        site.with_source("blog/_index.md", |s| {
            assert_eq!(s.kind, Kind::SECTION);
            assert_eq!(s.children, vec!["blog/post1.md"]);
            assert_eq!(s.parent.as_deref(), Some("_index.md"));
        })
        .unwrap();
        site.with_source("blog/post1.md", |s| {
            assert_eq!(s.kind, Kind::PAGE);
            assert_eq!(s.parent.as_deref(), Some("blog/_index.md"));
            assert_eq!(s.front.section, "blog");
        })
        .unwrap();
    }

    #[test]
    fn test_scan_fabricates_home_and_section() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/guide.md"), "---\ntitle: Guide\n---\n").unwrap();

        let site = site_for(&dir);
        site.scan().unwrap();

        site.with_source("_index.md", |s| {
            assert_eq!(s.kind, Kind::HOME);
            assert!(s.kind.is_system());
        })
        .unwrap();
        site.with_source("docs/_index.md", |s| {
            assert_eq!(s.kind, Kind::SECTION);
            assert_eq!(s.front.type_name.as_deref(), Some("section"));
        })
        .unwrap();
        assert!(site.cache.is_synthetic("docs/_index.md"));
    }

    #[test]
    fn test_scan_no_synthetic_below_depth_one() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/deep.md"), "---\ntitle: Deep\n---\n").unwrap();

        let site = site_for(&dir);
        site.scan().unwrap();

        assert!(site.with_source("a/b/_index.md", |_| ()).is_none());
        // The deep file is governed by the fabricated depth-1 section.
        site.with_source("a/b/deep.md", |s| {
            assert_eq!(s.parent.as_deref(), Some("a/_index.md"));
        })
        .unwrap();
    }

    #[test]
    fn test_scan_cascade_applies_down() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_index.md"),
            "---\ntitle: Home\ncascade:\n  draft: true\n---\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("blog")).unwrap();
        fs::write(
            dir.path().join("blog/_index.md"),
            "---\ntitle: Blog\ncascade:\n  type: review\n---\n",
        )
        .unwrap();
        fs::write(dir.path().join("blog/post1.md"), "---\ntitle: P\n---\n").unwrap();

        let site = site_for(&dir);
        site.scan().unwrap();

        // The deeper cascade replaces the inherited one for its subtree.
        site.with_source("blog/post1.md", |s| {
            assert_eq!(s.front.type_name.as_deref(), Some("review"));
            assert!(!s.front.draft);
        })
        .unwrap();
        // The section index itself still received the root cascade.
        site.with_source("blog/_index.md", |s| assert!(s.front.draft)).unwrap();
    }

    #[test]
    fn test_scan_skips_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.md"), "---\ntitle: Good\n---\n").unwrap();
        fs::write(dir.path().join("bad.md"), "---\ndate: yesterday\n---\n").unwrap();

        let site = site_for(&dir);
        site.scan().unwrap();

        assert!(site.with_source("good.md", |_| ()).is_some());
        assert!(site.with_source("bad.md", |_| ()).is_none());
    }

    #[test]
    fn test_leaf_index_deep_is_a_page() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("blog/gallery")).unwrap();
        fs::write(dir.path().join("blog/gallery/index.md"), "---\ntitle: G\n---\n").unwrap();

        let site = site_for(&dir);
        site.scan().unwrap();

        site.with_source("blog/gallery/index.md", |s| {
            assert_eq!(s.kind, Kind::PAGE);
        })
        .unwrap();
    }
}
