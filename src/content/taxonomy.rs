//! Tag taxonomy synthesis.
//!
//! The first tag seen anywhere fabricates the shared `tags/_index.md`
//! root; each distinct tag name fabricates its own term source under it.
//! Fabrication is a check-and-insert on the source table itself, atomic
//! per path, so repeated or concurrent references reuse one instance.
//! Tagged content is linked as a child of its term (which also records
//! the term on the content itself) and of the shared root (which does
//! not); term sources hang off the root by `parent` only.

use crate::content::kind::Kind;
use crate::content::source::{self, ContentSource};
use crate::site::Site;
use crate::utils::slug::slugify;

/// Relative path of the shared tags root.
pub const ROOT_PATH: &str = "tags/_index.md";

/// Ensure term and root sources exist for every declared tag and link
/// the content into them. Idempotent per (content, tag) pair.
pub fn generate_tags(site: &Site, content_path: &str, tags: &[String]) {
    if tags.is_empty() || content_path == ROOT_PATH {
        return;
    }

    for tag in tags {
        let Some(term_path) = ensure_term(site, tag) else {
            continue;
        };
        if term_path == content_path {
            continue;
        }

        site.with_source_mut(&term_path, |term| term.add_child(content_path));
        site.with_source_mut(ROOT_PATH, |root| root.add_child(content_path));
        site.with_source_mut(content_path, |content| content.add_tag_term(&term_path));
    }
}

/// Fabricate the term source for one tag (and the root before it).
/// Returns `None` for tags that slugify to nothing.
///
/// The fabricate-or-get is atomic on the source table, so once this
/// returns the term is present no matter which concurrent caller
/// inserted it.
fn ensure_term(site: &Site, tag: &str) -> Option<String> {
    let slug = slugify(tag);
    if slug.is_empty() {
        return None;
    }

    ensure_root(site);

    let term_path = format!("tags/{slug}/{}", source::BRANCH_INDEX);
    if site.with_source(&term_path, |_| ()).is_none() {
        let mut term = ContentSource::system(term_path.clone(), Kind::TERM);
        term.front.title = Some(tag.to_string());
        term.parent = Some(ROOT_PATH.to_string());
        site.add_synthetic(term);
    }
    Some(term_path)
}

fn ensure_root(site: &Site) {
    if site.with_source(ROOT_PATH, |_| ()).is_some() {
        return;
    }
    let mut root = ContentSource::system(ROOT_PATH, Kind::TAXONOMY);
    root.front.title = Some("Tags".to_string());
    root.parent = home_path(site);
    site.add_synthetic(root);
}

/// The root index source path, whichever form the content tree uses.
fn home_path(site: &Site) -> Option<String> {
    [source::BRANCH_INDEX, source::LEAF_INDEX]
        .into_iter()
        .find(|path| site.with_source(path, |_| ()).is_some())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::front_matter::FrontMatter;

    fn site() -> Site {
        Site::new(Box::leak(Box::new(SiteConfig::default())))
    }

    fn content(path: &str, tags: &[&str]) -> ContentSource {
        let mut front = FrontMatter::default();
        front.tags = tags.iter().map(|t| t.to_string()).collect();
        ContentSource::new(path, front, String::new())
    }

    #[test]
    fn test_tags_create_root_and_terms() {
        let site = site();
        site.add_source(content("blog/post1.md", &["rust", "web"]));

        site.with_source(ROOT_PATH, |root| {
            assert_eq!(root.kind, Kind::TAXONOMY);
            assert_eq!(root.children, vec!["blog/post1.md"]);
        })
        .unwrap();
        site.with_source("tags/rust/_index.md", |term| {
            assert_eq!(term.kind, Kind::TERM);
            assert_eq!(term.front.title.as_deref(), Some("rust"));
            assert_eq!(term.parent.as_deref(), Some(ROOT_PATH));
            assert_eq!(term.children, vec!["blog/post1.md"]);
        })
        .unwrap();
        site.with_source("blog/post1.md", |c| {
            assert_eq!(
                c.tag_terms,
                vec!["tags/rust/_index.md", "tags/web/_index.md"]
            );
        })
        .unwrap();
    }

    #[test]
    fn test_shared_term_across_sources() {
        let site = site();
        site.add_source(content("a.md", &["rust"]));
        site.add_source(content("b.md", &["rust"]));

        site.with_source("tags/rust/_index.md", |term| {
            assert_eq!(term.children, vec!["a.md", "b.md"]);
        })
        .unwrap();
        site.with_source(ROOT_PATH, |root| {
            assert_eq!(root.children, vec!["a.md", "b.md"]);
        })
        .unwrap();
    }

    #[test]
    fn test_relinking_is_idempotent() {
        let site = site();
        site.add_source(content("a.md", &["rust"]));
        generate_tags(&site, "a.md", &["rust".to_string(), "rust".to_string()]);

        site.with_source("tags/rust/_index.md", |term| {
            assert_eq!(term.children, vec!["a.md"]);
        })
        .unwrap();
        site.with_source("a.md", |c| {
            assert_eq!(c.tag_terms, vec!["tags/rust/_index.md"]);
        })
        .unwrap();
    }

    #[test]
    fn test_multi_tag_source_counts_once_per_link() {
        let site = site();
        site.add_source(content("a.md", &["x", "y"]));

        // Two term links, one root membership.
        site.with_source(ROOT_PATH, |root| {
            assert_eq!(root.children, vec!["a.md"]);
        })
        .unwrap();
    }

    #[test]
    fn test_contended_term_fabrication_links_every_source() {
        let site = site();
        let paths: Vec<String> = (0..8).map(|i| format!("p{i}.md")).collect();
        for path in &paths {
            site.add_source(content(path, &[]));
        }

        // All workers race to fabricate the same term; whoever loses the
        // insert must still find it and attach its link.
        std::thread::scope(|scope| {
            for path in &paths {
                let site = &site;
                scope.spawn(move || {
                    generate_tags(site, path, &["shared".to_string()]);
                });
            }
        });

        site.with_source("tags/shared/_index.md", |term| {
            assert_eq!(term.children.len(), paths.len());
        })
        .unwrap();
        for path in &paths {
            site.with_source(path, |c| {
                assert_eq!(c.tag_terms, vec!["tags/shared/_index.md"]);
            })
            .unwrap();
        }
    }

    #[test]
    fn test_tag_names_are_slugged() {
        let site = site();
        site.add_source(content("a.md", &["Rust Lang"]));

        site.with_source("tags/rust-lang/_index.md", |term| {
            assert_eq!(term.front.title.as_deref(), Some("Rust Lang"));
        })
        .unwrap();
    }
}
