//! Pages: format-specific materializations of content sources.
//!
//! A page is derived state. Everything it exposes beyond its permalink is
//! recomputed from the owning source on demand and memoized per page
//! instance (the markdown and template calls are the expensive ones), so
//! dropping the page drops the cache with it.

use crate::cache::{TemplateKey, TemplateTier};
use crate::content::output::OutputFormat;
use crate::content::source::ContentSource;
use crate::log;
use crate::markdown;
use crate::site::Site;
use crate::templates;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tera::Context;

/// One rendered unit: (content source × output format).
#[derive(Debug)]
pub struct Page {
    /// Index into the site's page arena.
    pub id: usize,
    /// Relative path of the owning content source.
    pub source_path: String,
    pub format: OutputFormat,
    /// Assigned exactly once during post-processing; the key this page is
    /// registered under in the content index.
    pub rel_permalink: String,
    /// Resolved alias URLs, registered alongside the permalink.
    pub aliases: Vec<String>,

    content_pre: OnceLock<String>,
    content: OnceLock<String>,
    complete: OnceLock<String>,
    words: OnceLock<usize>,
}

impl Page {
    pub fn new(
        id: usize,
        source_path: String,
        format: OutputFormat,
        rel_permalink: String,
        aliases: Vec<String>,
    ) -> Self {
        Self {
            id,
            source_path,
            format,
            rel_permalink,
            aliases,
            content_pre: OnceLock::new(),
            content: OnceLock::new(),
            complete: OnceLock::new(),
            words: OnceLock::new(),
        }
    }

    /// Output file path relative to the output directory.
    ///
    /// Pretty permalinks become `{path}/{base_name}.{ext}`; ugly permalinks
    /// are already file names.
    pub fn output_path(&self) -> String {
        let trimmed = self.rel_permalink.trim_matches('/');
        let suffix = format!(".{}", self.format.extension);

        if self.rel_permalink.ends_with(&suffix) {
            trimmed.to_string()
        } else if trimmed.is_empty() {
            format!("{}.{}", self.format.base_name, self.format.extension)
        } else {
            format!("{trimmed}/{}.{}", self.format.base_name, self.format.extension)
        }
    }

    /// Raw body through the Markdown converter, memoized.
    pub fn content_pre_rendered(&self, site: &Site) -> &str {
        self.content_pre.get_or_init(|| {
            site.with_source(&self.source_path, |s| markdown::to_html(&s.raw_content))
                .unwrap_or_default()
        })
    }

    /// `content_pre_rendered` through the page-level theme template, when
    /// one resolves; unchanged otherwise. Render failure falls back one
    /// tier.
    pub fn content(&self, site: &Site) -> &str {
        self.content.get_or_init(|| {
            let pre = self.content_pre_rendered(site).to_string();
            self.through_template(site, TemplateTier::Page, pre)
        })
    }

    /// `content` through the layout (`-baseof`) template, when one
    /// resolves; unchanged otherwise.
    pub fn complete_content(&self, site: &Site) -> &str {
        self.complete.get_or_init(|| {
            let inner = self.content(site).to_string();
            self.through_template(site, TemplateTier::Layout, inner)
        })
    }

    /// Word count of the Markdown-stripped plain text, memoized.
    pub fn word_count(&self, site: &Site) -> usize {
        *self.words.get_or_init(|| {
            site.with_source(&self.source_path, |s| markdown::word_count(&s.raw_content))
                .unwrap_or(0)
        })
    }

    /// Child pages matching this page's output format, ordered by
    /// descending weight (stable for equal weights).
    pub fn pages(&self, site: &Site) -> Vec<Arc<Page>> {
        let children = site
            .with_source(&self.source_path, |s| s.children.clone())
            .unwrap_or_default();

        let mut pages: Vec<(i64, Arc<Page>)> = children
            .iter()
            .flat_map(|child| {
                let weight = site
                    .with_source(child, |s| s.front.weight)
                    .unwrap_or_default();
                site.pages_of(child)
                    .into_iter()
                    .filter(|p| p.format == self.format)
                    .map(move |p| (weight, p))
            })
            .collect();

        pages.sort_by(|a, b| b.0.cmp(&a.0));
        pages.into_iter().map(|(_, p)| p).collect()
    }

    /// `pages()` narrowed to regular content pages (single, non-system).
    pub fn regular_pages(&self, site: &Site) -> Vec<Arc<Page>> {
        self.pages(site)
            .into_iter()
            .filter(|p| {
                site.with_source(&p.source_path, |s| s.kind.is_page())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// For every tag term this page's source is linked under, the term's
    /// pages matching this page's format.
    pub fn tag_pages(&self, site: &Site) -> Vec<Arc<Page>> {
        let terms = site
            .with_source(&self.source_path, |s| s.tag_terms.clone())
            .unwrap_or_default();

        terms
            .iter()
            .flat_map(|term| site.pages_of(term))
            .filter(|p| p.format == self.format)
            .collect()
    }

    /// Every URL this page answers to: its permalink, its aliases, and
    /// its bundle resources. First registration wins on collision.
    pub fn all_output_urls(&self, site: &Site) -> BTreeMap<String, &'static str> {
        let mut urls = BTreeMap::new();
        urls.insert(self.rel_permalink.clone(), "page");
        for alias in &self.aliases {
            urls.entry(alias.clone()).or_insert("alias");
        }
        let resources = site
            .with_source(&self.source_path, |s| {
                s.resources.iter().map(|r| r.rel_permalink.clone()).collect::<Vec<_>>()
            })
            .unwrap_or_default();
        for url in resources {
            urls.entry(url).or_insert("resource");
        }
        urls
    }

    fn through_template(&self, site: &Site, tier: TemplateTier, inner: String) -> String {
        let Some((section, type_name, kind)) =
            site.with_source(&self.source_path, |s| {
                (s.front.section.clone(), effective_type(s), s.kind)
            })
        else {
            return inner;
        };

        let key = TemplateKey {
            section,
            type_name,
            kind,
            format: self.format.name,
            tier,
        };
        let Some(template) = templates::resolve(site.config, &site.cache, key) else {
            return inner;
        };

        let mut context = site
            .with_source(&self.source_path, |s| page_context(site, s))
            .unwrap_or_else(Context::new);
        context.insert("content", &inner);
        context.insert("permalink", &self.rel_permalink);

        if kind.is_list() {
            context.insert("pages", &summarize_all(site, &self.pages(site)));
            context.insert(
                "regular_pages",
                &summarize_all(site, &self.regular_pages(site)),
            );
        }
        let tagged = self.tag_pages(site);
        if !tagged.is_empty() {
            context.insert("tag_pages", &summarize_all(site, &tagged));
        }

        match templates::render(&template, &context) {
            Ok(rendered) => rendered,
            Err(err) => {
                log!("error"; "template for {}: {err}", self.source_path);
                inner
            }
        }
    }
}

/// Serializable listing entries for `pages` / `regular_pages` /
/// `tag_pages` template bindings.
fn summarize_all(site: &Site, pages: &[Arc<Page>]) -> Vec<serde_json::Value> {
    pages.iter().map(|p| summarize(site, p)).collect()
}

fn summarize(site: &Site, page: &Page) -> serde_json::Value {
    let (title, date, weight) = site
        .with_source(&page.source_path, |s| {
            (s.front.title.clone(), s.front.date, s.front.weight)
        })
        .unwrap_or_default();

    serde_json::json!({
        "title": title,
        "permalink": page.rel_permalink,
        "date": date.map(|d| d.to_rfc3339()),
        "weight": weight,
        "word_count": page.word_count(site),
    })
}

/// The content type used in template lookup: explicit `type`, else the
/// section name, else `_default`.
pub fn effective_type(source: &ContentSource) -> String {
    match &source.front.type_name {
        Some(t) if !t.is_empty() => t.clone(),
        _ if !source.front.section.is_empty() => source.front.section.clone(),
        _ => "_default".to_string(),
    }
}

/// Context for permalink (`url:`) templates: `page` and `site` bindings,
/// no rendered content yet.
pub fn url_context(site: &Site, source: &ContentSource) -> Context {
    page_context(site, source)
}

/// Shared `page` / `site` bindings for template rendering.
pub fn page_context(site: &Site, source: &ContentSource) -> Context {
    let mut context = Context::new();

    let config = site.config;
    context.insert(
        "site",
        &serde_json::json!({
            "title": config.base.title,
            "description": config.base.description,
            "author": config.base.author,
            "base_url": config.base.url,
            "language": config.base.language,
        }),
    );

    let front = &source.front;
    context.insert(
        "page",
        &serde_json::json!({
            "title": front.title,
            "slug": crate::content::source::file_stem(&source.path),
            "section": front.section,
            "type": effective_type(source),
            "kind": source.kind.to_string(),
            "system": source.kind.is_system(),
            "date": front.date.map(|d| d.to_rfc3339()),
            "lastmod": front.lastmod.map(|d| d.to_rfc3339()),
            "weight": front.weight,
            "draft": front.draft,
            "tags": front.tags,
            "params": front.params,
        }),
    );

    context
}
