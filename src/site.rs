//! The site aggregate.
//!
//! Owns the content graph: the path-keyed source table, the page arena,
//! the output-URL index, and the build caches. Scanning populates the
//! sources, `process_pages` expands them into pages, and the output index
//! is what the build writer and preview server consume.
//!
//! All shared tables are lock-guarded so the scanner can parse sibling
//! files and recurse into sibling directories from rayon workers. The
//! register step (duplicate check + insert) stays atomic per key because
//! it runs under one write lock.

use crate::cache::CacheManager;
use crate::config::SiteConfig;
use crate::content::output::{self, OutputFormat};
use crate::content::page::Page;
use crate::content::permalink;
use crate::content::scan;
use crate::content::source::{self, ContentSource, Resource};
use crate::content::taxonomy;
use crate::log;
use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One entry in the output-URL index.
#[derive(Debug, Clone)]
pub enum OutputRef {
    /// Rendered page, by arena id.
    Page(usize),
    /// Copied bundle resource.
    Resource(Resource),
}

/// Root aggregate owning the content graph and caches.
pub struct Site {
    pub config: &'static SiteConfig,
    /// Injected clock; date-validity gates compare against this.
    pub now: DateTime<Utc>,
    sources: RwLock<FxHashMap<String, ContentSource>>,
    pages: RwLock<Vec<Arc<Page>>>,
    output_refs: RwLock<FxHashMap<String, OutputRef>>,
    pub cache: CacheManager,
    home: RwLock<Option<usize>>,
}

impl Site {
    pub fn new(config: &'static SiteConfig) -> Self {
        Self::with_now(config, Utc::now())
    }

    /// Build a site with a fixed clock (tests inject a deterministic now).
    pub fn with_now(config: &'static SiteConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            now,
            sources: RwLock::default(),
            pages: RwLock::default(),
            output_refs: RwLock::default(),
            cache: CacheManager::new(),
            home: RwLock::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Scan phase
    // ------------------------------------------------------------------

    /// Populate the source table from the content directory.
    pub fn scan(&self) -> Result<()> {
        scan::scan_dir(self, &self.config.build.content, "", 0, None, None)
    }

    /// Register a parsed source and link it into the graph.
    ///
    /// Duplicate relative paths are logged and the first registration is
    /// kept. Links the source under its section index (when one exists)
    /// and into the tag taxonomy.
    pub fn add_source(&self, mut new: ContentSource) {
        new.front.section = source::section_of(&new.path).to_string();

        let path = new.path.clone();
        // Taxonomy pages keep `parent` as their only upward relation:
        // they are never linked as section children (the root's child set
        // holds tagged content only) and never tag themselves.
        let taxonomy_kind = new.kind.is_taxonomy_kind();
        let tags = if taxonomy_kind {
            Vec::new()
        } else {
            new.front.tags.clone()
        };
        {
            let mut sources = self.sources.write();
            if sources.contains_key(&path) {
                log!("error"; "duplicate content source: {path}");
                return;
            }
            sources.insert(path.clone(), new);
        }

        if !taxonomy_kind {
            self.link_section(&path);
        }
        taxonomy::generate_tags(self, &path, &tags);
    }

    /// Register a fabricated source unless its path is already taken.
    ///
    /// Check and insert happen under one write lock, so concurrent
    /// fabricators of the same path agree on a single instance and the
    /// source is visible to every caller once any of them returns.
    /// Returns whether this call inserted it.
    pub fn add_synthetic(&self, mut new: ContentSource) -> bool {
        new.front.section = source::section_of(&new.path).to_string();
        let mut sources = self.sources.write();
        if sources.contains_key(&new.path) {
            return false;
        }
        sources.insert(new.path.clone(), new);
        true
    }

    /// Add the source as a child of its governing index source, found by
    /// the conventional `_index.md` / `index.md` path.
    ///
    /// Regular files link under their section index; index files link
    /// under the enclosing directory's index (sections become children
    /// of home).
    fn link_section(&self, path: &str) {
        let container = if source::is_index_file(path) {
            if source::dir_of(path).is_empty() {
                return;
            }
            source::dir_of(source::dir_of(path))
        } else {
            source::section_of(path)
        };

        let mut sources = self.sources.write();
        for name in [source::BRANCH_INDEX, source::LEAF_INDEX] {
            let candidate = if container.is_empty() {
                name.to_string()
            } else {
                format!("{container}/{name}")
            };
            if candidate == path {
                continue;
            }
            if let Some(index_source) = sources.get_mut(&candidate) {
                index_source.add_child(path);
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Expansion phase
    // ------------------------------------------------------------------

    /// Expand every source with zero produced pages into one page per
    /// applicable output format.
    ///
    /// Index files go first, then directory order, so parents generally
    /// expand before children; the recursive parent check in
    /// `page_create` is the actual correctness guarantee. Idempotent:
    /// sources that already produced pages are skipped.
    pub fn process_pages(&self) {
        let mut paths: Vec<(bool, String)> = self
            .sources
            .read()
            .values()
            .filter(|s| s.pages.is_empty())
            .map(|s| (!s.is_index(), s.path.clone()))
            .collect();
        paths.sort();

        for (_, path) in paths {
            self.page_create(&path);
        }
    }

    /// Expand one source into pages, parents first.
    pub fn page_create(&self, path: &str) {
        let Some((parent, expanded, kind, valid)) = self.with_source(path, |s| {
            (
                s.parent.clone(),
                !s.pages.is_empty(),
                s.kind,
                s.is_valid(
                    self.now,
                    self.config.build.drafts,
                    self.config.build.future,
                    self.config.build.expired,
                ),
            )
        }) else {
            return;
        };

        if expanded {
            return;
        }

        // A child's permalink may reference its parent's, so the parent
        // must have expanded first.
        if let Some(parent_path) = parent {
            let parent_pending = self
                .with_source(&parent_path, |s| s.pages.is_empty())
                .unwrap_or(false);
            if parent_pending {
                self.page_create(&parent_path);
            }
        }

        if !valid {
            return;
        }

        let names = self
            .config
            .build
            .format_names(output::config_key(kind));
        for format in output::formats_for(&names) {
            self.materialize(path, format);
        }
    }

    /// Create, post-process, and register one page.
    fn materialize(&self, path: &str, format: OutputFormat) {
        let Some(snapshot) = self.with_source(path, |s| s.clone()) else {
            return;
        };

        let rel_permalink = permalink::create_permalink(self, &snapshot, format, None);

        // Aliases reuse the permalink machinery with a forced template.
        let aliases: Vec<String> = snapshot
            .front
            .aliases
            .iter()
            .map(|alias| permalink::create_permalink(self, &snapshot, format, Some(alias.as_str())))
            .filter(|a| a != &rel_permalink)
            .collect();

        let id = {
            let mut pages = self.pages.write();
            let id = pages.len();
            pages.push(Arc::new(Page::new(
                id,
                path.to_string(),
                format,
                rel_permalink.clone(),
                aliases.clone(),
            )));
            id
        };

        self.register_output(&rel_permalink, OutputRef::Page(id));
        for alias in &aliases {
            self.register_output(alias, OutputRef::Page(id));
        }

        // First post-process of a bundle scans its resources.
        let resources = if snapshot.resources_scanned {
            Vec::new()
        } else {
            snapshot.scan_for_resources(
                &self.config.build.content,
                &permalink::permalink_dir(&rel_permalink, format),
            )
        };

        {
            let mut sources = self.sources.write();
            if let Some(s) = sources.get_mut(path) {
                s.pages.push(id);
                if !s.resources_scanned {
                    s.resources = resources.clone();
                    s.resources_scanned = true;
                }
            }
        }
        for resource in resources {
            self.register_output(&resource.rel_permalink.clone(), OutputRef::Resource(resource));
        }

        // The first page of the root index becomes the home page.
        let mut home = self.home.write();
        if home.is_none() && source::is_index_file(path) && source::dir_of(path).is_empty() {
            *home = Some(id);
        }
    }

    /// Register an output URL. First registrant wins; a duplicate is a
    /// logged conflict, not an error.
    pub fn register_output(&self, url: &str, output: OutputRef) {
        let mut refs = self.output_refs.write();
        if refs.contains_key(url) {
            log!("error"; "duplicate output url: {url}");
            return;
        }
        refs.insert(url.to_string(), output);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Run a closure against a source under the table's read lock.
    /// The closure must not re-enter the site.
    pub fn with_source<R>(&self, path: &str, f: impl FnOnce(&ContentSource) -> R) -> Option<R> {
        self.sources.read().get(path).map(f)
    }

    /// Mutate a source under the table's write lock. Only the scan+link
    /// phase uses this; sources are frozen once expansion starts.
    pub fn with_source_mut<R>(
        &self,
        path: &str,
        f: impl FnOnce(&mut ContentSource) -> R,
    ) -> Option<R> {
        self.sources.write().get_mut(path).map(f)
    }

    pub fn page(&self, id: usize) -> Option<Arc<Page>> {
        self.pages.read().get(id).cloned()
    }

    /// Pages produced by one source, in creation order.
    pub fn pages_of(&self, path: &str) -> Vec<Arc<Page>> {
        let ids = self
            .with_source(path, |s| s.pages.clone())
            .unwrap_or_default();
        let pages = self.pages.read();
        ids.iter().filter_map(|&id| pages.get(id).cloned()).collect()
    }

    pub fn home_page(&self) -> Option<Arc<Page>> {
        let id = (*self.home.read())?;
        self.page(id)
    }

    /// Permalink directory of the first page of a source matching the
    /// format (falling back to any page of the source).
    pub fn permalink_dir_of(&self, path: &str, format: OutputFormat) -> Option<String> {
        let pages = self.pages_of(path);
        let page = pages
            .iter()
            .find(|p| p.format == format)
            .or_else(|| pages.first())?;
        Some(permalink::permalink_dir(&page.rel_permalink, page.format))
    }

    pub fn lookup_output(&self, url: &str) -> Option<OutputRef> {
        self.output_refs.read().get(url).cloned()
    }

    /// Snapshot of all registered output URLs.
    pub fn output_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.output_refs.read().keys().cloned().collect();
        urls.sort();
        urls
    }

    pub fn source_count(&self) -> usize {
        self.sources.read().len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }

    /// Clear every cache, the page arena, and the whole content graph.
    /// Must run before any rescan.
    pub fn reset_cache(&self) {
        self.cache.reset();
        self.sources.write().clear();
        self.pages.write().clear();
        self.output_refs.write().clear();
        *self.home.write() = None;
    }
}
