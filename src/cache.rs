//! Build caches.
//!
//! Owned by the [`Site`](crate::site::Site) aggregate, never global:
//! a memo table for resolved theme templates and the set of synthetic
//! source paths already fabricated. `reset()` must run before any rescan
//! so no entry points at a previous build's state.

use crate::content::kind::Kind;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Which template tier a lookup is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateTier {
    /// Per-page theme template.
    Page,
    /// Outer layout (`-baseof`) template.
    Layout,
}

/// Memo key for one template resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub section: String,
    pub type_name: String,
    pub kind: Kind,
    pub format: &'static str,
    pub tier: TemplateTier,
}

/// Memoization tables scoped to one site instance.
#[derive(Debug, Default)]
pub struct CacheManager {
    /// Resolved template contents; `None` records a miss so the theme
    /// directory is not probed again for the same key.
    templates: RwLock<FxHashMap<TemplateKey, Option<Arc<String>>>>,
    /// Relative paths of synthetic sources already fabricated.
    synthetic: RwLock<FxHashSet<String>>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached template resolution, or `None` if this key was never
    /// resolved (distinct from a cached miss).
    pub fn template(&self, key: &TemplateKey) -> Option<Option<Arc<String>>> {
        self.templates.read().get(key).cloned()
    }

    /// Record a template resolution (hit or miss) for a key.
    pub fn store_template(&self, key: TemplateKey, contents: Option<Arc<String>>) {
        self.templates.write().insert(key, contents);
    }

    /// Mark a synthetic source path as fabricated.
    /// Returns false if it already was.
    pub fn mark_synthetic(&self, path: &str) -> bool {
        self.synthetic.write().insert(path.to_string())
    }

    pub fn is_synthetic(&self, path: &str) -> bool {
        self.synthetic.read().contains(path)
    }

    /// Clear every table. Must run before a rescan.
    pub fn reset(&self) {
        self.templates.write().clear();
        self.synthetic.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(section: &str) -> TemplateKey {
        TemplateKey {
            section: section.to_string(),
            type_name: "_default".to_string(),
            kind: Kind::PAGE,
            format: "html",
            tier: TemplateTier::Page,
        }
    }

    #[test]
    fn test_template_memo_hit_and_miss() {
        let cache = CacheManager::new();
        assert_eq!(cache.template(&key("blog")), None);

        cache.store_template(key("blog"), Some(Arc::new("tpl".to_string())));
        let hit = cache.template(&key("blog")).unwrap().unwrap();
        assert_eq!(&*hit, "tpl");

        // A cached miss is remembered, not re-resolved.
        cache.store_template(key("docs"), None);
        assert_eq!(cache.template(&key("docs")), Some(None));
    }

    #[test]
    fn test_synthetic_set() {
        let cache = CacheManager::new();
        assert!(cache.mark_synthetic("tags/_index.md"));
        assert!(!cache.mark_synthetic("tags/_index.md"));
        assert!(cache.is_synthetic("tags/_index.md"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let cache = CacheManager::new();
        cache.store_template(key("blog"), None);
        cache.mark_synthetic("tags/_index.md");

        cache.reset();

        assert_eq!(cache.template(&key("blog")), None);
        assert!(!cache.is_synthetic("tags/_index.md"));
    }
}
