//! Template rendering and theme template lookup.
//!
//! Rendering is a thin seam over `tera`: one template string, a context
//! binding `site` and `page`, one rendered string out. Render failures are
//! the caller's to log and fall back from; nothing here aborts a build.
//!
//! Theme templates live under the configured templates directory and are
//! resolved by a most-specific-first lookup order over
//! `{section} × {type} × {kind}` with `_default` fallbacks.

use crate::cache::{TemplateKey, TemplateTier};
use crate::config::SiteConfig;
use crate::content::kind::Kind;
use anyhow::{Result, anyhow};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, Tera};

/// The bare layout fallback tried after every kind-specific candidate.
const BASEOF: &str = "baseof.html";

/// Render a template string against a prepared context.
///
/// Syntax or variable errors surface as a single `anyhow` error carrying
/// tera's message chain.
pub fn render(template: &str, context: &Context) -> Result<String> {
    Tera::one_off(template, context, false).map_err(|e| {
        let mut msg = e.to_string();
        let mut cause = std::error::Error::source(&e);
        while let Some(err) = cause {
            msg.push_str(": ");
            msg.push_str(&err.to_string());
            cause = std::error::Error::source(err);
        }
        anyhow!(msg)
    })
}

/// Candidate template paths for a page, most specific first.
///
/// Cartesian product of `{section, ""} × {type, "_default"}` applied to
/// every kind name flag, relative to the templates directory. The layout
/// tier uses `-baseof` suffixed names plus a bare `baseof.html` fallback.
pub fn lookup_order(
    section: &str,
    type_name: &str,
    kind: Kind,
    tier: TemplateTier,
) -> Vec<String> {
    let sections: Vec<&str> = if section.is_empty() {
        vec![""]
    } else {
        vec![section, ""]
    };
    let types: Vec<&str> = if type_name.is_empty() || type_name == "_default" {
        vec!["_default"]
    } else {
        vec![type_name, "_default"]
    };

    let mut candidates = Vec::new();
    for sec in &sections {
        for ty in &types {
            for kind_name in kind.names() {
                let file = match tier {
                    TemplateTier::Page => format!("{kind_name}.html"),
                    TemplateTier::Layout => format!("{kind_name}-baseof.html"),
                };
                let path = [*sec, *ty, &file]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("/");
                if !candidates.contains(&path) {
                    candidates.push(path);
                }
            }
        }
    }

    if tier == TemplateTier::Layout {
        candidates.push(BASEOF.to_string());
    }
    candidates
}

/// Resolve a theme template for a page, memoized in the site cache.
///
/// Probes each candidate under the templates directory; the first file
/// that exists wins. Both hits and misses are cached per key.
pub fn resolve(
    config: &SiteConfig,
    cache: &crate::cache::CacheManager,
    key: TemplateKey,
) -> Option<Arc<String>> {
    if let Some(cached) = cache.template(&key) {
        return cached;
    }

    let resolved = lookup_order(&key.section, &key.type_name, key.kind, key.tier)
        .into_iter()
        .find_map(|candidate| read_template(&config.build.templates, &candidate));

    cache.store_template(key, resolved.clone());
    resolved
}

fn read_template(templates_dir: &Path, candidate: &str) -> Option<Arc<String>> {
    let path = templates_dir.join(candidate);
    path.is_file()
        .then(|| fs::read_to_string(&path).ok().map(Arc::new))
        .flatten()
}
