//! Permalink synthesis.
//!
//! Turns a content source plus an output format into the URL a page is
//! registered and served under. An explicit `url` front matter value (a
//! literal path or a template over `page` / `site`) overrides the default
//! `{parent dir}/{name}` rule entirely; aliases reuse the same machinery
//! with a forced template.

use crate::content::output::OutputFormat;
use crate::content::source::{self, ContentSource};
use crate::log;
use crate::site::Site;
use crate::templates;
use crate::utils::slug::{slugify, slugify_path};

/// Compute the permalink a page of `format` should register under.
///
/// `url_override` forces the template (used for aliases); otherwise the
/// source's own `url` front matter, or the default rule, applies.
pub fn create_permalink(
    site: &Site,
    source: &ContentSource,
    format: OutputFormat,
    url_override: Option<&str>,
) -> String {
    // The content root itself always claims `/`, regardless of template.
    if url_override.is_none()
        && source.is_index()
        && source::dir_of(&source.path).is_empty()
    {
        return if format.use_ugly(site.config.build.ugly_urls) {
            format!("/{}.{}", format.base_name, format.extension)
        } else {
            "/".to_string()
        };
    }

    let raw = match url_override.or(source.front.url.as_deref()) {
        Some(template) => render_url_template(site, source, template),
        None => default_permalink(site, source, format),
    };

    let mut permalink = normalize(&raw);

    if permalink != "/" && format.use_ugly(site.config.build.ugly_urls) {
        permalink = uglify(&permalink, source, format);
    }

    permalink
}

/// Directory part of a permalink, with any ugly filename suffix removed.
/// `/` maps to the empty string so joining stays clean.
pub fn permalink_dir(permalink: &str, format: OutputFormat) -> String {
    if permalink == "/" {
        return String::new();
    }
    let suffix = format!(".{}", format.extension);
    let trimmed = permalink.strip_suffix(&suffix).unwrap_or(permalink);
    // An ugly root permalink carries the format's base name, not a real
    // path segment.
    let base_segment = format!("/{}", format.base_name);
    let trimmed = trimmed.strip_suffix(&base_segment).unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}

/// Default template: `{parent permalink dir}/{title-or-name}`.
///
/// Index files name themselves after their title or last directory
/// segment; other files after their title or file stem.
fn default_permalink(site: &Site, source: &ContentSource, format: OutputFormat) -> String {
    let parent_dir = source
        .parent
        .as_deref()
        .and_then(|p| site.permalink_dir_of(p, format))
        .unwrap_or_default();

    let name = match &source.front.title {
        Some(title) if !title.is_empty() => title.clone(),
        _ if source.is_index() => source::dir_of(&source.path)
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string(),
        _ => source::file_stem(&source.path).to_string(),
    };

    format!("{parent_dir}/{name}")
}

/// Render an explicit url template through the template engine.
/// A render failure is logged and collapses to the site root.
fn render_url_template(site: &Site, source: &ContentSource, template: &str) -> String {
    let context = crate::content::page::url_context(site, source);
    match templates::render(template, &context) {
        Ok(rendered) => rendered,
        Err(err) => {
            log!("error"; "url template `{template}` for {}: {err}", source.path);
            String::new()
        }
    }
}

/// Slugify each segment, force a leading slash, drop a trailing one.
fn normalize(raw: &str) -> String {
    let slugged = slugify_path(raw.trim());
    let trimmed = slugged.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Rewrite a pretty permalink into the ugly `{stem}.{ext}` form.
///
/// Non-index sources keep their source file stem; index sources keep the
/// already-computed last segment (their stem is just `index`).
fn uglify(permalink: &str, source: &ContentSource, format: OutputFormat) -> String {
    let (dir, last) = permalink.rsplit_once('/').unwrap_or(("", permalink));
    let stem = if source.is_index() {
        last.to_string()
    } else {
        slugify(source::file_stem(&source.path))
    };
    format!("{dir}/{stem}.{}", format.extension)
}
