//! Site building orchestration.
//!
//! One build is: scan the content tree into a fresh [`Site`], expand every
//! source into pages, then write the whole output index to disk in
//! parallel. The built site is returned so serve mode can answer requests
//! from it directly.

use crate::config::SiteConfig;
use crate::content::output;
use crate::content::source::Resource;
use crate::log;
use crate::logger::Progress;
use crate::site::{OutputRef, Site};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Build the entire site into the output directory.
///
/// If `config.build.clean` is true, clears the output directory first.
/// Individual page or resource write failures are logged and counted,
/// not fatal; the summary reports them at the end.
pub fn build_site(config: &'static SiteConfig) -> Result<Arc<Site>> {
    let started = Instant::now();
    let output_dir = &config.build.output;

    if config.build.clean && output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("failed to clean {}", output_dir.display()))?;
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let site = Arc::new(Site::new(config));
    site.scan()?;
    site.process_pages();
    log!(
        "build";
        "{} sources, {} pages",
        site.source_count(),
        site.page_count()
    );

    let urls = site.output_urls();
    let progress = Progress::new("write", urls.len());
    let errors: usize = urls
        .par_iter()
        .map(|url| {
            let result = write_output(&site, url);
            progress.inc();
            match result {
                Ok(()) => 0,
                Err(err) => {
                    log!("error"; "{url}: {err}");
                    1
                }
            }
        })
        .sum();
    progress.finish();

    let elapsed = started.elapsed();
    if errors > 0 {
        log!("build"; "finished in {elapsed:.2?} with {errors} write errors");
    } else {
        log!("build"; "finished in {elapsed:.2?}");
    }
    Ok(site)
}

/// Write one entry of the output index to disk.
fn write_output(site: &Site, url: &str) -> Result<()> {
    match site.lookup_output(url) {
        Some(OutputRef::Page(id)) => {
            let page = site
                .page(id)
                .with_context(|| format!("missing page for {url}"))?;
            let path = site.config.build.output.join(page.output_path());
            let mut content = page.complete_content(site).as_bytes().to_vec();
            if site.config.build.minify && page.format == output::HTML {
                content = minify_html::minify(&content, &minify_html::Cfg::new());
            }
            write_file(&path, &content)
        }
        Some(OutputRef::Resource(resource)) => copy_resource(site, &resource),
        None => Ok(()),
    }
}

/// Copy a bundle resource from the content tree into the output tree.
fn copy_resource(site: &Site, resource: &Resource) -> Result<()> {
    let from = site.config.build.content.join(&resource.rel_path);
    let to = site
        .config
        .build
        .output
        .join(resource.rel_permalink.trim_start_matches('/'));
    if let Some(dir) = to.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::copy(&from, &to)
        .with_context(|| format!("failed to copy {}", from.display()))?;
    Ok(())
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> &'static SiteConfig {
        let mut config = SiteConfig::default();
        config.build.content = dir.path().join("content");
        config.build.output = dir.path().join("public");
        config.build.templates = dir.path().join("templates");
        Box::leak(Box::new(config))
    }

    #[test]
    fn test_build_writes_pages_and_resources() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("blog")).unwrap();
        fs::write(content.join("_index.md"), "---\ntitle: Home\n---\nwelcome").unwrap();
        fs::write(
            content.join("blog/_index.md"),
            "---\ntitle: Blog\n---\n",
        )
        .unwrap();
        fs::write(
            content.join("blog/post1.md"),
            "---\ntitle: Post 1\n---\n# Hello\n",
        )
        .unwrap();

        let config = config_for(&dir);
        let site = build_site(config).unwrap();

        assert!(dir.path().join("public/index.html").is_file());
        assert!(dir.path().join("public/blog/post-1/index.html").is_file());
        let html = fs::read_to_string(dir.path().join("public/blog/post-1/index.html")).unwrap();
        assert!(html.contains("<h1>Hello</h1>"));
        assert_eq!(site.page_count(), 3);
    }

    #[test]
    fn test_build_copies_bundle_resources() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("gallery")).unwrap();
        fs::write(content.join("gallery/index.md"), "---\ntitle: Gallery\n---\n").unwrap();
        fs::write(content.join("gallery/photo.jpg"), b"jpegdata").unwrap();

        build_site(config_for(&dir)).unwrap();

        assert!(dir.path().join("public/gallery/photo.jpg").is_file());
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(dir.path().join("content/_index.md"), "hi").unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/stale.html"), "old").unwrap();

        let mut config = SiteConfig::default();
        config.build.content = dir.path().join("content");
        config.build.output = dir.path().join("public");
        config.build.templates = dir.path().join("templates");
        config.build.clean = true;
        build_site(Box::leak(Box::new(config))).unwrap();

        assert!(!dir.path().join("public/stale.html").exists());
        assert!(dir.path().join("public/index.html").is_file());
    }
}
