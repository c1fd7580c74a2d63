//! Site initialization.
//!
//! Creates a new site skeleton: directory structure, default
//! configuration, starter content, and a minimal template set.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Default config filename
const CONFIG_FILE: &str = "vellum.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &["content/blog", "templates/_default"];

const SAMPLE_HOME: &str = "---\ntitle: Home\n---\n\nWelcome to your new site.\n";

const SAMPLE_POST: &str = "---\ntitle: First Post\ndraft: true\ntags: [welcome]\n---\n\nYour first post. Remove `draft: true` to publish it.\n";

const SAMPLE_PAGE_TEMPLATE: &str = "<article>\n  <h1>{{ page.title }}</h1>\n  {{ content | safe }}\n</article>\n";

const SAMPLE_BASEOF_TEMPLATE: &str = "<!doctype html>\n<html lang=\"{{ site.language }}\">\n<head>\n  <meta charset=\"utf-8\">\n  <title>{{ page.title }} | {{ site.title }}</title>\n</head>\n<body>\n  {{ content | safe }}\n</body>\n</html>\n";

/// Create a new site with default structure.
pub fn new_site(config: &'static SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Initializing in the current directory requires it to be empty.
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `vellum init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    init_starter_files(root)?;
    init_ignored_files(root, &["public/"])?;

    crate::log!("init"; "created new site at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `vellum init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write starter content and templates.
fn init_starter_files(root: &Path) -> Result<()> {
    let files = [
        ("content/_index.md", SAMPLE_HOME),
        ("content/blog/first-post.md", SAMPLE_POST),
        ("templates/_default/page.html", SAMPLE_PAGE_TEMPLATE),
        ("templates/baseof.html", SAMPLE_BASEOF_TEMPLATE),
    ];
    for (rel, content) in files {
        let path = root.join(rel);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Initialize .gitignore and .ignore files with specified paths
fn init_ignored_files(root: &Path, paths: &[&str]) -> Result<()> {
    let content = paths.join("\n");
    for filename in IGNORE_FILES {
        fs::write(root.join(filename), &content)
            .with_context(|| format!("Failed to write {filename}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_rooted_at(path: &Path) -> &'static SiteConfig {
        let mut config = SiteConfig::default();
        config.build.root = Some(path.to_path_buf());
        Box::leak(Box::new(config))
    }

    #[test]
    fn test_new_site_scaffolds() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("mysite");
        new_site(config_rooted_at(&root), true).unwrap();

        assert!(root.join("vellum.toml").is_file());
        assert!(root.join("content/_index.md").is_file());
        assert!(root.join("content/blog/first-post.md").is_file());
        assert!(root.join("templates/baseof.html").is_file());
        assert!(root.join(".gitignore").is_file());

        // The generated config must parse back.
        SiteConfig::from_path(&root.join("vellum.toml")).unwrap();
    }

    #[test]
    fn test_init_refuses_nonempty_current_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("existing.txt"), "x").unwrap();
        let result = new_site(config_rooted_at(dir.path()), false);
        assert!(result.is_err());
    }
}
