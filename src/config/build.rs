//! `[build]` section configuration.
//!
//! Paths, URL style, output format table, and the content-selection flags
//! shared by build and serve.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// `[build]` section in vellum.toml.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"
/// output = "public"
/// templates = "templates"
/// ugly_urls = false
///
/// [build.formats]
/// home = ["html", "json"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root. Set from the CLI, never from the file.
    #[serde(skip)]
    pub root: Option<PathBuf>,

    /// Content directory, scanned recursively for `*.md`.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Output directory for rendered pages and copied resources.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Theme template directory searched by the template lookup order.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Remove the output directory before building.
    #[serde(default)]
    pub clean: bool,

    /// Minify written HTML.
    #[serde(default = "defaults::build::minify")]
    #[educe(Default = defaults::build::minify())]
    pub minify: bool,

    /// Site-wide ugly URLs: `/post.html` instead of `/post/`.
    /// A format's `no_ugly` still wins over this.
    #[serde(default)]
    pub ugly_urls: bool,

    /// Include draft content.
    #[serde(default)]
    pub drafts: bool,

    /// Include content dated in the future.
    #[serde(default)]
    pub future: bool,

    /// Include expired content.
    #[serde(default)]
    pub expired: bool,

    /// Output formats per kind (`home`, `section`, `taxonomy`, `term`,
    /// `page`). Kinds missing from the table fall back to `["html"]`.
    #[serde(default = "defaults::build::formats")]
    #[educe(Default = defaults::build::formats())]
    pub formats: BTreeMap<String, Vec<String>>,
}

impl BuildConfig {
    /// Format names configured for a kind key, defaulting to html.
    pub fn format_names(&self, kind_key: &str) -> Vec<String> {
        self.formats
            .get(kind_key)
            .cloned()
            .unwrap_or_else(|| vec!["html".to_string()])
    }
}
