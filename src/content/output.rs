//! Output formats.
//!
//! Each content kind expands into one page per configured output format.
//! Only the two built-ins exist; the config maps kind names to lists of
//! format names.

use crate::content::kind::Kind;

/// Definition of one output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputFormat {
    pub name: &'static str,
    pub media_type: &'static str,
    pub extension: &'static str,
    /// File stem used for the pretty (directory-style) form.
    pub base_name: &'static str,
    /// Always use the ugly `{stem}.{ext}` form for this format.
    pub ugly: bool,
    /// Never use the ugly form, even when the site-wide flag is set.
    pub no_ugly: bool,
}

pub const HTML: OutputFormat = OutputFormat {
    name: "html",
    media_type: "text/html",
    extension: "html",
    base_name: "index",
    ugly: false,
    no_ugly: false,
};

pub const JSON: OutputFormat = OutputFormat {
    name: "json",
    media_type: "application/json",
    extension: "json",
    base_name: "index",
    ugly: true,
    no_ugly: false,
};

/// Look up a format by its config name.
pub fn by_name(name: &str) -> Option<OutputFormat> {
    match name {
        "html" => Some(HTML),
        "json" => Some(JSON),
        _ => None,
    }
}

impl OutputFormat {
    /// Whether a page of this format takes the ugly filename form, given
    /// the site-wide setting. The format's `no_ugly` always wins.
    pub const fn use_ugly(&self, site_ugly: bool) -> bool {
        if self.no_ugly {
            false
        } else {
            self.ugly || site_ugly
        }
    }
}

/// Resolve the configured format names for a kind, skipping unknown names
/// and deduplicating while preserving order.
pub fn formats_for(names: &[String]) -> Vec<OutputFormat> {
    let mut formats: Vec<OutputFormat> = Vec::new();
    for name in names {
        if let Some(format) = by_name(name)
            && !formats.contains(&format)
        {
            formats.push(format);
        }
    }
    formats
}

/// The config key under which a kind's format list lives.
pub fn config_key(kind: Kind) -> &'static str {
    if kind.contains(Kind::HOME) {
        "home"
    } else if kind.contains(Kind::TERM) {
        "term"
    } else if kind.contains(Kind::TAXONOMY) {
        "taxonomy"
    } else if kind.contains(Kind::SECTION) {
        "section"
    } else {
        "page"
    }
}
