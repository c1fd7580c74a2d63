//! URL segment slugification.
//!
//! Permalink segments are slugified independently; the `/` separators
//! between them are never touched by this module.

use deunicode::deunicode;

/// Separator inserted between word runs.
const SEPARATOR: char = '-';

/// Turn one path segment into a URL-safe slug.
///
/// Lowercases, transliterates to ASCII, keeps `[a-z0-9]`, collapses every
/// other run of characters into a single `-`, and trims separators from
/// both ends. An input with no usable characters yields an empty slug.
pub fn slugify(segment: &str) -> String {
    let ascii = deunicode(segment).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_sep = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    slug
}

/// Slugify every segment of a slash-separated path, preserving the
/// separators (including a leading or trailing slash).
pub fn slugify_path(path: &str) -> String {
    path.split('/')
        .map(slugify)
        .collect::<Vec<_>>()
        .join("/")
}
