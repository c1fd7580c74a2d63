//! Content kind flags.
//!
//! A [`Kind`] describes the role a content source plays in the site graph.
//! Composite kinds are bit unions of the base flags, and every check uses
//! bitwise containment rather than equality: a `TERM` page still answers
//! `true` to `is_list()`.

use std::fmt;

/// Bitset describing a content node's role.
///
/// The kind is assigned during scanning (or taxonomy synthesis) and never
/// changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kind(u8);

impl Kind {
    /// A single content page.
    pub const SINGLE: Self = Self(1 << 0);
    /// A page that lists other pages.
    pub const LIST: Self = Self(1 << 1);
    /// A directory-index page.
    pub const INDEX: Self = Self(1 << 2);
    /// Fabricated by the generator rather than authored.
    pub const SYSTEM: Self = Self(1 << 3);
    /// Part of the tag taxonomy.
    pub const IS_TAXONOMY: Self = Self(1 << 4);

    /// Plain content page (`SINGLE`).
    pub const PAGE: Self = Self::SINGLE;
    /// The site home page.
    pub const HOME: Self = Self(Self::SYSTEM.0 | Self::INDEX.0);
    /// A section listing page.
    pub const SECTION: Self = Self(Self::SYSTEM.0 | Self::LIST.0);
    /// The shared tags root.
    pub const TAXONOMY: Self = Self(Self::SYSTEM.0 | Self::IS_TAXONOMY.0 | Self::LIST.0);
    /// One tag's own listing page.
    pub const TERM: Self =
        Self(Self::SYSTEM.0 | Self::SINGLE.0 | Self::IS_TAXONOMY.0 | Self::LIST.0);

    /// Bitwise containment: does this kind carry every flag of `other`?
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_list(self) -> bool {
        self.contains(Self::LIST)
    }

    #[inline]
    pub const fn is_system(self) -> bool {
        self.contains(Self::SYSTEM)
    }

    #[inline]
    pub const fn is_taxonomy_kind(self) -> bool {
        self.contains(Self::IS_TAXONOMY)
    }

    /// A regular, authored content page: `SINGLE` without `SYSTEM`.
    #[inline]
    pub const fn is_page(self) -> bool {
        self.contains(Self::SINGLE) && !self.contains(Self::SYSTEM)
    }

    /// Parse an explicit kind override from front matter.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "page" | "single" => Some(Self::PAGE),
            "home" => Some(Self::HOME),
            "section" => Some(Self::SECTION),
            "taxonomy" => Some(Self::TAXONOMY),
            "term" => Some(Self::TERM),
            _ => None,
        }
    }

    /// Flag names set on this kind, most specific first.
    ///
    /// Drives the template lookup order: a term page tries `term` before
    /// `taxonomy`, `list`, and so on.
    pub fn names(self) -> Vec<&'static str> {
        // Composite names first so the most specific template wins.
        let composites: &[(Self, &str)] = &[
            (Self::TERM, "term"),
            (Self::TAXONOMY, "taxonomy"),
            (Self::HOME, "home"),
            (Self::SECTION, "section"),
        ];
        let flags: &[(Self, &str)] = &[
            (Self::IS_TAXONOMY, "taxonomy"),
            (Self::LIST, "list"),
            (Self::INDEX, "index"),
            (Self::SINGLE, "page"),
        ];

        let mut names = Vec::new();
        for &(kind, name) in composites.iter().chain(flags) {
            if self.contains(kind) && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl Default for Kind {
    fn default() -> Self {
        Self::PAGE
    }
}

impl std::ops::BitOr for Kind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        write!(f, "{}", names.first().unwrap_or(&"page"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composites_are_unions() {
        assert!(Kind::HOME.contains(Kind::SYSTEM));
        assert!(Kind::HOME.contains(Kind::INDEX));
        assert!(Kind::SECTION.contains(Kind::LIST));
        assert!(Kind::TAXONOMY.contains(Kind::IS_TAXONOMY));
        assert!(Kind::TERM.contains(Kind::SINGLE));
    }

    #[test]
    fn test_containment_not_equality() {
        // A term is still a list, even though TERM != LIST.
        assert!(Kind::TERM.is_list());
        assert_ne!(Kind::TERM, Kind::LIST | Kind::SYSTEM);
    }

    #[test]
    fn test_is_page_excludes_system() {
        assert!(Kind::PAGE.is_page());
        assert!(!Kind::TERM.is_page()); // SINGLE but SYSTEM
        assert!(!Kind::SECTION.is_page());
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(Kind::parse("section"), Some(Kind::SECTION));
        assert_eq!(Kind::parse("term"), Some(Kind::TERM));
        assert_eq!(Kind::parse("bogus"), None);
    }

    #[test]
    fn test_names_most_specific_first() {
        let names = Kind::TERM.names();
        assert_eq!(names.first(), Some(&"term"));
        assert!(names.contains(&"list"));
        assert!(names.contains(&"page"));
    }

    #[test]
    fn test_names_plain_page() {
        assert_eq!(Kind::PAGE.names(), vec!["page"]);
    }
}
