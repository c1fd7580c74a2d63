//! YAML front matter parsing and cascade merging.
//!
//! The textual split-and-parse is delegated to `gray_matter`; this module
//! owns the structured [`FrontMatter`] record, the catch-all params bag,
//! and the cascade merge rule used during scanning.

use crate::utils::date::parse_date;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use gray_matter::{Matter, engine::YAML};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Dynamic value for the catch-all params bag.
pub type ParamValue = serde_json::Value;

/// A resource declared explicitly in front matter.
///
/// Matched by `src` against files discovered in the bundle; supplies the
/// display metadata the file itself cannot carry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceDef {
    pub src: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

/// Structured front matter record, immutable after parsing.
///
/// Unknown fields land in `params`. The `section` field is never read from
/// YAML; the scanner derives it from the file's path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,

    /// Content type, used in template lookup. Defaults to the enclosing
    /// section name when absent.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,

    /// Explicit kind override (`page`, `section`, ...). Rarely set; only an
    /// explicit index file can meaningfully use it.
    #[serde(default)]
    pub kind: Option<String>,

    /// Permalink template. A literal path or a template referencing
    /// `page.*` / `site.*`; overrides the default permalink entirely.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Enclosing section name, derived from the path during scanning.
    #[serde(skip)]
    pub section: String,

    #[serde(default, deserialize_with = "de_date")]
    pub date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de_date")]
    pub lastmod: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de_date")]
    pub publish_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de_date")]
    pub expiry_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub weight: i64,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub resources: Vec<ResourceDef>,

    /// Front matter to merge into every descendant content source.
    #[serde(default)]
    pub cascade: Option<Box<FrontMatter>>,

    /// Catch-all for fields with no dedicated slot above.
    #[serde(flatten)]
    pub params: BTreeMap<String, ParamValue>,
}

impl FrontMatter {
    /// Merge this record (acting as a cascade) into `child`.
    ///
    /// Any non-default field on the child wins; otherwise the cascade value
    /// is used. `params` replace wholesale when the child's map is
    /// non-empty. The child's own `cascade` is kept as-is; the scanner
    /// decides which cascade propagates further down.
    pub fn merge_into(&self, child: &mut FrontMatter) {
        merge_opt(&mut child.title, &self.title);
        merge_opt(&mut child.type_name, &self.type_name);
        merge_opt(&mut child.kind, &self.kind);
        merge_opt(&mut child.url, &self.url);
        merge_opt(&mut child.date, &self.date);
        merge_opt(&mut child.lastmod, &self.lastmod);
        merge_opt(&mut child.publish_date, &self.publish_date);
        merge_opt(&mut child.expiry_date, &self.expiry_date);

        child.draft = child.draft || self.draft;
        if child.weight == 0 {
            child.weight = self.weight;
        }
        if child.aliases.is_empty() {
            child.aliases = self.aliases.clone();
        }
        if child.tags.is_empty() {
            child.tags = self.tags.clone();
        }
        if child.resources.is_empty() {
            child.resources = self.resources.clone();
        }
        if child.params.is_empty() {
            child.params = self.params.clone();
        }
    }
}

fn merge_opt<T: Clone>(child: &mut Option<T>, cascade: &Option<T>) {
    if child.is_none() {
        *child = cascade.clone();
    }
}

/// Accept a date either as a YAML string or as nothing at all.
fn de_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
    }
}

/// Split a source file into front matter and body.
///
/// A file without a front matter block yields a default record and the
/// full text as body. Malformed YAML is an error; the scanner logs it and
/// skips the file.
pub fn parse(text: &str) -> Result<(FrontMatter, String)> {
    let matter = Matter::<YAML>::new();
    let parsed = matter.parse(text);

    let front = match parsed.data {
        Some(pod) => pod
            .deserialize::<FrontMatter>()
            .map_err(|e| anyhow!("{e}"))
            .context("malformed front matter")?,
        None => FrontMatter::default(),
    };

    Ok((front, parsed.content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse_ok(text: &str) -> (FrontMatter, String) {
        parse(text).unwrap()
    }

    #[test]
    fn test_parse_basic_fields() {
        let (front, body) = parse_ok(
            "---\ntitle: Post 1\ndraft: true\nweight: 5\ntags: [a, b]\n---\nbody text\n",
        );
        assert_eq!(front.title.as_deref(), Some("Post 1"));
        assert!(front.draft);
        assert_eq!(front.weight, 5);
        assert_eq!(front.tags, vec!["a", "b"]);
        assert_eq!(body.trim(), "body text");
    }

    #[test]
    fn test_parse_without_front_matter() {
        let (front, body) = parse_ok("just a body\n");
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body.trim(), "just a body");
    }

    #[test]
    fn test_parse_dates() {
        let (front, _) = parse_ok("---\ndate: 2024-05-01\npublish_date: 2024-06-01T12:00:00Z\n---\n");
        assert_eq!(
            front.date,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            front.publish_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_invalid_date_is_error() {
        assert!(parse("---\ndate: yesterday\n---\n").is_err());
    }

    #[test]
    fn test_unknown_fields_land_in_params() {
        let (front, _) = parse_ok("---\ntitle: T\ncustom: 42\nflag: true\n---\n");
        assert_eq!(front.params.get("custom"), Some(&ParamValue::from(42)));
        assert_eq!(front.params.get("flag"), Some(&ParamValue::from(true)));
        assert!(!front.params.contains_key("title"));
    }

    #[test]
    fn test_parse_cascade_block() {
        let (front, _) = parse_ok("---\ncascade:\n  type: gallery\n  weight: 3\n---\n");
        let cascade = front.cascade.unwrap();
        assert_eq!(cascade.type_name.as_deref(), Some("gallery"));
        assert_eq!(cascade.weight, 3);
    }

    #[test]
    fn test_merge_child_wins() {
        let cascade = FrontMatter {
            type_name: Some("gallery".into()),
            weight: 3,
            tags: vec!["inherited".into()],
            ..Default::default()
        };
        let mut child = FrontMatter {
            type_name: Some("post".into()),
            weight: 7,
            ..Default::default()
        };
        cascade.merge_into(&mut child);

        assert_eq!(child.type_name.as_deref(), Some("post"));
        assert_eq!(child.weight, 7);
        // empty on the child, so inherited
        assert_eq!(child.tags, vec!["inherited".to_string()]);
    }

    #[test]
    fn test_merge_params_replace_wholesale() {
        let mut cascade_params = BTreeMap::new();
        cascade_params.insert("a".to_string(), ParamValue::from(1));
        cascade_params.insert("b".to_string(), ParamValue::from(2));
        let cascade = FrontMatter {
            params: cascade_params,
            ..Default::default()
        };

        // Non-empty child params: cascade params are ignored entirely.
        let mut child = FrontMatter::default();
        child.params.insert("c".to_string(), ParamValue::from(3));
        cascade.merge_into(&mut child);
        assert_eq!(child.params.len(), 1);
        assert!(child.params.contains_key("c"));

        // Empty child params: cascade map is taken as a whole.
        let mut child = FrontMatter::default();
        cascade.merge_into(&mut child);
        assert_eq!(child.params.len(), 2);
    }

    #[test]
    fn test_merge_draft_inherited() {
        let cascade = FrontMatter {
            draft: true,
            ..Default::default()
        };
        let mut child = FrontMatter::default();
        cascade.merge_into(&mut child);
        assert!(child.draft);
    }

    #[test]
    fn test_resource_defs() {
        let (front, _) = parse_ok(
            "---\nresources:\n  - src: photo.jpg\n    title: A photo\n---\n",
        );
        assert_eq!(front.resources.len(), 1);
        assert_eq!(front.resources[0].src, "photo.jpg");
        assert_eq!(front.resources[0].title.as_deref(), Some("A photo"));
    }
}
