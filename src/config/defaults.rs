//! Default values for configuration fields.
//!
//! Kept in one place so serde defaults and `educe(Default)` expressions
//! stay in sync.

pub mod base {
    pub fn author() -> String {
        "<YOUR_NAME>".to_string()
    }

    pub fn language() -> String {
        "en-US".to_string()
    }

    pub fn url() -> Option<String> {
        None
    }
}

pub mod build {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    pub fn content() -> PathBuf {
        PathBuf::from("content")
    }

    pub fn output() -> PathBuf {
        PathBuf::from("public")
    }

    pub fn templates() -> PathBuf {
        PathBuf::from("templates")
    }

    pub fn minify() -> bool {
        false
    }

    /// Every kind renders to html unless the config says otherwise.
    pub fn formats() -> BTreeMap<String, Vec<String>> {
        ["home", "section", "taxonomy", "term", "page"]
            .into_iter()
            .map(|kind| (kind.to_string(), vec!["html".to_string()]))
            .collect()
    }
}

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".to_string()
    }

    pub fn port() -> u16 {
        4277
    }

    pub fn watch() -> bool {
        true
    }
}
