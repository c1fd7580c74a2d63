//! Markdown conversion.
//!
//! Thin wrappers around `pulldown-cmark`. Conversion is treated as total:
//! any input produces output, there is no error path for the pipeline to
//! handle.

use pulldown_cmark::{Event, Options, Parser, html};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render a Markdown body to an HTML fragment.
pub fn to_html(body: &str) -> String {
    let parser = Parser::new_ext(body, options());
    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Strip a Markdown body down to its plain text.
///
/// Emits text and code content with soft/hard breaks as spaces; markup
/// structure is dropped.
pub fn to_plain_text(body: &str) -> String {
    let parser = Parser::new_ext(body, options());
    let mut out = String::with_capacity(body.len());

    for event in parser {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(_) => {
                // Keep block boundaries from gluing words together.
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Count the words of the Markdown-stripped plain text.
///
/// Tokens are split on whitespace and punctuation; empty tokens are not
/// counted.
pub fn word_count(body: &str) -> usize {
    to_plain_text(body)
        .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '\''))
        .filter(|t| !t.is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_html_paragraph() {
        let out = to_html("hello *world*");
        assert!(out.contains("<p>"));
        assert!(out.contains("<em>world</em>"));
    }

    #[test]
    fn test_to_html_table_extension() {
        let out = to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(out.contains("<table>"));
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let out = to_plain_text("# Title\n\nsome *emphasis* and `code`");
        assert!(out.contains("Title"));
        assert!(out.contains("emphasis"));
        assert!(out.contains("code"));
        assert!(!out.contains('#'));
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_word_count_basic() {
        assert_eq!(word_count("one two three"), 3);
    }

    #[test]
    fn test_word_count_markup_not_counted() {
        // "# Heading" is one word once markup is stripped
        assert_eq!(word_count("# Heading\n\n*two* words."), 3);
    }

    #[test]
    fn test_word_count_empty() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\n"), 0);
    }

    #[test]
    fn test_word_count_keeps_contractions() {
        assert_eq!(word_count("don't stop"), 2);
    }
}
