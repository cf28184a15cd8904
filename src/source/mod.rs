//! Bulletin sources.
//!
//! A source yields the raw bulletin text: the content of the page's `<pre>`
//! block with all markup removed.

pub mod file;
pub mod http;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::SourceConfig;

pub use file::FileBulletinSource;
pub use http::HttpBulletinSource;

/// Trait for bulletin providers.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    /// Human-readable origin, used in logs and errors.
    fn name(&self) -> String;

    /// Retrieve the current bulletin text.
    async fn fetch(&self) -> Result<String>;
}

/// Build the source selected by configuration.
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn BulletinSource>> {
    match &config.file {
        Some(path) => Ok(Box::new(FileBulletinSource::new(path))),
        None => Ok(Box::new(HttpBulletinSource::new(config)?)),
    }
}

/// Strip markup from a bulletin page.
///
/// Returns the text of the first `<pre>` element, or the body unchanged when
/// it has none (already plain text).
pub fn extract_bulletin_text(body: &str) -> String {
    let lower = body.to_ascii_lowercase();
    let Some(tag_start) = lower.find("<pre") else {
        return body.to_string();
    };

    let document = Html::parse_document(body);
    let Ok(pre) = Selector::parse("pre") else {
        return body.to_string();
    };
    let Some(text) = document
        .select(&pre)
        .next()
        .map(|element| element.text().collect::<String>())
    else {
        return body.to_string();
    };

    // The HTML parser drops a newline directly after `<pre>`; restore it so
    // line numbers match the page source the row layout is defined against.
    if opens_with_newline(&body[tag_start..]) {
        format!("\n{text}")
    } else {
        text
    }
}

fn opens_with_newline(from_tag: &str) -> bool {
    from_tag
        .find('>')
        .map(|end| &from_tag[end + 1..])
        .is_some_and(|rest| rest.starts_with('\n') || rest.starts_with("\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_pre_block() {
        let page = "<html><head><title>Son Depremler</title></head><body>\
                    <b>header</b><pre>line one\n<b>line two</b>\nline three</pre>\
                    <p>footer</p></body></html>";
        assert_eq!(
            extract_bulletin_text(page),
            "line one\nline two\nline three"
        );
    }

    #[test]
    fn test_leading_newline_is_kept() {
        let page = "<html><body><pre>\nheader\nrow</pre></body></html>";
        assert_eq!(extract_bulletin_text(page), "\nheader\nrow");
        assert_eq!(extract_bulletin_text(page).lines().count(), 3);
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "2024.01.01 10:00:00 38.00 27.00 5.0 -.- 4.2 -.- AEGEAN SEA";
        assert_eq!(extract_bulletin_text(text), text);
    }

    #[test]
    fn test_uppercase_pre_tag() {
        let page = "<HTML><BODY><PRE>row</PRE></BODY></HTML>";
        assert_eq!(extract_bulletin_text(page), "row");
    }
}
