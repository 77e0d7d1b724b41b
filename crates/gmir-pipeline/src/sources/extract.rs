//! Tolerant structural scanning of RSS `<item>` and Atom `<entry>` blocks.
//!
//! Feeds in the wild are frequently malformed, so this deliberately avoids a
//! strict XML parse: each block is located by pattern and its title and link
//! are pulled out independently. A broken document yields fewer articles, not
//! an error.

use std::sync::LazyLock;

use gmir_core::Source;
use regex::Regex;

use crate::types::Article;

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<item[\s>](.*?)</item>").expect("valid item regex"));
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<entry[\s>](.*?)</entry>").expect("valid entry regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static LINK_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link(?:\s[^>]*)?>(.*?)</link>").expect("valid link regex"));
static LINK_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b[^>]*?\bhref\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
});
static CDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid cdata regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));

/// Extracts every article with a non-empty title and link from `body`.
///
/// RSS items are preferred; Atom entries are only scanned when the document
/// has no `<item>` blocks at all.
pub(crate) fn extract_articles(body: &str, source: &Source) -> Vec<Article> {
    let mut blocks: Vec<&str> = ITEM_RE
        .captures_iter(body)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect();
    if blocks.is_empty() {
        blocks = ENTRY_RE
            .captures_iter(body)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .collect();
    }

    blocks
        .into_iter()
        .filter_map(|block| {
            let title = extract_title(block);
            let link = extract_link(block);
            if title.is_empty() || link.is_empty() {
                return None;
            }
            Some(Article {
                title,
                link,
                source_name: source.name.clone(),
                region: source.region_hint,
            })
        })
        .collect()
}

fn extract_title(block: &str) -> String {
    TITLE_RE
        .captures(block)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .unwrap_or_default()
}

fn extract_link(block: &str) -> String {
    let text = LINK_TEXT_RE
        .captures(block)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .unwrap_or_default();
    if !text.is_empty() {
        return text;
    }
    LINK_HREF_RE
        .captures(block)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .unwrap_or_default()
}

/// Unwraps CDATA, decodes entities, strips markup and collapses whitespace.
fn clean_text(raw: &str) -> String {
    let unwrapped = CDATA_RE.replace_all(raw, "$1");
    let decoded = match quick_xml::escape::unescape(&unwrapped) {
        Ok(text) => text.into_owned(),
        Err(_) => unwrapped.into_owned(),
    };
    let no_tags = TAG_RE.replace_all(&decoded, " ");
    no_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}
