// src/extract/mod.rs
pub mod listing;
pub mod rss;

use anyhow::Result;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::article::PartialArticle;

/// Per-source "extract candidate articles from a page" capability.
/// Pure over the page content; fetching happens upstream.
pub trait ArticleExtractor: Send + Sync {
    fn extract(&self, page: &str) -> Result<Vec<PartialArticle>>;
    fn name(&self) -> &str;
}

/// Normalize a candidate title: decode entities, strip tags, collapse
/// whitespace.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}
