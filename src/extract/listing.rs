// src/extract/listing.rs
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;

use super::{normalize_title, ArticleExtractor};
use crate::article::PartialArticle;

/// Boilerplate marker some account mirror pages prefix onto original
/// posts; it is presentation, not part of the title.
const ORIGINAL_MARKER: &str = "原创";

/// Candidate extraction from an HTML listing page: one candidate per
/// `<div class="...">` block of the configured class that contains an
/// anchor. This is the shape social-media account mirror pages use, where
/// every anchor is a redirect seed pointing through the platform's
/// link service.
pub struct ListingExtractor {
    item_re: Regex,
}

impl ListingExtractor {
    pub fn new(item_class: &str) -> Result<Self> {
        let pattern = format!(
            r#"(?is)<div[^>]*class="[^"]*\b{}\b[^"]*"[^>]*>(.*?)</div>"#,
            regex::escape(item_class)
        );
        let item_re = Regex::new(&pattern)
            .with_context(|| format!("listing item pattern for class {item_class}"))?;
        Ok(Self { item_re })
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        // The "title" class is the layout every supported mirror page uses.
        Self::new("title").unwrap()
    }
}

impl ArticleExtractor for ListingExtractor {
    fn extract(&self, page: &str) -> Result<Vec<PartialArticle>> {
        static RE_HREF: OnceCell<Regex> = OnceCell::new();
        let re_href =
            RE_HREF.get_or_init(|| Regex::new(r#"(?is)<a[^>]*href="([^"]+)""#).unwrap());

        let mut out = Vec::new();
        for block in self.item_re.captures_iter(page) {
            let inner = &block[1];
            let Some(href) = re_href.captures(inner) else {
                continue;
            };
            let title = normalize_title(&inner.replace(ORIGINAL_MARKER, ""));
            if title.is_empty() {
                continue;
            }
            out.push(PartialArticle {
                title,
                seed_url: href[1].to_string(),
            });
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "listing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
      <div class="weui_media_bd title">
        <a href="https://l.example/r?k=1">原创 深度学习周报</a>
      </div>
      <div class="title"><a href="https://l.example/r?k=2"><span>Plain title</span></a></div>
      <div class="title">no anchor in this one</div>
      <div class="footer"><a href="https://l.example/about">About</a></div>
    </body></html>"#;

    #[test]
    fn extracts_anchored_title_blocks_only() {
        let out = ListingExtractor::default().extract(PAGE).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "深度学习周报");
        assert_eq!(out[0].seed_url, "https://l.example/r?k=1");
        assert_eq!(out[1].title, "Plain title");
    }

    #[test]
    fn page_without_items_yields_empty() {
        let out = ListingExtractor::default().extract("<html></html>").unwrap();
        assert!(out.is_empty());
    }
}
