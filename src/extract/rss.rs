// src/extract/rss.rs
use anyhow::{Context, Result};
use quick_xml::de::from_str;
use serde::Deserialize;

use super::{normalize_title, ArticleExtractor};
use crate::article::PartialArticle;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

/// Candidate extraction from an RSS `<channel>`: one candidate per `<item>`
/// carrying both a title and a link. The link is still a redirect seed for
/// feeds that route through shorteners.
pub struct RssExtractor;

impl ArticleExtractor for RssExtractor {
    fn extract(&self, page: &str) -> Result<Vec<PartialArticle>> {
        let xml = scrub_html_entities_for_xml(page);
        let rss: Rss = from_str(&xml).context("parsing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let (Some(title), Some(link)) = (it.title, it.link) else {
                continue;
            };
            let title = normalize_title(&title);
            if title.is_empty() {
                continue;
            }
            out.push(PartialArticle {
                title,
                seed_url: link,
            });
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "rss"
    }
}

// Feeds routinely embed HTML entities quick-xml refuses; swap the common
// ones before parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
