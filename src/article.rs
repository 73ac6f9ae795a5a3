// src/article.rs
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A fully resolved article as it flows through dedup and dispatch.
/// Immutable once constructed; a new value replaces the partial form
/// when resolution completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub uid: String,
    pub source: String,
    pub url: String,
}

/// Extractor output before URL resolution: title known, url still a
/// redirect seed, uid not yet computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialArticle {
    pub title: String,
    pub seed_url: String,
}

/// Dedup key for a (source, title) pair. The source prefix keeps two
/// sources publishing identically titled items from colliding.
pub fn fingerprint(source: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b":");
    hasher.update(title.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Article {
    pub fn new(title: String, source: String, url: String) -> Self {
        let uid = fingerprint(&source, &title);
        Self {
            title,
            uid,
            source,
            url,
        }
    }

    /// Message layout for the dispatch sink: title, link, source hashtag.
    pub fn telegram_format(&self) -> String {
        let tag = self.source.replace(char::is_whitespace, "_");
        format!("{}\n{}\n#{}", self.title, self.url, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint("hub", "Rust 1.80 released");
        let b = fingerprint("hub", "Rust 1.80 released");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn fingerprint_separates_sources_with_same_title() {
        let a = fingerprint("hub", "Weekly digest");
        let b = fingerprint("planet", "Weekly digest");
        assert_ne!(a, b);
    }

    #[test]
    fn telegram_format_has_title_url_and_tag() {
        let art = Article::new(
            "Hello".into(),
            "my source".into(),
            "https://example.test/a".into(),
        );
        let msg = art.telegram_format();
        assert_eq!(msg, "Hello\nhttps://example.test/a\n#my_source");
    }
}
