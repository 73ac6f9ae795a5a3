// src/resolve.rs
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::article::{Article, PartialArticle};
use crate::fetch::PageFetch;

#[derive(Debug, Clone, Copy)]
pub struct ResolveCfg {
    /// Extra fetch attempts after the first one.
    pub max_retries: u32,
    /// Pause between consecutive attempts on one URL.
    pub delay: Duration,
    /// Worker cap for one source's batch.
    pub concurrency: usize,
}

impl Default for ResolveCfg {
    fn default() -> Self {
        Self {
            max_retries: 20,
            delay: Duration::from_millis(500),
            concurrency: 20,
        }
    }
}

/// Walk redirects from `seed` until the URL contains `pattern` or the
/// budget runs out. Best effort: always returns the last URL reached,
/// never an error. A failed fetch consumes a retry and keeps the last
/// good URL.
pub async fn resolve_url(
    fetcher: &dyn PageFetch,
    seed: &str,
    pattern: &str,
    max_retries: u32,
    delay: Duration,
) -> String {
    let mut url = seed.to_string();
    let mut budget = i64::from(max_retries);
    let mut first = true;
    while budget >= 0 && !url.contains(pattern) {
        if !first {
            tokio::time::sleep(delay).await;
        }
        first = false;
        budget -= 1;
        match fetcher.fetch(&url).await {
            Ok(resp) => url = resp.final_url,
            Err(e) => {
                debug!(url = %url, error = %e, "resolve fetch failed; retry consumed");
            }
        }
    }
    url
}

/// Resolve one source's candidates in parallel, bounded by
/// `cfg.concurrency`. Output has the same length and index order as the
/// input no matter which resolutions finish first; an exhausted budget
/// leaves that article on whatever URL it last reached.
pub async fn resolve_candidates(
    fetcher: Arc<dyn PageFetch>,
    source: &str,
    pattern: &str,
    candidates: Vec<PartialArticle>,
    cfg: ResolveCfg,
) -> Vec<Article> {
    let mut resolved: Vec<(usize, Article)> =
        stream::iter(candidates.into_iter().enumerate())
            .map(|(i, cand)| {
                let fetcher = Arc::clone(&fetcher);
                let source = source.to_string();
                let pattern = pattern.to_string();
                async move {
                    let url = resolve_url(
                        fetcher.as_ref(),
                        &cand.seed_url,
                        &pattern,
                        cfg.max_retries,
                        cfg.delay,
                    )
                    .await;
                    (i, Article::new(cand.title, source, url))
                }
            })
            .buffer_unordered(cfg.concurrency.max(1))
            .collect()
            .await;

    resolved.sort_by_key(|(i, _)| *i);
    resolved.into_iter().map(|(_, article)| article).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResponse;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted fetcher: every fetch lands on `target` and counts calls.
    struct HopFetcher {
        target: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetch for HopFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResponse {
                status: 200,
                final_url: self.target.clone(),
                body: String::new(),
            })
        }
    }

    struct FailingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetch for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("connection reset"))
        }
    }

    #[tokio::test]
    async fn zero_retries_means_exactly_one_fetch() {
        let fetcher = HopFetcher {
            target: "https://articles.example/post/1".into(),
            calls: AtomicUsize::new(0),
        };
        let url = resolve_url(
            &fetcher,
            "https://t.co/abc",
            "articles.example",
            0,
            Duration::ZERO,
        )
        .await;
        assert_eq!(url, "https://articles.example/post/1");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn canonical_seed_is_returned_without_fetching() {
        let fetcher = HopFetcher {
            target: "https://elsewhere.example/x".into(),
            calls: AtomicUsize::new(0),
        };
        let url = resolve_url(
            &fetcher,
            "https://articles.example/post/2",
            "articles.example",
            5,
            Duration::ZERO,
        )
        .await;
        assert_eq!(url, "https://articles.example/post/2");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_errors_consume_budget_and_keep_last_url() {
        let fetcher = FailingFetcher {
            calls: AtomicUsize::new(0),
        };
        let url = resolve_url(
            &fetcher,
            "https://t.co/dead",
            "articles.example",
            2,
            Duration::ZERO,
        )
        .await;
        assert_eq!(url, "https://t.co/dead");
        // budget of 2 retries on top of the first attempt
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }
}
