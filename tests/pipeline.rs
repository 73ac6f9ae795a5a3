// tests/pipeline.rs
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use feed_relay::article::{fingerprint, PartialArticle};
use feed_relay::extract::ArticleExtractor;
use feed_relay::fetch::{FetchResponse, PageFetch};
use feed_relay::pipeline::{SourceDescriptor, SourcePipeline};
use feed_relay::resolve::ResolveCfg;
use feed_relay::store::{DedupStore, MemoryStore};

struct StaticPageFetcher;

#[async_trait]
impl PageFetch for StaticPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        Ok(FetchResponse {
            status: 200,
            final_url: url.to_string(),
            body: "<listing page>".to_string(),
        })
    }
}

/// Extractor scripted with fixed candidates; seed URLs are already
/// canonical so the resolution stage performs no fetches.
struct ScriptedExtractor {
    titles: Vec<&'static str>,
}

impl ArticleExtractor for ScriptedExtractor {
    fn extract(&self, _page: &str) -> Result<Vec<PartialArticle>> {
        Ok(self
            .titles
            .iter()
            .map(|t| PartialArticle {
                title: t.to_string(),
                seed_url: format!("https://canon.example/{t}"),
            })
            .collect())
    }
    fn name(&self) -> &str {
        "scripted"
    }
}

fn pipeline(titles: Vec<&'static str>, store: Arc<MemoryStore>) -> SourcePipeline {
    let descriptor = SourceDescriptor {
        name: "hub".to_string(),
        main_url: "https://hub.example/latest".to_string(),
        url_pattern: "canon.example".to_string(),
        dedup_namespace: "hub".to_string(),
    };
    SourcePipeline::new(
        descriptor,
        Arc::new(StaticPageFetcher),
        Box::new(ScriptedExtractor { titles }),
        store,
        ResolveCfg {
            max_retries: 0,
            delay: std::time::Duration::ZERO,
            concurrency: 4,
        },
    )
}

#[tokio::test]
async fn unseen_candidates_come_back_new_and_ordered() {
    let store = Arc::new(MemoryStore::new());
    let p = pipeline(vec!["A", "B", "C"], Arc::clone(&store));

    let (new, all) = p.run().await.unwrap();
    let titles: Vec<&str> = new.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert_eq!(new, all);
    assert_eq!(all[1].uid, fingerprint("hub", "B"));
    assert_eq!(all[1].url, "https://canon.example/B");
}

#[tokio::test]
async fn second_run_over_unchanged_content_yields_nothing_new() {
    let store = Arc::new(MemoryStore::new());
    let p = pipeline(vec!["A", "B", "C"], Arc::clone(&store));

    let (new, all) = p.run().await.unwrap();
    assert_eq!(new.len(), 3);
    store.save("hub", &all).await.unwrap();

    let (new2, all2) = p.run().await.unwrap();
    assert!(new2.is_empty());
    assert_eq!(all2.len(), 3);
}

#[tokio::test]
async fn partially_seen_content_returns_only_the_unseen_rest() {
    let store = Arc::new(MemoryStore::new());
    let first = pipeline(vec!["A"], Arc::clone(&store));
    let (_, all) = first.run().await.unwrap();
    store.save("hub", &all).await.unwrap();

    let second = pipeline(vec!["A", "B"], Arc::clone(&store));
    let (new, all) = second.run().await.unwrap();
    assert_eq!(new.len(), 1);
    assert_eq!(new[0].title, "B");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn empty_extraction_is_not_an_error() {
    let store = Arc::new(MemoryStore::new());
    let p = pipeline(vec![], store);
    let (new, all) = p.run().await.unwrap();
    assert!(new.is_empty());
    assert!(all.is_empty());
}
