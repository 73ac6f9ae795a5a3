// src/pipeline.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::counter;
use tracing::debug;

use crate::article::Article;
use crate::extract::ArticleExtractor;
use crate::fetch::PageFetch;
use crate::resolve::{self, ResolveCfg};
use crate::store::DedupStore;

/// Where a source is fetched from and how its dedup entries are
/// namespaced. Built once from config, read-only afterwards.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: String,
    pub main_url: String,
    /// Substring that marks a resolved URL as canonical for this source.
    pub url_pattern: String,
    pub dedup_namespace: String,
}

/// One source's fetch → extract → resolve → dedup-partition run.
pub struct SourcePipeline {
    pub descriptor: SourceDescriptor,
    fetcher: Arc<dyn PageFetch>,
    extractor: Box<dyn ArticleExtractor>,
    store: Arc<dyn DedupStore>,
    resolve_cfg: ResolveCfg,
}

impl SourcePipeline {
    pub fn new(
        descriptor: SourceDescriptor,
        fetcher: Arc<dyn PageFetch>,
        extractor: Box<dyn ArticleExtractor>,
        store: Arc<dyn DedupStore>,
        resolve_cfg: ResolveCfg,
    ) -> Self {
        Self {
            descriptor,
            fetcher,
            extractor,
            store,
            resolve_cfg,
        }
    }

    /// Returns `(new, all)`: the articles whose fingerprint the store has
    /// not seen, and the full resolved set. The caller persists `all`
    /// regardless of what gets posted, so the store converges even when
    /// dispatch fails. Does not write the store itself; re-running over
    /// unchanged content after a save yields `new == []`.
    pub async fn run(&self) -> Result<(Vec<Article>, Vec<Article>)> {
        let d = &self.descriptor;

        let page = self
            .fetcher
            .fetch(&d.main_url)
            .await
            .with_context(|| format!("fetching {}", d.main_url))?;
        let candidates = self
            .extractor
            .extract(&page.body)
            .with_context(|| format!("extracting candidates for {}", d.name))?;
        counter!("relay_candidates_total").increment(candidates.len() as u64);

        if candidates.is_empty() {
            debug!(source = %d.name, "no candidates on page");
            return Ok((Vec::new(), Vec::new()));
        }

        let all = resolve::resolve_candidates(
            Arc::clone(&self.fetcher),
            &d.name,
            &d.url_pattern,
            candidates,
            self.resolve_cfg,
        )
        .await;

        let mut new = Vec::with_capacity(all.len());
        for article in &all {
            if !self.store.contains(&d.dedup_namespace, &article.uid).await? {
                new.push(article.clone());
            }
        }
        counter!("relay_new_articles_total").increment(new.len() as u64);
        debug!(source = %d.name, total = all.len(), new = new.len(), "pipeline run complete");
        Ok((new, all))
    }
}
