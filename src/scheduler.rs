// src/scheduler.rs
use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use metrics::counter;
use serde::Deserialize;
use tracing::info;

use crate::article::Article;
use crate::notify::DispatchSink;
use crate::pipeline::SourcePipeline;
use crate::store::DedupStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostMode {
    /// Dispatch each new article in the tick it was found.
    #[default]
    Immediate,
    /// Accumulate new articles and flush the buffer on its own cadence,
    /// desyncing outbound posts across many sources.
    Deferred,
}

#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    /// Run the pipeline every Nth manager tick.
    pub run_every_ticks: u64,
    /// DEFERRED only: flush the buffer every Nth manager tick.
    pub flush_every_ticks: u64,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            run_every_ticks: 1,
            flush_every_ticks: 10,
        }
    }
}

/// Per-source scheduler: cadence gating, the accumulation buffer, and the
/// persist-before-dispatch ordering. Owned state; the manager serializes
/// access so at most one run per source is in flight.
pub struct SourceScheduler {
    pipeline: SourcePipeline,
    store: Arc<dyn DedupStore>,
    sink: Arc<dyn DispatchSink>,
    post_mode: PostMode,
    cadence: Cadence,
    buffer: VecDeque<Article>,
    ticks: u64,
}

impl SourceScheduler {
    pub fn new(
        pipeline: SourcePipeline,
        store: Arc<dyn DedupStore>,
        sink: Arc<dyn DispatchSink>,
        post_mode: PostMode,
        cadence: Cadence,
    ) -> Self {
        Self {
            pipeline,
            store,
            sink,
            post_mode,
            cadence,
            buffer: VecDeque::new(),
            ticks: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.pipeline.descriptor.name
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// One manager tick's worth of work for this source.
    pub async fn tick(&mut self) -> Result<()> {
        self.ticks += 1;
        if self.ticks % self.cadence.run_every_ticks == 0 {
            self.run().await?;
        }
        if self.post_mode == PostMode::Deferred
            && !self.buffer.is_empty()
            && self.ticks % self.cadence.flush_every_ticks == 0
        {
            self.flush().await?;
        }
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        let (new, all) = self.pipeline.run().await?;
        if new.is_empty() {
            info!(source = %self.name(), "no new articles");
            return Ok(());
        }

        // Mark the whole resolved set seen before any dispatch attempt: a
        // failed post is dropped, never re-sent as a duplicate next run.
        self.store
            .save(&self.pipeline.descriptor.dedup_namespace, &all)
            .await?;

        info!(source = %self.name(), count = new.len(), mode = ?self.post_mode, "new articles");
        match self.post_mode {
            PostMode::Immediate => {
                for article in &new {
                    self.sink.post(&article.telegram_format()).await?;
                    counter!("relay_dispatched_total").increment(1);
                }
                self.buffer.clear();
            }
            PostMode::Deferred => {
                self.buffer.extend(new);
            }
        }
        Ok(())
    }

    /// Post the whole buffer in one pass. A mid-pass failure leaves the
    /// unsent remainder buffered for the next flush.
    async fn flush(&mut self) -> Result<()> {
        info!(source = %self.name(), buffered = self.buffer.len(), "flushing deferred buffer");
        while let Some(article) = self.buffer.front() {
            let message = article.telegram_format();
            self.sink.post(&message).await?;
            counter!("relay_dispatched_total").increment(1);
            self.buffer.pop_front();
        }
        Ok(())
    }
}
