// src/manager.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::fetch::PageFetch;
use crate::notify::DispatchSink;
use crate::pipeline::{SourceDescriptor, SourcePipeline};
use crate::resolve::ResolveCfg;
use crate::scheduler::{Cadence, SourceScheduler};
use crate::store::DedupStore;

const HEARTBEAT_EVERY_TICKS: u64 = 60;

/// Completion accounting for one manager tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub completed: usize,
    pub failed: usize,
    /// Schedulers still busy from an earlier tick.
    pub skipped: usize,
}

/// Owns the schedulers and drives them concurrently on a fixed tick.
/// One scheduler's failure is logged and contributes nothing that tick;
/// it never stops the others or the loop.
pub struct SchedulerManager {
    schedulers: Vec<(String, Arc<Mutex<SourceScheduler>>)>,
    tick_interval: Duration,
    ticks: u64,
}

impl SchedulerManager {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            schedulers: Vec::new(),
            tick_interval,
            ticks: 0,
        }
    }

    /// Build the whole roster from config over shared collaborators.
    pub fn from_config(
        cfg: &AppConfig,
        fetcher: Arc<dyn PageFetch>,
        store: Arc<dyn DedupStore>,
        sink: Arc<dyn DispatchSink>,
    ) -> Self {
        let resolve_cfg = ResolveCfg {
            max_retries: cfg.resolver.max_retries,
            delay: Duration::from_millis(cfg.resolver.delay_ms),
            concurrency: cfg.resolver.concurrency,
        };

        let mut manager = Self::new(Duration::from_secs(cfg.tick_interval_secs));
        for src in &cfg.sources {
            let descriptor = SourceDescriptor {
                name: src.name.clone(),
                main_url: src.main_url.clone(),
                url_pattern: src.url_pattern.clone(),
                dedup_namespace: src.dedup_namespace(),
            };
            let pipeline = SourcePipeline::new(
                descriptor,
                Arc::clone(&fetcher),
                src.extractor.build(),
                Arc::clone(&store),
                resolve_cfg,
            );
            manager.add(SourceScheduler::new(
                pipeline,
                Arc::clone(&store),
                Arc::clone(&sink),
                src.post_mode,
                Cadence {
                    run_every_ticks: src.run_every_ticks,
                    flush_every_ticks: src.flush_every_ticks,
                },
            ));
        }
        manager
    }

    pub fn add(&mut self, scheduler: SourceScheduler) -> &mut Self {
        let name = scheduler.name().to_string();
        self.schedulers.push((name, Arc::new(Mutex::new(scheduler))));
        self
    }

    pub fn len(&self) -> usize {
        self.schedulers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedulers.is_empty()
    }

    /// One manager tick: spawn every scheduler concurrently, then wait for
    /// all of them, logging each failure by source. A scheduler whose
    /// previous run is still in flight is skipped, not run twice.
    pub async fn run_once(&mut self) -> TickReport {
        self.ticks += 1;

        let mut tasks = JoinSet::new();
        for (name, sched) in &self.schedulers {
            let name = name.clone();
            let sched = Arc::clone(sched);
            tasks.spawn(async move {
                match sched.try_lock() {
                    Ok(mut guard) => (name, Some(guard.tick().await)),
                    Err(_) => (name, None),
                }
            });
        }

        let mut report = TickReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Some(Ok(())))) => report.completed += 1,
                Ok((name, Some(Err(e)))) => {
                    report.failed += 1;
                    counter!("relay_scheduler_failures_total").increment(1);
                    warn!(scheduler = %name, "scheduler run failed: {e:#}");
                }
                Ok((name, None)) => {
                    report.skipped += 1;
                    info!(scheduler = %name, "still running; skipped this tick");
                }
                Err(e) => {
                    report.failed += 1;
                    counter!("relay_scheduler_failures_total").increment(1);
                    error!("scheduler task panicked: {e}");
                }
            }
        }

        counter!("relay_ticks_total").increment(1);
        gauge!("relay_last_tick_ts").set(chrono::Utc::now().timestamp() as f64);

        if self.ticks % HEARTBEAT_EVERY_TICKS == 0 {
            info!(
                tick = self.ticks,
                schedulers = self.schedulers.len(),
                completed = report.completed,
                failed = report.failed,
                skipped = report.skipped,
                "manager heartbeat"
            );
        }
        report
    }

    /// Tick forever. Termination is external to the process.
    pub async fn run(mut self) {
        info!(
            schedulers = self.schedulers.len(),
            interval = ?self.tick_interval,
            "scheduler manager running"
        );
        let mut ticker = tokio::time::interval(self.tick_interval);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }
}
