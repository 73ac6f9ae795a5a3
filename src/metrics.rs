// src/metrics.rs
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

/// Install the Prometheus recorder and describe the series the relay
/// records (so they show up on the scrape endpoint before first use).
/// The exporter serves its own listener; the relay has no HTTP surface
/// of its own.
pub fn init() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        PrometheusBuilder::new()
            .install()
            .expect("prometheus: install recorder");

        describe_counter!(
            "relay_candidates_total",
            "Candidates extracted from source pages."
        );
        describe_counter!(
            "relay_new_articles_total",
            "Articles that passed the dedup store."
        );
        describe_counter!(
            "relay_dispatched_total",
            "Messages posted to the dispatch sink."
        );
        describe_counter!(
            "relay_scheduler_failures_total",
            "Scheduler runs that ended in error."
        );
        describe_counter!("relay_ticks_total", "Manager ticks completed.");
        describe_gauge!(
            "relay_last_tick_ts",
            "Unix ts when the manager last completed a tick."
        );
    });
}
