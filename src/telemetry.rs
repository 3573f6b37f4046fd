// src/telemetry.rs
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder is installed).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "headline_pages_total",
            "News search pages requested from the provider."
        );
        describe_counter!(
            "headlines_fetched_total",
            "Headlines kept after pagination."
        );
        describe_counter!("story_fetch_total", "Story bodies requested.");
        describe_counter!(
            "story_fetch_errors_total",
            "Story bodies that could not be retrieved."
        );
        describe_counter!("social_rows_total", "ESG social-score rows received.");
        describe_counter!("provider_errors_total", "Provider request failures.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when a sector run last finished."
        );
    });
}
