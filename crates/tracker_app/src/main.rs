use std::sync::Arc;

use tracker_app::analytics::TracingAnalytics;
use tracker_app::logging::init_tracing;
use tracker_app::{AppConfig, Session};

fn main() {
    let config = AppConfig::from_env().unwrap_or_default();
    init_tracing(&config);
    config.report();
    if let Err(err) = run(config) {
        tracing::error!(err = %format!("{err:#}"), "tracker session failed");
        std::process::exit(1);
    }
}

/// Prints the trackers due today as JSON.
fn run(config: AppConfig) -> anyhow::Result<()> {
    let session = Session::start(config)?;
    let screen = session.trackers_screen(Arc::new(TracingAnalytics));
    let snapshot = screen.open();
    let sections = screen.sections();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "date": snapshot.date,
            "empty_state": snapshot.empty_state(),
            "sections": sections,
        }))?
    );
    screen.close();
    session.save()
}
