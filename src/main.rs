//! ApiPulse - measurement engine demo harness.
//!
//! Wires the engine to a logging sink and runs it against a demo target;
//! the real application embeds [`apipulse`] as a library instead.

use std::env;
use std::sync::Arc;

use apipulse::{BenchRunner, EngineConfig, LogSink, MetricsSink, ProfileKind, ReliabilityMonitor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("apipulse=info".parse()?),
        )
        .init();

    // Load configuration
    let cfg = EngineConfig::load();
    let target_url =
        env::var("APIPULSE_TARGET_URL").unwrap_or_else(|_| "https://example.com".to_string());
    tracing::info!("Starting ApiPulse measurement engine...");
    tracing::info!("Demo target: {}", target_url);

    let sink: Arc<dyn MetricsSink> = Arc::new(LogSink);

    // Recurring health checks, independent of any campaign
    let monitor = ReliabilityMonitor::new(&cfg, sink.clone())?;
    monitor.start("demo", &target_url).await;

    // One short latency campaign against the same target
    let runner = BenchRunner::new(&cfg, sink)?;
    let campaign = runner.run_campaign("demo-campaign", &target_url, ProfileKind::ResponseTime, 5);
    let _ = campaign.await;

    tracing::info!("Campaign finished; monitor keeps running until ctrl-c");
    tokio::signal::ctrl_c().await?;

    monitor.stop("demo").await;
    Ok(())
}
