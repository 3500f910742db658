//! Reliability monitor: recurring per-target health checks.
//!
//! One monitor per process owns the mapping from target identifier to an
//! active schedule; campaigns run independently of it and may probe the
//! same target concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::probe::{ProbeMethod, Prober};
use crate::sink::{HealthSample, MetricsSink, PerfSample};

const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Schedules recurring health checks, at most one per target.
pub struct ReliabilityMonitor {
    prober: Prober,
    sink: Arc<dyn MetricsSink>,
    interval: Duration,
    stop_chans: Arc<RwLock<HashMap<String, broadcast::Sender<()>>>>,
}

impl ReliabilityMonitor {
    pub fn new(config: &EngineConfig, sink: Arc<dyn MetricsSink>) -> Result<Self, EngineError> {
        Ok(Self {
            prober: Prober::new(&config.client_tag)?,
            sink,
            interval: config.monitor_interval,
            stop_chans: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Start monitoring a target, replacing any existing schedule for it.
    ///
    /// The first check runs before this returns, so a freshly registered
    /// target has data without waiting a full interval.
    pub async fn start(&self, target_id: &str, url: &str) {
        let stop_tx = {
            let mut stop_chans = self.stop_chans.write().await;
            if let Some(existing) = stop_chans.remove(target_id) {
                let _ = existing.send(());
                tracing::info!("Monitor: restarting schedule for {}", target_id);
            } else {
                tracing::info!("Monitor: adding target {}", target_id);
            }
            let (stop_tx, _) = broadcast::channel(1);
            stop_chans.insert(target_id.to_string(), stop_tx.clone());
            stop_tx
        };

        check_target(&self.prober, &*self.sink, target_id, url).await;

        let prober = self.prober.clone();
        let sink = self.sink.clone();
        let target_id = target_id.to_string();
        let url = url.to_string();
        let period = self.interval;
        let mut stop_rx = stop_tx.subscribe();

        tokio::spawn(async move {
            // The inline check above covered the current instant.
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        break;
                    }
                    _ = ticker.tick() => {
                        check_target(&prober, &*sink, &target_id, &url).await;
                    }
                }
            }
        });
    }

    /// Cancel a target's schedule; a no-op if none exists.
    ///
    /// Takes effect before the next tick and never interrupts a check
    /// already in flight.
    pub async fn stop(&self, target_id: &str) {
        let mut stop_chans = self.stop_chans.write().await;
        if let Some(stop_tx) = stop_chans.remove(target_id) {
            let _ = stop_tx.send(());
            tracing::info!("Monitor: removed target {}", target_id);
        }
    }
}

/// Run one health check and emit its record pair.
///
/// Every scheduled tick produces exactly one pair; an unreachable target
/// yields a full-failure sample rather than a gap, and sink write failures
/// are logged without dropping the tick.
async fn check_target(prober: &Prober, sink: &dyn MetricsSink, target_id: &str, url: &str) {
    let checked_at = Utc::now();
    let outcome = prober.probe(ProbeMethod::Head, url, CHECK_TIMEOUT).await;

    let health = HealthSample {
        online: outcome.success,
        elapsed_ms: outcome.elapsed_ms,
        uptime: if outcome.success { 100.0 } else { 0.0 },
        sla_compliance: sla_compliance(outcome.success, outcome.elapsed_ms),
        outage_count: u8::from(!outcome.success),
        checked_at,
    };
    let perf = PerfSample {
        online: outcome.success,
        elapsed_ms: outcome.elapsed_ms,
        score: perf_score(outcome.success, outcome.elapsed_ms),
        checked_at,
    };

    tracing::debug!(
        "Monitor: target {} online={} elapsed={}ms sla={}",
        target_id,
        health.online,
        health.elapsed_ms,
        health.sla_compliance
    );

    if let Err(e) = sink.record_reliability_sample(target_id, &health).await {
        tracing::error!("Monitor: failed to record health for {}: {}", target_id, e);
    }
    if let Err(e) = sink.record_performance_sample(target_id, &perf).await {
        tracing::error!(
            "Monitor: failed to record performance for {}: {}",
            target_id,
            e
        );
    }
}

/// SLA compliance per tick: 0 when offline, otherwise 100 minus a latency
/// deduction, floored at 0.
fn sla_compliance(online: bool, elapsed_ms: u64) -> f64 {
    if !online {
        return 0.0;
    }
    let deduction: f64 = if elapsed_ms > 5000 {
        50.0
    } else if elapsed_ms > 2000 {
        25.0
    } else if elapsed_ms > 1000 {
        10.0
    } else {
        0.0
    };
    (100.0 - deduction).max(0.0)
}

/// The companion performance score for a tick, on its own curve.
fn perf_score(online: bool, elapsed_ms: u64) -> u8 {
    if !online {
        return 0;
    }
    let deduction = if elapsed_ms > 3000 {
        40
    } else if elapsed_ms > 1000 {
        20
    } else if elapsed_ms > 500 {
        10
    } else {
        0
    };
    100 - deduction
}
