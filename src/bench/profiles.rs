//! The four load profiles.
//!
//! Each profile consumes a target URL and a requested duration and produces
//! the raw samples for one campaign. Failed probes are ordinary samples
//! here; nothing a remote endpoint does can abort a profile.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use crate::error::EngineError;
use crate::probe::{ProbeMethod, ProbeSample, Prober};

/// Hard floor of samples for the latency probe, so very short durations
/// still produce a usable result.
const SAMPLE_FLOOR: usize = 5;
/// Hard ceiling of samples for the latency probe, regardless of duration.
const SAMPLE_CEILING: usize = 100;
/// Pause after a failed latency probe before retrying.
const FAILURE_PAUSE: Duration = Duration::from_millis(100);
const RESPONSE_TIME_TIMEOUT: Duration = Duration::from_secs(10);

const LOAD_WORKERS: usize = 10;
const LOAD_PAUSE: Duration = Duration::from_millis(50);
const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

const STRESS_PHASES: u32 = 3;
const STRESS_STEP: usize = 5;
/// Safety clamp on per-phase concurrency; the fixed three-phase schedule
/// peaks at 15, but the ceiling holds if the multipliers are ever tuned up.
const STRESS_WORKER_CAP: usize = 50;
const STRESS_PAUSE: Duration = Duration::from_millis(100);
const STRESS_TIMEOUT: Duration = Duration::from_secs(15);

const RELIABILITY_INTERVAL: Duration = Duration::from_secs(5);
const RELIABILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Sequential latency probe.
///
/// Runs until the duration has elapsed and at least [`SAMPLE_FLOOR`] samples
/// exist, never beyond [`SAMPLE_CEILING`]. Successful probes are followed by
/// an adaptive pause derived from the previous latency; failed probes by a
/// fixed retry pause.
pub(crate) async fn response_time(
    prober: &Prober,
    url: &str,
    duration: Duration,
) -> Vec<ProbeSample> {
    let start = Instant::now();
    let mut samples = Vec::new();

    while samples.len() < SAMPLE_FLOOR || start.elapsed() < duration {
        if samples.len() >= SAMPLE_CEILING {
            break;
        }

        let sample = prober
            .probe(ProbeMethod::Get, url, RESPONSE_TIME_TIMEOUT)
            .await;
        let pause = if sample.success {
            adaptive_pause(sample.elapsed_ms)
        } else {
            FAILURE_PAUSE
        };
        samples.push(sample);
        sleep(pause).await;
    }

    samples
}

/// Throttle against fast targets without materially slowing slow ones.
fn adaptive_pause(previous_elapsed_ms: u64) -> Duration {
    Duration::from_millis((previous_elapsed_ms / 10).clamp(50, 200))
}

/// Fixed fan-out load test: 10 workers looping request-then-pause until the
/// wall-clock deadline.
pub(crate) async fn load_test(
    prober: &Prober,
    url: &str,
    duration: Duration,
) -> Result<Vec<ProbeSample>, EngineError> {
    run_worker_pool(
        prober,
        url,
        LOAD_WORKERS,
        Instant::now() + duration,
        LOAD_TIMEOUT,
        LOAD_PAUSE,
    )
    .await
}

/// Ramping stress test: three strictly sequential phases of `duration / 3`,
/// with concurrency stepping up per phase. All samples pool into one result.
pub(crate) async fn stress_test(
    prober: &Prober,
    url: &str,
    duration: Duration,
) -> Result<Vec<ProbeSample>, EngineError> {
    let phase_duration = duration / STRESS_PHASES;
    let mut samples = Vec::new();

    for phase in 1..=STRESS_PHASES as usize {
        let workers = phase_concurrency(phase);
        tracing::debug!("Stress phase {} with {} workers", phase, workers);
        let phase_samples = run_worker_pool(
            prober,
            url,
            workers,
            Instant::now() + phase_duration,
            STRESS_TIMEOUT,
            STRESS_PAUSE,
        )
        .await?;
        samples.extend(phase_samples);
    }

    Ok(samples)
}

/// Concurrency for a 1-based stress phase.
pub(crate) fn phase_concurrency(phase: usize) -> usize {
    (STRESS_STEP * phase).min(STRESS_WORKER_CAP)
}

/// Long-interval reliability sampling: one probe every fixed interval until
/// the duration elapses. Always yields at least one sample.
pub(crate) async fn reliability_test(
    prober: &Prober,
    url: &str,
    duration: Duration,
) -> Vec<ProbeSample> {
    let start = Instant::now();
    let mut samples = Vec::new();

    loop {
        samples.push(
            prober
                .probe(ProbeMethod::Get, url, RELIABILITY_TIMEOUT)
                .await,
        );
        if start.elapsed() >= duration {
            break;
        }
        sleep(RELIABILITY_INTERVAL).await;
    }

    samples
}

/// Spawn `workers` probe loops against one deadline and accumulate their
/// samples through a channel into a single vector.
///
/// The receiver drains until every worker has dropped its sender, so the
/// pool never joins early; worker panics surface as a campaign-level error
/// after the drain.
async fn run_worker_pool(
    prober: &Prober,
    url: &str,
    workers: usize,
    deadline: Instant,
    timeout: Duration,
    pause: Duration,
) -> Result<Vec<ProbeSample>, EngineError> {
    let (tx, mut rx) = mpsc::channel::<ProbeSample>(workers.max(1) * 4);
    let mut handles = Vec::with_capacity(workers);

    for _ in 0..workers {
        let prober = prober.clone();
        let url = url.to_string();
        let tx = tx.clone();

        handles.push(tokio::spawn(async move {
            while Instant::now() < deadline {
                let sample = prober.probe(ProbeMethod::Get, &url, timeout).await;
                if tx.send(sample).await.is_err() {
                    break;
                }
                sleep(pause).await;
            }
        }));
    }
    drop(tx);

    let mut samples = Vec::new();
    while let Some(sample) = rx.recv().await {
        samples.push(sample);
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| EngineError::Worker(e.to_string()))?;
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::stats;
    use axum::{routing::get, Router};

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn refused_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        url
    }

    fn ok_router() -> Router {
        Router::new().route("/", get(|| async { "ok" }))
    }

    fn slow_router(delay: Duration) -> Router {
        Router::new().route(
            "/",
            get(move || async move {
                sleep(delay).await;
                "ok"
            }),
        )
    }

    fn prober() -> Prober {
        Prober::new("apipulse-test").unwrap()
    }

    #[tokio::test]
    async fn test_response_time_floor_binds_when_duration_exhausted() {
        let url = refused_url().await;
        let samples = response_time(&prober(), &url, Duration::ZERO).await;

        assert_eq!(samples.len(), SAMPLE_FLOOR);
        assert!(samples.iter().all(|s| !s.success));

        let result = stats::aggregate(&samples);
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.average_response_ms, 0.0);
        assert_eq!(stats::performance_score(&result), 0);
    }

    #[tokio::test]
    async fn test_response_time_issues_at_least_floor_within_short_duration() {
        let url = spawn_server(ok_router()).await;
        let samples = response_time(&prober(), &url, Duration::from_secs(1)).await;

        assert!(samples.len() >= SAMPLE_FLOOR);
        assert!(samples.len() <= SAMPLE_CEILING);
        assert!(samples.iter().all(|s| s.success));
    }

    #[tokio::test]
    async fn test_response_time_never_exceeds_ceiling() {
        let url = spawn_server(ok_router()).await;
        // A fast target paces at the 50ms minimum pause, so a long duration
        // has to be cut off by the ceiling well before it elapses.
        let samples = response_time(&prober(), &url, Duration::from_secs(30)).await;
        assert_eq!(samples.len(), SAMPLE_CEILING);
    }

    #[tokio::test]
    async fn test_load_test_against_healthy_target() {
        let url = spawn_server(slow_router(Duration::from_millis(50))).await;
        let samples = load_test(&prober(), &url, Duration::from_secs(2))
            .await
            .unwrap();
        let result = stats::aggregate(&samples);

        assert!(result.total_requests > 0);
        assert_eq!(result.error_rate, 0.0);
        assert_eq!(result.success_rate, 100.0);
        assert!(
            result.average_response_ms >= 45.0 && result.average_response_ms <= 250.0,
            "average {} out of range",
            result.average_response_ms
        );
    }

    #[tokio::test]
    async fn test_stress_phase_concurrency_steps() {
        assert_eq!(phase_concurrency(1), 5);
        assert_eq!(phase_concurrency(2), 10);
        assert_eq!(phase_concurrency(3), 15);
        // The cap only matters if the multipliers are tuned upward.
        assert_eq!(phase_concurrency(20), 50);
    }

    #[tokio::test]
    async fn test_stress_test_pools_all_phases() {
        let url = spawn_server(ok_router()).await;
        let samples = stress_test(&prober(), &url, Duration::from_secs(1))
            .await
            .unwrap();
        let result = stats::aggregate(&samples);

        // Three phases of 5/10/15 workers each get at least one pass in.
        assert!(result.total_requests >= 30);
        assert_eq!(result.success_rate, 100.0);
    }

    #[tokio::test]
    async fn test_reliability_test_yields_at_least_one_sample() {
        let url = spawn_server(ok_router()).await;
        let samples = reliability_test(&prober(), &url, Duration::ZERO).await;
        assert_eq!(samples.len(), 1);
        assert!(samples[0].success);
    }
}
