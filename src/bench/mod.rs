//! Benchmark runner: campaign lifecycle and profile dispatch.

mod profiles;
pub mod stats;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::probe::{ProbeSample, Prober};
use crate::sink::{CampaignStatus, CampaignTimestamps, MetricsSink};

/// The load profile a campaign runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Sequential latency probing with adaptive pacing.
    ResponseTime,
    /// Fixed fan-out of concurrent workers.
    LoadTest,
    /// Three ramping phases of increasing concurrency.
    StressTest,
    /// Long-interval consistency sampling.
    ReliabilityTest,
}

/// Executes benchmark campaigns against target endpoints.
///
/// One runner instance owns a campaign's execution from the `running`
/// transition to its terminal state; campaigns run as independent tasks and
/// share nothing but the sink.
pub struct BenchRunner {
    prober: Prober,
    sink: Arc<dyn MetricsSink>,
}

impl BenchRunner {
    pub fn new(config: &EngineConfig, sink: Arc<dyn MetricsSink>) -> Result<Self, EngineError> {
        Ok(Self {
            prober: Prober::new(&config.client_tag)?,
            sink,
        })
    }

    /// Run one campaign to completion as a spawned task.
    ///
    /// The caller is expected to have persisted the campaign in `pending`
    /// state; completion is observed through the sink's storage. The
    /// returned handle may be dropped freely — the task carries its own
    /// error boundary and always reaches a terminal status write.
    pub fn run_campaign(
        &self,
        campaign_id: &str,
        target_url: &str,
        kind: ProfileKind,
        duration_secs: u64,
    ) -> JoinHandle<()> {
        let prober = self.prober.clone();
        let sink = self.sink.clone();
        let campaign_id = campaign_id.to_string();
        let target_url = target_url.to_string();
        let duration = Duration::from_secs(duration_secs);

        tokio::spawn(async move {
            execute_campaign(prober, sink, campaign_id, target_url, kind, duration).await;
        })
    }
}

async fn execute_campaign(
    prober: Prober,
    sink: Arc<dyn MetricsSink>,
    campaign_id: String,
    target_url: String,
    kind: ProfileKind,
    duration: Duration,
) {
    let started_at = Utc::now();
    tracing::info!(
        "Campaign {}: starting {:?} against {} for {:?}",
        campaign_id,
        kind,
        target_url,
        duration
    );
    mark_status(
        &*sink,
        &campaign_id,
        CampaignStatus::Running,
        CampaignTimestamps {
            started_at: Some(started_at),
            completed_at: None,
        },
    )
    .await;

    let outcome = run_profile(&prober, &target_url, kind, duration).await;
    let terminal = CampaignTimestamps {
        started_at: Some(started_at),
        completed_at: Some(Utc::now()),
    };

    match outcome {
        Ok(samples) => {
            let result = stats::aggregate(&samples);
            let score = stats::performance_score(&result);
            if let Err(e) = sink.record_campaign_result(&campaign_id, &result, score).await {
                tracing::error!("Campaign {}: failed to record result: {}", campaign_id, e);
            }
            mark_status(&*sink, &campaign_id, CampaignStatus::Completed, terminal).await;
            tracing::info!(
                "Campaign {}: completed with {} requests, score {}",
                campaign_id,
                result.total_requests,
                score
            );
        }
        Err(e) => {
            tracing::error!("Campaign {}: failed: {}", campaign_id, e);
            mark_status(&*sink, &campaign_id, CampaignStatus::Failed, terminal).await;
        }
    }
}

async fn run_profile(
    prober: &Prober,
    url: &str,
    kind: ProfileKind,
    duration: Duration,
) -> Result<Vec<ProbeSample>, EngineError> {
    match kind {
        ProfileKind::ResponseTime => Ok(profiles::response_time(prober, url, duration).await),
        ProfileKind::LoadTest => profiles::load_test(prober, url, duration).await,
        ProfileKind::StressTest => profiles::stress_test(prober, url, duration).await,
        ProfileKind::ReliabilityTest => Ok(profiles::reliability_test(prober, url, duration).await),
    }
}

async fn mark_status(
    sink: &dyn MetricsSink,
    campaign_id: &str,
    status: CampaignStatus,
    timestamps: CampaignTimestamps,
) {
    if let Err(e) = sink.mark_campaign_status(campaign_id, status, timestamps).await {
        tracing::error!(
            "Campaign {}: failed to record {:?} status: {}",
            campaign_id,
            status,
            e
        );
    }
}
