//! The metrics sink boundary.
//!
//! Both subsystems write their records through [`MetricsSink`]; neither
//! touches storage directly, and the engine never reads back through this
//! interface. The external application supplies the real implementation;
//! [`LogSink`] and [`MemorySink`] cover the demo binary and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// Lifecycle status of a benchmark campaign.
///
/// A campaign transitions `pending -> running -> {completed, failed}` and is
/// never mutated after reaching a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Campaign lifecycle timestamps attached to a status transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignTimestamps {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregated statistics for one completed campaign.
///
/// The average is taken over successful samples only; failed samples count
/// toward totals and rates but not latency. Rates are percentages rounded to
/// two decimals. An empty sample set aggregates to all zeroes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchResult {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_ms: f64,
    pub success_rate: f64,
    pub error_rate: f64,
}

/// One reliability monitor tick.
///
/// Uptime is binary per tick (0 or 100), and `outage_count` is a per-sample
/// flag; trend and totals over time are derived by consumers of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub online: bool,
    pub elapsed_ms: u64,
    pub uptime: f64,
    pub sla_compliance: f64,
    pub outage_count: u8,
    pub checked_at: DateTime<Utc>,
}

/// The companion performance-style record derived from a monitor tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfSample {
    pub online: bool,
    pub elapsed_ms: u64,
    pub score: u8,
    pub checked_at: DateTime<Utc>,
}

/// Error reported by a sink implementation on a failed write.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Write(String),
}

/// Write-only boundary toward the application's storage layer.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record_campaign_result(
        &self,
        campaign_id: &str,
        result: &BenchResult,
        score: u8,
    ) -> Result<(), SinkError>;

    async fn mark_campaign_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
        timestamps: CampaignTimestamps,
    ) -> Result<(), SinkError>;

    async fn record_reliability_sample(
        &self,
        target_id: &str,
        sample: &HealthSample,
    ) -> Result<(), SinkError>;

    async fn record_performance_sample(
        &self,
        target_id: &str,
        sample: &PerfSample,
    ) -> Result<(), SinkError>;
}

/// Sink that emits every record as a structured log line.
pub struct LogSink;

fn to_log_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

#[async_trait]
impl MetricsSink for LogSink {
    async fn record_campaign_result(
        &self,
        campaign_id: &str,
        result: &BenchResult,
        score: u8,
    ) -> Result<(), SinkError> {
        tracing::info!(
            "Campaign {} result: score={} {}",
            campaign_id,
            score,
            to_log_json(result)
        );
        Ok(())
    }

    async fn mark_campaign_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
        timestamps: CampaignTimestamps,
    ) -> Result<(), SinkError> {
        tracing::info!(
            "Campaign {} status: {:?} {}",
            campaign_id,
            status,
            to_log_json(&timestamps)
        );
        Ok(())
    }

    async fn record_reliability_sample(
        &self,
        target_id: &str,
        sample: &HealthSample,
    ) -> Result<(), SinkError> {
        tracing::info!("Target {} health: {}", target_id, to_log_json(sample));
        Ok(())
    }

    async fn record_performance_sample(
        &self,
        target_id: &str,
        sample: &PerfSample,
    ) -> Result<(), SinkError> {
        tracing::info!("Target {} performance: {}", target_id, to_log_json(sample));
        Ok(())
    }
}

/// One record as seen by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkRecord {
    CampaignResult {
        campaign_id: String,
        result: BenchResult,
        score: u8,
    },
    CampaignStatus {
        campaign_id: String,
        status: CampaignStatus,
        timestamps: CampaignTimestamps,
    },
    Reliability {
        target_id: String,
        sample: HealthSample,
    },
    Performance {
        target_id: String,
        sample: PerfSample,
    },
}

/// Sink that accumulates records in memory, in write order.
///
/// Used by the test suite and by embedding harnesses that want to inspect
/// what the engine produced without standing up storage.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub async fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl MetricsSink for MemorySink {
    async fn record_campaign_result(
        &self,
        campaign_id: &str,
        result: &BenchResult,
        score: u8,
    ) -> Result<(), SinkError> {
        self.records.lock().await.push(SinkRecord::CampaignResult {
            campaign_id: campaign_id.to_string(),
            result: result.clone(),
            score,
        });
        Ok(())
    }

    async fn mark_campaign_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
        timestamps: CampaignTimestamps,
    ) -> Result<(), SinkError> {
        self.records.lock().await.push(SinkRecord::CampaignStatus {
            campaign_id: campaign_id.to_string(),
            status,
            timestamps,
        });
        Ok(())
    }

    async fn record_reliability_sample(
        &self,
        target_id: &str,
        sample: &HealthSample,
    ) -> Result<(), SinkError> {
        self.records.lock().await.push(SinkRecord::Reliability {
            target_id: target_id.to_string(),
            sample: sample.clone(),
        });
        Ok(())
    }

    async fn record_performance_sample(
        &self,
        target_id: &str,
        sample: &PerfSample,
    ) -> Result<(), SinkError> {
        self.records.lock().await.push(SinkRecord::Performance {
            target_id: target_id.to_string(),
            sample: sample.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_tags() {
        assert_eq!(
            serde_json::to_string(&CampaignStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(
            serde_json::from_str::<CampaignStatus>("\"failed\"").unwrap(),
            CampaignStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_memory_sink_preserves_write_order() {
        let sink = MemorySink::new();
        sink.mark_campaign_status(
            "c1",
            CampaignStatus::Running,
            CampaignTimestamps::default(),
        )
        .await
        .unwrap();
        sink.record_campaign_result("c1", &BenchResult::default(), 0)
            .await
            .unwrap();

        let records = sink.records().await;
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], SinkRecord::CampaignStatus { .. }));
        assert!(matches!(records[1], SinkRecord::CampaignResult { .. }));
    }
}
