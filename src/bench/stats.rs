//! Sample aggregation and performance scoring.
//!
//! Aggregation is a pure multiset reduction: sums and counts only, so the
//! result is independent of the order in which concurrent workers produced
//! their samples.

use crate::probe::ProbeSample;
use crate::sink::BenchResult;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reduce a campaign's samples into one [`BenchResult`].
pub fn aggregate(samples: &[ProbeSample]) -> BenchResult {
    let total = samples.len() as u64;
    if total == 0 {
        return BenchResult::default();
    }

    let successful = samples.iter().filter(|s| s.success).count() as u64;
    let failed = total - successful;

    let average_response_ms = if successful > 0 {
        let latency_sum: u64 = samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.elapsed_ms)
            .sum();
        round2(latency_sum as f64 / successful as f64)
    } else {
        0.0
    };

    BenchResult {
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        average_response_ms,
        success_rate: round2(successful as f64 * 100.0 / total as f64),
        error_rate: round2(failed as f64 * 100.0 / total as f64),
    }
}

/// Derive the 0-100 performance score for a completed campaign.
///
/// Starts at 100 and deducts along fixed latency and error-rate thresholds.
/// A result without a single successful request scores 0 outright; the
/// thresholds only rank results that did some useful work.
pub fn performance_score(result: &BenchResult) -> u8 {
    if result.successful_requests == 0 {
        return 0;
    }

    let mut score: i32 = 100;

    if result.average_response_ms > 1000.0 {
        score -= 30;
    } else if result.average_response_ms > 500.0 {
        score -= 20;
    } else if result.average_response_ms > 200.0 {
        score -= 10;
    }

    if result.error_rate > 5.0 {
        score -= 40;
    } else if result.error_rate > 1.0 {
        score -= 20;
    } else if result.error_rate > 0.1 {
        score -= 10;
    }

    score.clamp(0, 100) as u8
}
