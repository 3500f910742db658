//! Probe module: the shared HTTP probe primitive.
//!
//! Every measurement in the engine, whether issued by a benchmark campaign
//! or a scheduled health check, goes through [`Prober::probe`].

mod http;

pub use http::*;

/// HTTP method used for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    Head,
}

/// The outcome of a single probe.
///
/// Samples are ephemeral: they live in memory for the duration of one
/// campaign or one monitor tick and are reduced into aggregates before
/// anything is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSample {
    /// Wall-clock time until the response completed or the request failed.
    pub elapsed_ms: u64,
    /// True iff the response completed within the timeout with a 2xx status.
    pub success: bool,
    /// HTTP status code, when a response was received at all.
    pub status: Option<u16>,
}
