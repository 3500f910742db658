//! HTTP probe implementation.

use std::time::Duration;

use tokio::time::Instant;

use super::{ProbeMethod, ProbeSample};
use crate::error::EngineError;

/// Issues outbound probe requests and reports timing + outcome.
///
/// The underlying client is built once and tagged with the engine's client
/// tag as its User-Agent; cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    /// Build a prober identified by `client_tag` in the remote request log.
    pub fn new(client_tag: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder().user_agent(client_tag).build()?;
        Ok(Self { client })
    }

    /// Run one probe against `url` and return its sample.
    ///
    /// This never fails from the caller's perspective: timeouts, DNS
    /// failures, refused connections and TLS errors all collapse into
    /// `success = false` with the elapsed time until the failure. Retries
    /// are a policy decision left to the calling profile.
    pub async fn probe(&self, method: ProbeMethod, url: &str, timeout: Duration) -> ProbeSample {
        let request = match method {
            ProbeMethod::Get => self.client.get(url),
            ProbeMethod::Head => self.client.head(url),
        };

        let start = Instant::now();

        match request.timeout(timeout).send().await {
            Ok(response) => {
                let status = response.status();
                // Read the full body to measure complete transfer time
                let body = response.bytes().await;
                ProbeSample {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    success: body.is_ok() && status.is_success(),
                    status: Some(status.as_u16()),
                }
            }
            Err(_) => ProbeSample {
                elapsed_ms: start.elapsed().as_millis() as u64,
                success: false,
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn prober() -> Prober {
        Prober::new("apipulse-test").unwrap()
    }

    #[tokio::test]
    async fn test_probe_ok_response() {
        let url = spawn_server(Router::new().route("/", get(|| async { "ok" }))).await;
        let sample = prober()
            .probe(ProbeMethod::Get, &url, Duration::from_secs(5))
            .await;
        assert!(sample.success);
        assert_eq!(sample.status, Some(200));
    }

    #[tokio::test]
    async fn test_probe_server_error_is_failure_with_status() {
        let url = spawn_server(Router::new().route(
            "/",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let sample = prober()
            .probe(ProbeMethod::Get, &url, Duration::from_secs(5))
            .await;
        assert!(!sample.success);
        assert_eq!(sample.status, Some(500));
    }

    #[tokio::test]
    async fn test_probe_refused_connection_never_errors() {
        // Bind a port, then drop the listener so connections are refused.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let sample = prober()
            .probe(ProbeMethod::Get, &url, Duration::from_secs(5))
            .await;
        assert!(!sample.success);
        assert_eq!(sample.status, None);
    }

    #[tokio::test]
    async fn test_probe_head_method() {
        let url = spawn_server(Router::new().route("/", get(|| async { "ok" }))).await;
        let sample = prober()
            .probe(ProbeMethod::Head, &url, Duration::from_secs(5))
            .await;
        assert!(sample.success);
        assert_eq!(sample.status, Some(200));
    }
}
