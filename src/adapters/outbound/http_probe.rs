//! HTTP Reachability Probe
//!
//! Implements ReachabilityProbe with a HEAD request. Redirects are
//! followed; any response counts as reachable, and `ok` reflects a 2xx
//! final status.

use crate::domain::entities::ReachabilityReport;
use crate::domain::ports::ReachabilityProbe;
use crate::domain::value_objects::TargetUrl;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use std::time::{Duration, Instant};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PROBE_USER_AGENT: &str = "Mozilla/5.0 (CheckTools-Bot) Website-Status-Checker";

/// HEAD-request probe.
pub struct HttpReachabilityProbe {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
}

impl HttpReachabilityProbe {
    pub fn new(client: reqwest::Client, timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            timeout,
            user_agent: user_agent.into(),
        }
    }
}

impl Default for HttpReachabilityProbe {
    fn default() -> Self {
        Self::new(
            reqwest::Client::new(),
            DEFAULT_PROBE_TIMEOUT,
            DEFAULT_PROBE_USER_AGENT,
        )
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn probe(&self, target: &TargetUrl) -> ReachabilityReport {
        let start = Instant::now();

        let result = self
            .client
            .head(target.url().clone())
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                let status = resp.status();
                tracing::debug!("probe {} -> {} in {}ms", target, status, elapsed_ms);
                ReachabilityReport::Reachable {
                    http_code: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                    ok: status.is_success(),
                    elapsed_ms,
                }
            }
            Err(e) => {
                let error = if e.is_timeout() {
                    format!("request timed out after {}ms", self.timeout.as_millis())
                } else {
                    e.to_string()
                };
                tracing::debug!("probe {} failed after {}ms: {}", target, elapsed_ms, error);
                ReachabilityReport::Unreachable { error, elapsed_ms }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(url: String) -> TargetUrl {
        TargetUrl::parse(&url).unwrap()
    }

    #[tokio::test]
    async fn test_probe_up() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/"))
            .and(header("user-agent", DEFAULT_PROBE_USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let report = HttpReachabilityProbe::default()
            .probe(&target(format!("{}/", mock_server.uri())))
            .await;

        match report {
            ReachabilityReport::Reachable {
                http_code,
                status_text,
                ok,
                ..
            } => {
                assert_eq!(http_code, 200);
                assert_eq!(status_text, "OK");
                assert!(ok);
            }
            other => panic!("expected reachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_error_status_is_reachable_but_not_ok() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let report = HttpReachabilityProbe::default()
            .probe(&target(mock_server.uri()))
            .await;

        assert!(!report.is_up());
        assert!(matches!(
            report,
            ReachabilityReport::Reachable { http_code: 503, ok: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_probe_follows_redirects() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let report = HttpReachabilityProbe::default()
            .probe(&target(format!("{}/old", mock_server.uri())))
            .await;

        assert!(matches!(
            report,
            ReachabilityReport::Reachable { http_code: 204, ok: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_probe_timeout_is_unreachable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let probe = HttpReachabilityProbe::new(
            reqwest::Client::new(),
            Duration::from_millis(100),
            DEFAULT_PROBE_USER_AGENT,
        );
        let report = probe.probe(&target(mock_server.uri())).await;

        match report {
            ReachabilityReport::Unreachable { error, .. } => {
                assert!(error.contains("timed out"), "error was {}", error);
            }
            other => panic!("expected unreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let report = HttpReachabilityProbe::default()
            .probe(&target(format!("http://127.0.0.1:{}/", port)))
            .await;

        assert!(matches!(report, ReachabilityReport::Unreachable { .. }));
    }
}
