//! HTTP client for the monitoring API.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::{Duration, Utc};
//! use monwatch_adapters::{HttpMonitorApi, MonitorApi, PageParams, PageResponse};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = HttpMonitorApi::builder()
//!         .endpoint("https://app.metrist.io/api/v0")
//!         .api_key("my-api-key")
//!         .build()?;
//!
//!     let now = Utc::now();
//!     let params = PageParams::new(now - Duration::hours(6), now, vec!["awslambda".into()]);
//!
//!     if let PageResponse::Page(page) = api.fetch_telemetry_page(&params).await? {
//!         println!("{} entries, more: {}", page.entries.len(), page.next_cursor.is_some());
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use monwatch_types::{ErrorCount, StatusChange, Telemetry};

use crate::api::{decode_page, PageParams, PageResponse};
use crate::{ApiError, AuthStatus, MonitorApi, MonitorChecks, MonitorInfo, MonitorInstances};

/// Production API endpoint.
pub const PROD_ENDPOINT: &str = "https://app.metrist.io/api/v0";

/// Development API endpoint.
pub const DEV_ENDPOINT: &str = "https://app-dev1.metrist.io/api/v0";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Monitoring API client over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpMonitorApi {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpMonitorApi {
    /// Create a new builder for configuring the client.
    pub fn builder() -> HttpMonitorApiBuilder {
        HttpMonitorApiBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &PageParams,
    ) -> Result<PageResponse<T>, ApiError> {
        let url = self.url(path);
        debug!(url = %url, only_shared = params.only_shared, cursor = ?params.cursor, "Fetching page");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.api_key.as_str())
            .query(&params.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|err| {
                debug!(status = status.as_u16(), error = %err, "Unreadable non-success body");
                String::new()
            });
            return Ok(PageResponse::NonSuccess {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        decode_page(&body).map(PageResponse::Page)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "Fetching resource");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.api_key.as_str())
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth("Invalid API key".to_string()));
        }

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn monitor_query(monitors: &[String], include_shared: bool) -> Vec<(&'static str, String)> {
    let mut query: Vec<(&str, String)> = monitors.iter().map(|m| ("m[]", m.clone())).collect();
    query.push(("include_shared", include_shared.to_string()));
    query
}

#[async_trait]
impl MonitorApi for HttpMonitorApi {
    async fn fetch_errors_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<ErrorCount>, ApiError> {
        self.get_page("monitor-error", params).await
    }

    async fn fetch_telemetry_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<Telemetry>, ApiError> {
        self.get_page("monitor-telemetry", params).await
    }

    async fn fetch_status_changes_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<StatusChange>, ApiError> {
        self.get_page("status-page-changes", params).await
    }

    async fn list_monitors(&self) -> Result<Vec<MonitorInfo>, ApiError> {
        self.get_json("monitor-list", &[]).await
    }

    async fn list_checks(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<MonitorChecks>, ApiError> {
        self.get_json("monitor-checks", &monitor_query(monitors, include_shared))
            .await
    }

    async fn list_instances(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<MonitorInstances>, ApiError> {
        self.get_json("monitor-instances", &monitor_query(monitors, include_shared))
            .await
    }

    async fn verify_auth(&self) -> Result<AuthStatus, ApiError> {
        let url = self.url("verify-auth");
        debug!(url = %url, "Verifying API key");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.api_key.as_str())
            .send()
            .await?;

        let status = response.status();
        Ok(AuthStatus {
            code: status.as_u16(),
            text: status.to_string(),
        })
    }
}

/// Builder for HttpMonitorApi.
#[derive(Debug, Default)]
pub struct HttpMonitorApiBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl HttpMonitorApiBuilder {
    /// Set the API base URL (default: the production endpoint).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key sent with every request.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Accept self-signed certificates. Only meant for local development.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpMonitorApi, ApiError> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ApiError::Config("API key is required".to_string()))?;

        let endpoint = self.endpoint.unwrap_or_else(|| PROD_ENDPOINT.to_string());
        Url::parse(&endpoint)
            .map_err(|e| ApiError::Config(format!("invalid endpoint `{endpoint}`: {e}")))?;

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        Ok(HttpMonitorApi {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned response; the handle yields the raw request head.
    async fn serve_once(response: String) -> (HttpMonitorApi, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        let api = HttpMonitorApi::builder()
            .endpoint(format!("http://{addr}/api/v0"))
            .api_key("secret")
            .build()
            .unwrap();
        (api, server)
    }

    fn reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn page_params() -> PageParams {
        let now = Utc::now();
        let mut params = PageParams::new(now - chrono::Duration::hours(6), now, vec!["awslambda".into()])
            .checks(Some(vec!["Check".into()]));
        params.cursor = Some("c1".to_string());
        params
    }

    #[tokio::test]
    async fn test_page_request_and_decode() {
        let body = r#"{"entries": [{"timestamp": "2022-12-07T18:28:06Z", "count": 3,
            "instance": "us-east-1", "check": "Check", "monitor_logical_name": "awslambda"}],
            "metadata": {"cursor_after": "c2"}}"#;
        let (api, server) = serve_once(reply("200 OK", body)).await;

        let response = api.fetch_errors_page(&page_params()).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /api/v0/monitor-error?"));
        assert!(request.contains("m%5B%5D=awslambda"));
        assert!(request.contains("c%5B%5D=Check"));
        assert!(request.contains("cursor_after=c1"));
        assert!(request.to_lowercase().contains("authorization: secret\r\n"));

        match response {
            PageResponse::Page(page) => {
                assert_eq!(page.entries.len(), 1);
                assert_eq!(page.entries[0].count, Some(3));
                assert_eq!(page.next_cursor.as_deref(), Some("c2"));
            }
            other => panic!("expected a page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_success_page_is_not_an_error() {
        let (api, _server) = serve_once(reply("500 Internal Server Error", "boom")).await;

        let response = api.fetch_telemetry_page(&page_params()).await.unwrap();

        assert_eq!(
            response,
            PageResponse::NonSuccess {
                status: 500,
                body: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_truncated_non_success_body_still_soft_stops() {
        let truncated =
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial"
                .to_string();
        let (api, _server) = serve_once(truncated).await;

        let response = api.fetch_errors_page(&page_params()).await.unwrap();

        assert!(matches!(response, PageResponse::NonSuccess { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_resource_request_and_unauthorized() {
        let body = r#"[{"monitor_logical_name": "awslambda",
            "checks": [{"name": "Run", "logical_name": "RunFunction"}]}]"#;
        let (api, server) = serve_once(reply("200 OK", body)).await;

        let checks = api.list_checks(&["awslambda".to_string()], true).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /api/v0/monitor-checks?m%5B%5D=awslambda&include_shared=true "));
        assert_eq!(checks[0].checks.as_ref().unwrap()[0].logical_name.as_deref(), Some("RunFunction"));

        let (api, _server) = serve_once(reply("401 Unauthorized", "")).await;
        let err = api.list_monitors().await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[tokio::test]
    async fn test_verify_auth_reports_status_text() {
        let (api, server) = serve_once(reply("403 Forbidden", "")).await;

        let status = api.verify_auth().await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /api/v0/verify-auth "));
        assert_eq!(
            status,
            AuthStatus {
                code: 403,
                text: "403 Forbidden".to_string()
            }
        );
    }

    #[test]
    fn test_builder_defaults() {
        let api = HttpMonitorApi::builder().api_key("key").build().unwrap();
        assert_eq!(api.endpoint(), PROD_ENDPOINT);
        assert_eq!(api.api_key, "key");
    }

    #[test]
    fn test_builder_custom() {
        let api = HttpMonitorApi::builder()
            .endpoint("https://localhost:4443/api/v0/")
            .api_key("secret")
            .timeout(Duration::from_secs(5))
            .accept_invalid_certs(true)
            .build()
            .unwrap();

        assert_eq!(api.endpoint(), "https://localhost:4443/api/v0");
        assert_eq!(
            api.url("/monitor-telemetry"),
            "https://localhost:4443/api/v0/monitor-telemetry"
        );
    }

    #[test]
    fn test_builder_requires_api_key() {
        let err = HttpMonitorApi::builder().build().unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));

        let err = HttpMonitorApi::builder().api_key("").build().unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_builder_rejects_bad_endpoint() {
        let err = HttpMonitorApi::builder()
            .endpoint("not a url")
            .api_key("key")
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains("not a url")));
    }

    #[test]
    fn test_monitor_query() {
        let query = monitor_query(&["aws".to_string(), "gcp".to_string()], true);
        assert_eq!(
            query,
            vec![
                ("m[]", "aws".to_string()),
                ("m[]", "gcp".to_string()),
                ("include_shared", "true".to_string()),
            ]
        );
    }
}
