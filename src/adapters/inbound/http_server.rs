//! HTTP API Server
//!
//! Public JSON API: `/check`, `/resolve`, `/ip` and `/health`.
//! Every endpoint answers CORS preflights and allows any origin.

use crate::application::LookupService;
use crate::domain::entities::{
    CheckReport, ClientMetadata, ClientReport, DomainReport, GeoLookup, ReachabilityReport,
};
use crate::domain::errors::LookupError;
use crate::domain::value_objects::UNKNOWN;
use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

/// Decoded query string pairs, in order. Repeated keys are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct QueryPairs(pub Vec<(String, String)>);

impl QueryPairs {
    /// First value for `name`; later duplicates are ignored.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// `/check` response body.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub url: String,
    pub status: &'static str,
    pub up: bool,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
    #[serde(rename = "statusText", skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    #[serde(rename = "timeFormatted", skip_serializing_if = "Option::is_none")]
    pub time_formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl CheckResponse {
    pub fn from_report(check: CheckReport, timestamp: String) -> Self {
        let url = check.target.as_str().to_string();
        match check.report {
            ReachabilityReport::Reachable {
                http_code,
                status_text,
                ok,
                elapsed_ms,
            } => Self {
                url,
                status: if ok { "up" } else { "down" },
                up: ok,
                ok,
                http_code: Some(http_code),
                status_text: Some(status_text),
                response_time: Some(format!("{}ms", elapsed_ms)),
                time: Some(elapsed_ms),
                time_formatted: Some(format!("{}ms", elapsed_ms)),
                error: None,
                message: None,
                timestamp,
            },
            ReachabilityReport::Unreachable { error, .. } => Self {
                url,
                status: "down",
                up: false,
                ok: false,
                http_code: None,
                status_text: None,
                response_time: None,
                time: None,
                time_formatted: None,
                error: Some(error),
                message: Some("Website cannot be reached".to_string()),
                timestamp,
            },
        }
    }
}

/// `/resolve` response body. Missing values serialize as `null`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub domain: String,
    pub ip: String,
    pub version: &'static str,
    pub record_type: &'static str,
    pub country: String,
    pub country_code: Option<String>,
    pub region: String,
    pub city: String,
    pub postal: Option<String>,
    pub timezone: Option<String>,
    pub isp: String,
    pub org: Option<String>,
    pub asn: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timestamp: String,
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResolveResponse {
    pub fn from_report(report: DomainReport, timestamp: String) -> Self {
        let exhausted = report.lookup.is_exhausted();
        let geo = report.lookup.geo;
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            domain: report.domain.to_string(),
            ip: report.record.address.to_string(),
            version: report.record.version().as_str(),
            record_type: report.record.record_type.as_str(),
            country: or_unknown(geo.country),
            country_code: geo.country_code,
            region: or_unknown(geo.region),
            city: or_unknown(geo.city),
            postal: geo.postal,
            timezone: geo.timezone,
            isp: or_unknown(geo.isp),
            org: geo.org,
            asn: geo.asn,
            latitude: geo.latitude,
            longitude: geo.longitude,
            timestamp,
            source: report.lookup.source,
            error: exhausted.then_some(GeoLookup::EXHAUSTED_CODE),
            message: report.lookup.message,
        }
    }
}

/// `/ip` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpResponse {
    pub ip: String,
    pub country: String,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub timezone: Option<String>,
    pub postal: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub user_agent: String,
    pub timestamp: String,
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IpResponse {
    pub fn from_report(report: ClientReport, timestamp: String) -> Self {
        let exhausted = report.is_exhausted();
        let geo = report.geo;
        Self {
            ip: report.ip.unwrap_or_else(|| UNKNOWN.to_string()),
            country: geo.country.unwrap_or_else(|| UNKNOWN.to_string()),
            country_code: geo.country_code,
            city: geo.city,
            region: geo.region,
            timezone: geo.timezone,
            postal: geo.postal,
            isp: geo.isp,
            org: geo.org,
            user_agent: report.user_agent.unwrap_or_else(|| UNKNOWN.to_string()),
            timestamp,
            source: report.source,
            error: exhausted.then_some(GeoLookup::EXHAUSTED_CODE),
            message: report.message,
        }
    }
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub providers: Vec<String>,
}

/// Error body: `{error, message, url?, domain?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// LookupError rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LookupError);

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            LookupError::MissingParameter(_)
            | LookupError::InvalidUrl(_)
            | LookupError::InvalidDomain(_) => StatusCode::BAD_REQUEST,
            LookupError::DomainNotFound(_) | LookupError::NoAddressRecord(_) => StatusCode::NOT_FOUND,
            LookupError::DnsLookupFailed { .. } | LookupError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        } else {
            tracing::debug!("rejected request: {} ({})", self.0.kind(), self.0);
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
            url: self.0.url().map(str::to_string),
            domain: self.0.domain().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<LookupService>,
}

impl ApiState {
    pub fn new(service: Arc<LookupService>) -> Self {
        Self { service }
    }
}

/// A panicking handler becomes a JSON 500 `Internal` error.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("no panic message");
    tracing::error!("handler panicked: {}", detail);

    ApiError(LookupError::Internal(
        "unexpected fault while handling the request".to_string(),
    ))
    .into_response()
}

/// Build the router with panic recovery, CORS and request tracing.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/check", get(check_handler))
        .route("/resolve", get(resolve_handler))
        .route("/ip", get(ip_handler))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP API server.
pub struct HttpServer {
    listen_addr: String,
    state: ApiState,
}

impl HttpServer {
    pub fn new(listen_addr: String, service: Arc<LookupService>) -> Self {
        Self {
            listen_addr,
            state: ApiState::new(service),
        }
    }

    /// Run the API server.
    ///
    /// The final Ok(()) is excluded from coverage since axum::serve runs forever.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("HTTP API listening on {}", self.listen_addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Collect caller metadata from edge headers, falling back to the peer.
pub fn client_metadata(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientMetadata {
    let forwarded_for = header_value(headers, "x-forwarded-for").and_then(|v| {
        v.split(',')
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    });

    let ip = header_value(headers, "cf-connecting-ip")
        .or(forwarded_for)
        .or_else(|| header_value(headers, "x-real-ip"))
        .or_else(|| peer.map(|p| p.ip().to_string()));

    // "XX" is the edge's "unknown country" marker
    let country = header_value(headers, "cf-ipcountry").filter(|c| !c.eq_ignore_ascii_case("XX"));

    ClientMetadata {
        ip,
        country,
        city: header_value(headers, "cf-ipcity"),
        region: header_value(headers, "cf-region"),
        timezone: header_value(headers, "cf-timezone"),
        postal: header_value(headers, "cf-postal-code"),
        user_agent: header_value(headers, "user-agent"),
    }
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: state.service.geo_providers(),
    };
    Json(response)
}

async fn check_handler(
    State(state): State<ApiState>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<CheckResponse>, ApiError> {
    let check = state.service.check(params.first("url")).await?;
    tracing::info!("check {} -> up={}", check.target, check.report.is_up());
    Ok(Json(CheckResponse::from_report(check, timestamp())))
}

async fn resolve_handler(
    State(state): State<ApiState>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let report = state.service.resolve(params.first("domain")).await?;
    tracing::info!(
        "resolve {} -> {} (source: {})",
        report.domain,
        report.record.address,
        report.lookup.source.as_deref().unwrap_or("none")
    );
    Ok(Json(ResolveResponse::from_report(report, timestamp())))
}

async fn ip_handler(
    State(state): State<ApiState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<IpResponse> {
    let meta = client_metadata(&headers, peer.map(|ConnectInfo(addr)| addr));
    let report = state.service.client_info(meta).await;
    Json(IpResponse::from_report(report, timestamp()))
}
