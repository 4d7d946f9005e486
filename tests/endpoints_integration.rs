//! End-to-end tests for the HTTP API
//!
//! The full router over real adapters (DoH resolver, HEAD probe, HTTP geo
//! providers), with every upstream served by Wiremock.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use check_tools::adapters::inbound::{router, ApiState};
use check_tools::adapters::outbound::{
    find_spec, DohResolver, HttpGeoProvider, HttpReachabilityProbe,
};
use check_tools::application::LookupService;
use check_tools::domain::ports::GeoProvider;
use check_tools::domain::services::GeoFallbackResolver;
use http_body_util::BodyExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Router with DoH and all geo providers pointed at `upstream`.
fn create_app(upstream: &MockServer) -> Router {
    let client = reqwest::Client::new();

    let dns = Arc::new(DohResolver::new(
        format!("{}/resolve", upstream.uri()),
        Duration::from_millis(500),
        client.clone(),
    ));
    let probe = Arc::new(HttpReachabilityProbe::new(
        client.clone(),
        Duration::from_millis(500),
        "Mozilla/5.0 (CheckTools-Bot) Website-Status-Checker",
    ));
    let providers: Vec<Arc<dyn GeoProvider>> = ["ipapi.co", "ipwho.is", "ip-api.com"]
        .iter()
        .map(|name| {
            Arc::new(
                HttpGeoProvider::new(find_spec(name).unwrap(), client.clone())
                    .with_base_url(upstream.uri())
                    .with_timeout(Duration::from_millis(300)),
            ) as Arc<dyn GeoProvider>
        })
        .collect();

    let service = LookupService::new(dns, probe, GeoFallbackResolver::new(providers));
    router(ApiState::new(Arc::new(service)))
}

async fn mount_doh(server: &MockServer, record_type: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/resolve"))
        .and(query_param("type", record_type))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn ipapi_body(country: &str) -> serde_json::Value {
    serde_json::json!({
        "country_name": country,
        "country_code": "US",
        "region": "California",
        "city": "Mountain View",
        "postal": "94043",
        "timezone": "America/Los_Angeles",
        "org": "GOOGLE",
        "asn": "AS15169",
        "latitude": 37.42,
        "longitude": -122.08
    })
}

// ===== /resolve =====

#[tokio::test]
async fn test_resolve_prefers_ipv4() {
    let upstream = MockServer::start().await;

    mount_doh(&upstream, "A", serde_json::json!({
        "Status": 0,
        "Answer": [{"name": "dns.google.", "type": 1, "TTL": 300, "data": "8.8.8.8"}]
    }))
    .await;
    mount_doh(&upstream, "AAAA", serde_json::json!({
        "Status": 0,
        "Answer": [{"name": "dns.google.", "type": 28, "TTL": 300, "data": "2001:4860:4860::8888"}]
    }))
    .await;

    Mock::given(method("GET"))
        .and(path("/8.8.8.8/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ipapi_body("United States")))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=https://dns.google/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["domain"], "dns.google");
    assert_eq!(body["ip"], "8.8.8.8");
    assert_eq!(body["version"], "IPv4");
    assert_eq!(body["recordType"], "A");
    assert_eq!(body["country"], "United States");
    assert_eq!(body["countryCode"], "US");
    assert_eq!(body["isp"], "GOOGLE");
    assert_eq!(body["asn"], "AS15169");
    assert_eq!(body["source"], "ipapi.co");
    assert!(body.get("error").is_none());
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_resolve_ipv6_only_domain() {
    let upstream = MockServer::start().await;

    mount_doh(&upstream, "A", serde_json::json!({"Status": 0})).await;
    mount_doh(&upstream, "AAAA", serde_json::json!({
        "Status": 0,
        "Answer": [{"name": "v6.example.", "type": 28, "TTL": 300, "data": "2001:db8::1"}]
    }))
    .await;

    Mock::given(method("GET"))
        .and(path("/2001:db8::1/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ipapi_body("Documentation")))
        .mount(&upstream)
        .await;

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=v6.example.com").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ip"], "2001:db8::1");
    assert_eq!(body["version"], "IPv6");
    assert_eq!(body["recordType"], "AAAA");
}

#[tokio::test]
async fn test_resolve_nxdomain_is_404() {
    let upstream = MockServer::start().await;

    mount_doh(&upstream, "A", serde_json::json!({"Status": 3})).await;
    mount_doh(&upstream, "AAAA", serde_json::json!({"Status": 3})).await;

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=nope.example").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "DomainNotFound");
    assert_eq!(body["domain"], "nope.example");
}

#[tokio::test]
async fn test_resolve_cname_only_is_no_address() {
    let upstream = MockServer::start().await;

    let cname = serde_json::json!({
        "Status": 0,
        "Answer": [{"name": "alias.example.com.", "type": 5, "TTL": 300, "data": "target.example.net."}]
    });
    mount_doh(&upstream, "A", cname.clone()).await;
    mount_doh(&upstream, "AAAA", cname).await;

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=alias.example.com").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoAddressRecord");
}

#[tokio::test]
async fn test_resolve_dns_upstream_failure_is_500() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resolve"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=example.com").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "DnsLookupFailed");
    assert!(body["message"].as_str().unwrap().starts_with("Cannot resolve domain"));
}

#[tokio::test]
async fn test_resolve_all_geo_providers_down_is_200() {
    let upstream = MockServer::start().await;

    mount_doh(&upstream, "A", serde_json::json!({
        "Status": 0,
        "Answer": [{"name": "example.com.", "type": 1, "TTL": 300, "data": "93.184.216.34"}]
    }))
    .await;
    mount_doh(&upstream, "AAAA", serde_json::json!({"Status": 0})).await;
    // geo paths are unmatched and get Wiremock's default 404

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=example.com").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ip"], "93.184.216.34");
    assert_eq!(body["country"], "Unknown");
    assert_eq!(body["city"], "Unknown");
    assert!(body["source"].is_null());
    assert_eq!(body["error"], "AllProvidersExhausted");
    assert_eq!(body["message"], "Basic info only (GeoIP lookup failed)");
}

#[tokio::test]
async fn test_resolve_rejects_bad_input_before_dns() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resolve"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let (status, body) = get_json(create_app(&upstream), "/resolve").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingParameter");

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingParameter");

    let (status, body) = get_json(create_app(&upstream), "/resolve?domain=under_score.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidDomain");
}

// ===== /check =====

#[tokio::test]
async fn test_check_up() {
    let upstream = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let uri = format!("/check?url={}/status", upstream.uri());
    let (status, body) = get_json(create_app(&upstream), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["up"], true);
    assert_eq!(body["http_code"], 200);
    assert_eq!(body["statusText"], "OK");
    assert!(body["response_time"].as_str().unwrap().ends_with("ms"));
}

#[tokio::test]
async fn test_check_unreachable_is_200_down() {
    let upstream = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&upstream)
        .await;

    let uri = format!("/check?url={}/slow", upstream.uri());
    let (status, body) = get_json(create_app(&upstream), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "down");
    assert_eq!(body["message"], "Website cannot be reached");
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_check_missing_url() {
    let upstream = MockServer::start().await;
    let (status, body) = get_json(create_app(&upstream), "/check?url=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingParameter");
}

// ===== /ip =====

#[tokio::test]
async fn test_ip_enriches_forwarded_address() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/203.0.113.9/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "country_name": "Australia",
            "country_code": "AU",
            "org": "Example Telecom"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let request = Request::builder()
        .uri("/ip")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.2")
        .header("cf-ipcity", "Sydney")
        .header("user-agent", "integration-test")
        .body(Body::empty())
        .unwrap();
    let response = create_app(&upstream).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["ip"], "203.0.113.9");
    assert_eq!(body["country"], "Australia");
    assert_eq!(body["countryCode"], "AU");
    assert_eq!(body["city"], "Sydney");
    assert_eq!(body["isp"], "Example Telecom");
    assert_eq!(body["userAgent"], "integration-test");
    assert_eq!(body["source"], "ipapi.co");
}

#[tokio::test]
async fn test_ip_over_real_socket_uses_peer_address() {
    let upstream = MockServer::start().await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(&upstream);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    let body: serde_json::Value = reqwest::Client::new()
        .get(format!("http://{}/ip", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["ip"], "127.0.0.1");
    // loopback has no geo data and every provider 404s
    assert!(body["source"].is_null());
    assert_eq!(body["error"], "AllProvidersExhausted");
}

// ===== CORS =====

#[tokio::test]
async fn test_options_is_empty_200_with_cors() {
    let upstream = MockServer::start().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/resolve?domain=example.com")
        .header("origin", "https://status.example")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = create_app(&upstream).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("GET"));
    assert!(methods.contains("OPTIONS"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_error_responses_carry_cors_header() {
    let upstream = MockServer::start().await;

    let request = Request::builder()
        .uri("/check")
        .header("origin", "https://status.example")
        .body(Body::empty())
        .unwrap();
    let response = create_app(&upstream).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
