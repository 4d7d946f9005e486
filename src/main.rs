//! check-tools - Website status and IP geolocation API
//!
//! This is the composition root that wires together all the components.

use check_tools::adapters::inbound::HttpServer;
use check_tools::adapters::outbound::{
    find_spec, DohResolver, HttpGeoProvider, HttpReachabilityProbe,
};
use check_tools::application::LookupService;
use check_tools::config::{load_config, Config};
use check_tools::domain::ports::GeoProvider;
use check_tools::domain::services::GeoFallbackResolver;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

/// Build the configured geo providers, in priority order.
///
/// Unknown names are skipped with a warning.
fn geo_providers(cfg: &Config, client: &reqwest::Client) -> Vec<Arc<dyn GeoProvider>> {
    let mut providers: Vec<Arc<dyn GeoProvider>> = Vec::new();

    for name in &cfg.geo_providers {
        let Some(spec) = find_spec(name) else {
            tracing::warn!("unknown geo provider {:?}, skipping", name);
            continue;
        };

        let mut provider = HttpGeoProvider::new(spec, client.clone())
            .with_user_agent(cfg.geo_user_agent.clone());
        if let Some(base_url) = cfg.provider_base_url(spec.name) {
            provider = provider.with_base_url(base_url);
        }
        if let Some(ms) = cfg.geo_timeout_ms {
            provider = provider.with_timeout(Duration::from_millis(ms));
        }
        providers.push(Arc::new(provider));
    }

    providers
}

fn lookup_service(cfg: &Config, client: reqwest::Client) -> LookupService {
    let dns = Arc::new(DohResolver::new(
        cfg.doh_url.clone(),
        Duration::from_millis(cfg.dns_timeout_ms),
        client.clone(),
    ));

    let probe = Arc::new(HttpReachabilityProbe::new(
        client.clone(),
        Duration::from_secs(cfg.check_timeout_secs),
        cfg.user_agent.clone(),
    ));

    let geo = GeoFallbackResolver::new(geo_providers(cfg, &client));
    if geo.is_empty() {
        tracing::warn!("no geo providers configured; /resolve and /ip return basic info only");
    }

    LookupService::new(dns, probe, geo)
        .with_dual_stack(cfg.dual_stack)
        .with_client_enrichment(cfg.ip_enrich)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting check-tools v{} listen={} doh={} providers={}",
        env!("CARGO_PKG_VERSION"),
        cfg.listen_addr,
        cfg.doh_url,
        cfg.geo_providers.join(",")
    );

    // ===== COMPOSITION ROOT =====

    // 1. Shared outbound HTTP client; timeouts are set per request
    let client = reqwest::Client::builder().build()?;

    // 2. Application service over DoH, HEAD probe and the geo chain
    let service = Arc::new(lookup_service(&cfg, client));

    // 3. Inbound adapter
    let server = HttpServer::new(cfg.listen_addr.clone(), service);

    server.run().await
}
