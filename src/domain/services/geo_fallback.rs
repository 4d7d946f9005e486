//! Geo Fallback Resolver Service
//!
//! Tries geolocation providers in priority order and returns the first
//! success. Provider failures are logged and absorbed; running out of
//! providers is a degraded answer, not an error.

use crate::domain::entities::GeoLookup;
use crate::domain::ports::GeoProvider;
use std::net::IpAddr;
use std::sync::Arc;

/// Ordered provider-fallback chain.
///
/// Providers are awaited one at a time. Provider N+1 is never started
/// before provider N has failed, so lower-priority quota is only spent
/// when needed.
#[derive(Clone)]
pub struct GeoFallbackResolver {
    providers: Vec<Arc<dyn GeoProvider>>,
}

impl GeoFallbackResolver {
    pub fn new(providers: Vec<Arc<dyn GeoProvider>>) -> Self {
        Self { providers }
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Resolve geolocation for `ip`. Always returns a `GeoLookup`.
    pub async fn resolve(&self, ip: IpAddr) -> GeoLookup {
        for provider in &self.providers {
            match provider.lookup(ip).await {
                Ok(geo) => {
                    tracing::debug!("geo lookup for {} answered by {}", ip, provider.name());
                    return GeoLookup::found(ip, geo, provider.name());
                }
                Err(e) => {
                    tracing::warn!("geo provider {} failed for {}: {}", provider.name(), ip, e);
                }
            }
        }

        tracing::warn!(
            "all {} geo providers failed for {}, returning basic info",
            self.providers.len(),
            ip
        );
        GeoLookup::exhausted(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::GeoRecord;
    use crate::domain::errors::UpstreamError;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing_test::traced_test;

    // ===== Mock Implementations =====

    struct MockProvider {
        name: &'static str,
        outcome: Result<GeoRecord, UpstreamError>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn ok(name: &'static str, country: &str) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: Ok(GeoRecord {
                    country: Some(country.to_string()),
                    city: Some("Mountain View".to_string()),
                    ..Default::default()
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str, err: UpstreamError) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: Err(err),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoProvider for MockProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, _ip: IpAddr) -> Result<GeoRecord, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn chain(providers: &[&Arc<MockProvider>]) -> GeoFallbackResolver {
        GeoFallbackResolver::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn GeoProvider>)
                .collect(),
        )
    }

    fn ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let first = MockProvider::ok("first", "United States");
        let second = MockProvider::ok("second", "Canada");
        let resolver = chain(&[&first, &second]);

        let lookup = resolver.resolve(ip()).await;

        assert_eq!(lookup.source.as_deref(), Some("first"));
        assert_eq!(lookup.geo.country.as_deref(), Some("United States"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_to_second_provider() {
        let first = MockProvider::failing("first", UpstreamError::Timeout(Duration::from_secs(5)));
        let second = MockProvider::ok("second", "Canada");
        let third = MockProvider::ok("third", "Mexico");
        let resolver = chain(&[&first, &second, &third]);

        let lookup = resolver.resolve(ip()).await;

        assert_eq!(lookup.source.as_deref(), Some("second"));
        assert_eq!(lookup.geo.country.as_deref(), Some("Canada"));
        assert!(lookup.message.is_none());
        assert_eq!(first.calls(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_every_failure_mode_is_recovered() {
        let resolver = chain(&[
            &MockProvider::failing("a", UpstreamError::Transport("refused".into())),
            &MockProvider::failing("b", UpstreamError::Status(429)),
            &MockProvider::failing("c", UpstreamError::Malformed("eof".into())),
            &MockProvider::failing("d", UpstreamError::Rejected("reserved range".into())),
            &MockProvider::ok("e", "Japan"),
        ]);

        let lookup = resolver.resolve(ip()).await;
        assert_eq!(lookup.source.as_deref(), Some("e"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_all_providers_fail() {
        let first = MockProvider::failing("first", UpstreamError::Status(500));
        let second = MockProvider::failing("second", UpstreamError::Rejected("invalid IP".into()));
        let resolver = chain(&[&first, &second]);

        let lookup = resolver.resolve(ip()).await;

        assert!(lookup.is_exhausted());
        assert_eq!(lookup.ip, ip());
        assert_eq!(lookup.geo, GeoRecord::default());
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert!(logs_contain("geo provider second failed"));
        assert!(logs_contain("all 2 geo providers failed"));
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        let resolver = GeoFallbackResolver::new(vec![]);
        assert!(resolver.is_empty());
        assert!(resolver.resolve(ip()).await.is_exhausted());
    }

    #[test]
    fn test_provider_names_in_order() {
        let resolver = chain(&[
            &MockProvider::ok("ipapi.co", "x"),
            &MockProvider::ok("ipwho.is", "y"),
        ]);
        assert_eq!(resolver.provider_names(), vec!["ipapi.co", "ipwho.is"]);
    }
}
