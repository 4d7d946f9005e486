//! Lookup Service - Main application use cases
//!
//! Orchestrates the three lookups exposed by the HTTP API:
//! URL reachability, domain → address → geolocation, and caller
//! metadata. This is the only interface the inbound adapter talks to.

use crate::domain::entities::{
    CheckReport, ClientMetadata, ClientReport, DnsRecord, DomainReport, GeoRecord,
};
use crate::domain::errors::LookupError;
use crate::domain::ports::{DnsResolver, ReachabilityProbe};
use crate::domain::services::{AddressSelector, GeoFallbackResolver};
use crate::domain::value_objects::{DomainName, RecordType, TargetUrl};
use std::net::IpAddr;
use std::sync::Arc;

/// Lookup service - main application use case.
pub struct LookupService {
    dns: Arc<dyn DnsResolver>,
    probe: Arc<dyn ReachabilityProbe>,
    geo: GeoFallbackResolver,
    /// Also query AAAA records (concurrently with A)
    dual_stack: bool,
    /// Run the geo chain for `/ip` callers
    enrich_client_ip: bool,
}

impl LookupService {
    /// Create a new lookup service. Dual-stack DNS and client
    /// enrichment are enabled by default.
    pub fn new(
        dns: Arc<dyn DnsResolver>,
        probe: Arc<dyn ReachabilityProbe>,
        geo: GeoFallbackResolver,
    ) -> Self {
        Self {
            dns,
            probe,
            geo,
            dual_stack: true,
            enrich_client_ip: true,
        }
    }

    pub fn with_dual_stack(mut self, enabled: bool) -> Self {
        self.dual_stack = enabled;
        self
    }

    pub fn with_client_enrichment(mut self, enabled: bool) -> Self {
        self.enrich_client_ip = enabled;
        self
    }

    /// Geo provider names in priority order.
    pub fn geo_providers(&self) -> Vec<String> {
        self.geo.provider_names()
    }

    /// Check whether a URL is reachable.
    ///
    /// Only validation can fail; an unreachable target is a normal report.
    pub async fn check(&self, raw_url: Option<&str>) -> Result<CheckReport, LookupError> {
        let raw = required(raw_url, "url")?;
        let target = TargetUrl::parse(raw)?;
        let report = self.probe.probe(&target).await;
        Ok(CheckReport { target, report })
    }

    /// Resolve a domain to one address, preferring IPv4.
    pub async fn resolve_address(&self, domain: &DomainName) -> Result<DnsRecord, LookupError> {
        if self.dual_stack {
            let (v4, v6) = tokio::join!(
                self.dns.query(domain, RecordType::A),
                self.dns.query(domain, RecordType::Aaaa),
            );
            AddressSelector::pick(domain, v4, Some(v6))
        } else {
            let v4 = self.dns.query(domain, RecordType::A).await;
            AddressSelector::pick(domain, v4, None)
        }
    }

    /// Resolve a domain and geolocate the chosen address.
    ///
    /// Geolocation never fails the request: if every provider fails the
    /// report carries an exhausted `GeoLookup`.
    pub async fn resolve(&self, raw_domain: Option<&str>) -> Result<DomainReport, LookupError> {
        let raw = required(raw_domain, "domain")?;
        let domain = DomainName::parse(raw)?;

        let record = self.resolve_address(&domain).await?;
        tracing::debug!("{} resolved to {} ({})", domain, record.address, record.record_type);

        let lookup = self.geo.resolve(record.address).await;

        Ok(DomainReport {
            domain,
            record,
            lookup,
        })
    }

    /// Describe the caller, enriching edge metadata with provider data.
    pub async fn client_info(&self, meta: ClientMetadata) -> ClientReport {
        let ip: Option<IpAddr> = meta.ip.as_deref().and_then(|s| s.trim().parse().ok());

        let lookup = match ip {
            Some(ip) if self.enrich_client_ip && !self.geo.is_empty() => {
                Some(self.geo.resolve(ip).await)
            }
            _ => None,
        };

        let (provided, source, message) = match lookup {
            Some(l) => (l.geo, l.source, l.message),
            None => (GeoRecord::default(), None, None),
        };

        // Provider data wins; edge headers fill the gaps.
        let geo = GeoRecord {
            country: provided.country.or_else(|| meta.country.clone()),
            country_code: provided.country_code.or_else(|| meta.country.clone()),
            region: provided.region.or(meta.region),
            city: provided.city.or(meta.city),
            postal: provided.postal.or(meta.postal),
            timezone: provided.timezone.or(meta.timezone),
            ..provided
        };

        ClientReport {
            ip: meta.ip,
            geo,
            source,
            message,
            user_agent: meta.user_agent,
        }
    }
}

/// A query parameter that must be present and non-blank.
fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, LookupError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(LookupError::MissingParameter(name)),
    }
}
