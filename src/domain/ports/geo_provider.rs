//! GeoIP Provider Port
//!
//! Defines the interface for looking up geolocation for an IP address
//! from one external provider.

use crate::domain::entities::GeoRecord;
use crate::domain::errors::UpstreamError;
use async_trait::async_trait;
use std::net::IpAddr;

/// One geolocation source in the fallback chain.
///
/// This is an outbound port. An implementation reports success only
/// when the transport succeeded and the provider's own success flag
/// confirms the data; anything else is an `UpstreamError`.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Stable provider name, reported as `source` when it answers.
    fn name(&self) -> &str;

    /// Look up and normalize geolocation for `ip`.
    async fn lookup(&self, ip: IpAddr) -> Result<GeoRecord, UpstreamError>;
}
