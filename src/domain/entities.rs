//! Domain Entities - Core business objects
//!
//! These entities describe what a lookup produces. They carry no
//! transport concerns: the inbound adapter decides how they are rendered.

use crate::domain::value_objects::{DomainName, IpVersion, RecordType, TargetUrl};
use serde::Serialize;
use std::net::IpAddr;

/// A resolved address plus the record type it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub address: IpAddr,
    pub record_type: RecordType,
}

impl DnsRecord {
    pub fn new(address: IpAddr, record_type: RecordType) -> Self {
        Self {
            address,
            record_type,
        }
    }

    pub fn version(&self) -> IpVersion {
        IpVersion::of(&self.address)
    }
}

/// Outcome of a single DNS query for one record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsAnswer {
    /// Address records of the requested type, in answer order
    pub records: Vec<DnsRecord>,
    /// Number of answer records of any type (CNAMEs included)
    pub answer_count: usize,
}

impl DnsAnswer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(records: Vec<DnsRecord>, answer_count: usize) -> Self {
        Self {
            records,
            answer_count,
        }
    }

    pub fn first(&self) -> Option<&DnsRecord> {
        self.records.first()
    }
}

/// Normalized geolocation fields. Every provider maps onto this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoRecord {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub postal: Option<String>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub asn: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Result of running the provider fallback chain for one IP.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLookup {
    pub ip: IpAddr,
    pub geo: GeoRecord,
    /// Name of the provider that answered; None when all failed
    pub source: Option<String>,
    pub message: Option<String>,
}

impl GeoLookup {
    pub const EXHAUSTED_CODE: &'static str = "AllProvidersExhausted";
    pub const EXHAUSTED_MESSAGE: &'static str = "Basic info only (GeoIP lookup failed)";

    pub fn found(ip: IpAddr, geo: GeoRecord, source: impl Into<String>) -> Self {
        Self {
            ip,
            geo,
            source: Some(source.into()),
            message: None,
        }
    }

    /// Every provider failed: keep the IP, leave geolocation unset.
    pub fn exhausted(ip: IpAddr) -> Self {
        Self {
            ip,
            geo: GeoRecord::default(),
            source: None,
            message: Some(Self::EXHAUSTED_MESSAGE.to_string()),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }
}

/// Reachability of a target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReachabilityReport {
    /// A response came back (any status)
    Reachable {
        http_code: u16,
        status_text: String,
        ok: bool,
        elapsed_ms: u64,
    },
    /// Timeout, DNS failure, refused connection, TLS error...
    Unreachable { error: String, elapsed_ms: u64 },
}

impl ReachabilityReport {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Reachable { ok: true, .. })
    }
}

/// Outcome of a `/check` request.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub target: TargetUrl,
    pub report: ReachabilityReport,
}

/// Outcome of a `/resolve` request.
#[derive(Debug, Clone)]
pub struct DomainReport {
    pub domain: DomainName,
    pub record: DnsRecord,
    pub lookup: GeoLookup,
}

/// Connection metadata supplied by the edge in front of the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientMetadata {
    pub ip: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub timezone: Option<String>,
    pub postal: Option<String>,
    pub user_agent: Option<String>,
}

/// Outcome of an `/ip` request: edge metadata merged with provider data.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientReport {
    pub ip: Option<String>,
    pub geo: GeoRecord,
    pub source: Option<String>,
    /// Set when enrichment ran and every provider failed
    pub message: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientReport {
    pub fn is_exhausted(&self) -> bool {
        self.message.is_some()
    }
}
