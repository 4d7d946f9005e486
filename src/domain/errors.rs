//! Domain Errors
//!
//! `LookupError` is what a request can fail with; `UpstreamError` is what
//! a single outbound call can fail with. Upstream errors never reach the
//! caller directly: the services either recover from them or fold them
//! into a `LookupError`.

use std::time::Duration;

/// Request-level failure, surfaced to the caller with a status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Please provide ?{0}=...")]
    MissingParameter(&'static str),
    #[error("URL format is invalid")]
    InvalidUrl(String),
    #[error("Domain format is invalid")]
    InvalidDomain(String),
    #[error("No IP address found for this domain")]
    DomainNotFound(String),
    #[error("No IPv4 or IPv6 address record found")]
    NoAddressRecord(String),
    #[error("Cannot resolve domain: {reason}")]
    DnsLookupFailed { domain: String, reason: String },
    /// A fault in this service rather than in an upstream
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LookupError {
    /// Machine-readable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "MissingParameter",
            Self::InvalidUrl(_) => "InvalidUrl",
            Self::InvalidDomain(_) => "InvalidDomain",
            Self::DomainNotFound(_) => "DomainNotFound",
            Self::NoAddressRecord(_) => "NoAddressRecord",
            Self::DnsLookupFailed { .. } => "DnsLookupFailed",
            Self::Internal(_) => "Internal",
        }
    }

    /// The offending URL, if this error is about one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::InvalidUrl(url) => Some(url),
            _ => None,
        }
    }

    /// The offending domain, if this error is about one.
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::InvalidDomain(d) | Self::DomainNotFound(d) | Self::NoAddressRecord(d) => Some(d),
            Self::DnsLookupFailed { domain, .. } => Some(domain),
            _ => None,
        }
    }
}

/// Failure of one outbound call (a DNS query or a geolocation provider).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed body: {0}")]
    Malformed(String),
    #[error("provider reported failure: {0}")]
    Rejected(String),
}

impl UpstreamError {
    /// Classify a reqwest error, keeping timeouts distinct.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
