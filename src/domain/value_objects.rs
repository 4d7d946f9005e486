//! Value Objects - Immutable domain primitives
//!
//! Validated inputs (URLs, domain names) and small enums describing
//! DNS record types. Constructing one of these is the only way input
//! reaches the outbound adapters.

use crate::domain::errors::LookupError;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::sync::OnceLock;

/// Sentinel used for geolocation fields no provider could fill.
pub const UNKNOWN: &str = "Unknown";

/// DNS address record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecordType {
    /// IPv4 address record (type 1)
    A,
    /// IPv6 address record (type 28)
    Aaaa,
}

impl RecordType {
    /// Numeric record type as used on the wire.
    pub fn code(&self) -> u16 {
        match self {
            Self::A => 1,
            Self::Aaaa => 28,
        }
    }

    /// Mnemonic used in DoH query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::A),
            28 => Some(Self::Aaaa),
            _ => None,
        }
    }

    /// The IP version carried by records of this type.
    pub fn ip_version(&self) -> IpVersion {
        match self {
            Self::A => IpVersion::V4,
            Self::Aaaa => IpVersion::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IP protocol version of a resolved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V4 => "IPv4",
            Self::V6 => "IPv6",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
            .expect("hostname pattern is a valid regex")
    })
}

/// A syntactically plausible DNS name with a TLD.
///
/// # Examples
/// ```
/// use check_tools::domain::value_objects::DomainName;
///
/// let name = DomainName::parse("https://Example.com/some/path").unwrap();
/// assert_eq!(name.as_str(), "Example.com");
/// assert!(DomainName::parse("-bad.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName(String);

impl DomainName {
    /// Strip a leading scheme and any path, then validate the hostname.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let cleaned = Self::normalize(raw);
        if hostname_pattern().is_match(&cleaned) {
            Ok(Self(cleaned))
        } else {
            Err(LookupError::InvalidDomain(cleaned))
        }
    }

    /// Reduce user input to the bare host part.
    pub fn normalize(raw: &str) -> String {
        let mut s = raw.trim();
        for scheme in ["https://", "http://"] {
            // `get` keeps the prefix check on a char boundary for non-ASCII input
            if s
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            {
                s = &s[scheme.len()..];
                break;
            }
        }
        let s = s.strip_suffix('/').unwrap_or(s);
        s.split('/').next().unwrap_or_default().to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An absolute URL (scheme + host) whose reachability can be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    raw: String,
    url: Url,
}

impl TargetUrl {
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let url = Url::parse(raw).map_err(|_| LookupError::InvalidUrl(raw.to_string()))?;
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Self {
                raw: raw.to_string(),
                url,
            }),
            _ => Err(LookupError::InvalidUrl(raw.to_string())),
        }
    }

    /// The URL exactly as the caller supplied it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
