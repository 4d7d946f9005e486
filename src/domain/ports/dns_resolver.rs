//! DNS Resolver Port
//!
//! Defines the interface for resolving a domain name to address records.

use crate::domain::entities::DnsAnswer;
use crate::domain::errors::UpstreamError;
use crate::domain::value_objects::{DomainName, RecordType};
use async_trait::async_trait;

/// Resolver for a single record type.
///
/// An empty answer (including NXDOMAIN) is `Ok(DnsAnswer::empty())`;
/// only a failure to get an answer at all is an error.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn query(
        &self,
        domain: &DomainName,
        record_type: RecordType,
    ) -> Result<DnsAnswer, UpstreamError>;
}
