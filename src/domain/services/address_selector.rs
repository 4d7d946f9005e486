//! Address Selector Service
//!
//! Pure domain logic for turning the A / AAAA query outcomes into one
//! address, or into the right error.

use crate::domain::entities::{DnsAnswer, DnsRecord};
use crate::domain::errors::{LookupError, UpstreamError};
use crate::domain::value_objects::DomainName;

/// Picks the address to report for a domain.
///
/// Preference order:
/// 1. First IPv4 (A) record
/// 2. First IPv6 (AAAA) record
///
/// When neither exists, an upstream failure on either query wins over
/// "not found", since the missing answer may be the failed one.
pub struct AddressSelector;

impl AddressSelector {
    /// # Arguments
    /// * `domain` - The queried domain (used for error context)
    /// * `v4` - Outcome of the A query
    /// * `v6` - Outcome of the AAAA query, or None when it was not issued
    pub fn pick(
        domain: &DomainName,
        v4: Result<DnsAnswer, UpstreamError>,
        v6: Option<Result<DnsAnswer, UpstreamError>>,
    ) -> Result<DnsRecord, LookupError> {
        let outcomes: Vec<Result<DnsAnswer, UpstreamError>> =
            std::iter::once(v4).chain(v6).collect();

        for answer in outcomes.iter().flatten() {
            if let Some(record) = answer.first() {
                return Ok(record.clone());
            }
        }

        if let Some(err) = outcomes.iter().find_map(|o| o.as_ref().err()) {
            return Err(LookupError::DnsLookupFailed {
                domain: domain.to_string(),
                reason: err.to_string(),
            });
        }

        let answered = outcomes
            .iter()
            .flatten()
            .any(|answer| answer.answer_count > 0);

        if answered {
            Err(LookupError::NoAddressRecord(domain.to_string()))
        } else {
            Err(LookupError::DomainNotFound(domain.to_string()))
        }
    }
}
