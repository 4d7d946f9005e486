//! DNS-over-HTTPS Resolver
//!
//! Implements DnsResolver using the JSON flavour of DoH
//! (`GET ?name=<domain>&type=<A|AAAA>` returning `{Status, Answer}`),
//! as served by dns.google and cloudflare-dns.com.

use crate::domain::entities::{DnsAnswer, DnsRecord};
use crate::domain::errors::UpstreamError;
use crate::domain::ports::DnsResolver;
use crate::domain::value_objects::{DomainName, RecordType};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_DOH_URL: &str = "https://dns.google/resolve";
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status", default)]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

/// DoH JSON resolver.
pub struct DohResolver {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl DohResolver {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            client,
        }
    }

    /// Keep address answers of the requested type; count everything.
    fn parse_answer(response: DohResponse, record_type: RecordType) -> DnsAnswer {
        if response.status != 0 {
            // NXDOMAIN, SERVFAIL from authoritative side, etc: nothing usable
            return DnsAnswer::new(Vec::new(), response.answer.len());
        }

        let answer_count = response.answer.len();
        let records = response
            .answer
            .into_iter()
            .filter(|a| a.record_type == record_type.code())
            .filter_map(|a| a.data.trim().parse::<IpAddr>().ok())
            .filter(|ip| match record_type {
                RecordType::A => ip.is_ipv4(),
                RecordType::Aaaa => ip.is_ipv6(),
            })
            .map(|ip| DnsRecord::new(ip, record_type))
            .collect();

        DnsAnswer::new(records, answer_count)
    }
}

impl Default for DohResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DOH_URL, DEFAULT_DNS_TIMEOUT, reqwest::Client::new())
    }
}

#[async_trait]
impl DnsResolver for DohResolver {
    async fn query(
        &self,
        domain: &DomainName,
        record_type: RecordType,
    ) -> Result<DnsAnswer, UpstreamError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", domain.as_str()), ("type", record_type.as_str())])
            .header(ACCEPT, "application/dns-json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: DohResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let answer = Self::parse_answer(body, record_type);
        tracing::debug!(
            "doh {} {}: {} address(es) of {} answer(s)",
            record_type,
            domain,
            answer.records.len(),
            answer.answer_count
        );
        Ok(answer)
    }
}
