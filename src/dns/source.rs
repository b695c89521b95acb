use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;

use crate::errors::DangleError;

/// Per-name result of a single DNS query, before any chain walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutcome {
    Answer,
    NxDomain,
    /// Name exists but holds neither a CNAME nor address records.
    NoData,
    Timeout,
    ServFail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAnswer {
    pub cname: Option<String>,
    pub addresses: Vec<IpAddr>,
    pub outcome: RawOutcome,
}

impl RawAnswer {
    pub fn cname(target: impl Into<String>) -> Self {
        Self { cname: Some(target.into()), addresses: Vec::new(), outcome: RawOutcome::Answer }
    }

    pub fn addresses(addresses: Vec<IpAddr>) -> Self {
        Self { cname: None, addresses, outcome: RawOutcome::Answer }
    }

    pub fn nxdomain() -> Self {
        Self::failed(RawOutcome::NxDomain)
    }

    pub fn nodata() -> Self {
        Self::failed(RawOutcome::NoData)
    }

    pub fn timeout() -> Self {
        Self::failed(RawOutcome::Timeout)
    }

    pub fn servfail(detail: impl Into<String>) -> Self {
        Self::failed(RawOutcome::ServFail(detail.into()))
    }

    fn failed(outcome: RawOutcome) -> Self {
        Self { cname: None, addresses: Vec::new(), outcome }
    }
}

/// Bulk DNS lookups. Returns one answer per queried name; `Err` means the
/// whole call failed and nothing in it can be trusted.
#[async_trait]
pub trait DnsSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, names: &[String]) -> Result<HashMap<String, RawAnswer>, DangleError>;
}
