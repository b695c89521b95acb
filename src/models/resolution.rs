use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Terminal state of a CNAME chain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Chain ended at one or more address records.
    Resolved,
    /// Some name in the chain does not exist.
    Nxdomain,
    /// Retry budget exhausted without an answer.
    Timeout,
    /// Hop cap exceeded or the chain loops back on itself.
    ChainTooLong,
    /// SERVFAIL, REFUSED, empty answers, or a failed batch.
    Error,
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::Nxdomain => write!(f, "nxdomain"),
            Self::Timeout => write!(f, "timeout"),
            Self::ChainTooLong => write!(f, "chain-too-long"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Outcome of resolving one hostname. Built once by the resolver, then read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub hostname: String,
    /// Root hostname first, terminal CNAME target last.
    pub chain: Vec<String>,
    pub addresses: Vec<IpAddr>,
    pub status: ResolutionStatus,
    /// At least one alias was followed and the final target does not exist.
    #[serde(default)]
    pub dangling: bool,
    /// The whole chunk this name belonged to failed.
    #[serde(default)]
    pub batch_failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResolutionRecord {
    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        Self {
            chain: vec![hostname.clone()],
            hostname,
            addresses: Vec::new(),
            status: ResolutionStatus::Error,
            dangling: false,
            batch_failed: false,
            detail: None,
        }
    }

    /// CNAME targets only, without the owning hostname.
    pub fn aliases(&self) -> &[String] {
        self.chain.get(1..).unwrap_or(&[])
    }

    /// Last CNAME target, if the hostname is an alias at all.
    pub fn terminal_target(&self) -> Option<&str> {
        self.aliases().last().map(String::as_str)
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_accessors() {
        let mut record = ResolutionRecord::new("shop.example.com");
        assert!(record.aliases().is_empty());
        assert_eq!(record.terminal_target(), None);

        record.chain.push("example.myshopify.com".into());
        record.chain.push("shops.myshopify.com".into());
        assert_eq!(record.aliases().len(), 2);
        assert_eq!(record.terminal_target(), Some("shops.myshopify.com"));
    }

    #[test]
    fn test_status_serializes_screaming() {
        let json = serde_json::to_string(&ResolutionStatus::ChainTooLong).unwrap();
        assert_eq!(json, "\"CHAIN_TOO_LONG\"");
    }
}
