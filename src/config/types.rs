use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use crate::blacklist::BlacklistCategory;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DangleConfig {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub enumeration: EnumerationSettings,
    /// Case-insensitive substrings checked against every chain hop.
    #[serde(default)]
    pub blacklist: BTreeMap<BlacklistCategory, Vec<String>>,
    /// Body phrases showing the provider still wants DNS-console verification.
    #[serde(default)]
    pub verification_patterns: Vec<String>,
    #[serde(default)]
    pub providers: Vec<ProviderProfile>,
    /// Glob patterns of extra YAML files, each holding a list of provider profiles.
    #[serde(default)]
    pub provider_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_max_chain_hops")]
    pub max_chain_hops: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_secs: u64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<IpAddr>,
    #[serde(default = "default_wildcard_probes")]
    pub wildcard_probes: usize,
    #[serde(default = "default_wildcard_threshold")]
    pub wildcard_threshold_pct: u8,
    #[serde(default = "default_body_scan_kb")]
    pub body_scan_kb: usize,
    #[serde(default = "default_max_body_kb")]
    pub max_body_kb: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

pub const MIN_WILDCARD_PROBES: usize = 5;

fn default_chunk_size() -> usize {
    1000
}

fn default_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_max_chain_hops() -> usize {
    10
}

fn default_workers() -> usize {
    8
}

fn default_dns_timeout() -> u64 {
    5
}

fn default_http_timeout() -> u64 {
    10
}

fn default_resolvers() -> Vec<IpAddr> {
    [[8, 8, 8, 8], [1, 1, 1, 1], [208, 67, 222, 222], [9, 9, 9, 9]]
        .into_iter()
        .map(IpAddr::from)
        .collect()
}

fn default_wildcard_probes() -> usize {
    MIN_WILDCARD_PROBES
}

fn default_wildcard_threshold() -> u8 {
    80
}

fn default_body_scan_kb() -> usize {
    64
}

fn default_max_body_kb() -> usize {
    256
}

fn default_user_agent() -> String {
    format!("dangle/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            retries: default_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_chain_hops: default_max_chain_hops(),
            workers: default_workers(),
            dns_timeout_secs: default_dns_timeout(),
            http_timeout_secs: default_http_timeout(),
            resolvers: default_resolvers(),
            wildcard_probes: default_wildcard_probes(),
            wildcard_threshold_pct: default_wildcard_threshold(),
            body_scan_kb: default_body_scan_kb(),
            max_body_kb: default_max_body_kb(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScanSettings {
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Wildcard probe count, never below the detection floor.
    pub fn effective_wildcard_probes(&self) -> usize {
        self.wildcard_probes.max(MIN_WILDCARD_PROBES)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnumerationSettings {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_enumeration_timeout")]
    pub timeout_secs: u64,
}

fn default_binary() -> String {
    "subfinder".to_string()
}

fn default_enumeration_timeout() -> u64 {
    300
}

impl Default for EnumerationSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            args: Vec::new(),
            timeout_secs: default_enumeration_timeout(),
        }
    }
}

/// Reference data for one hosting provider.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProviderProfile {
    pub name: String,
    /// Domain suffixes a terminal CNAME target may end in.
    #[serde(default)]
    pub cname_suffixes: Vec<String>,
    /// Inline CIDR ranges.
    #[serde(default)]
    pub cidrs: Vec<String>,
    /// JSON range files, relative to the config file's directory.
    #[serde(default)]
    pub cidr_files: Vec<String>,
    /// Body text the provider serves for an unclaimed resource.
    #[serde(default)]
    pub unclaimed_signatures: Vec<String>,
    /// Status codes worth flagging without a body match.
    #[serde(default)]
    pub suspicious_statuses: Vec<u16>,
}
