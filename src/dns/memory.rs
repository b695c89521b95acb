use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::source::{DnsSource, RawAnswer};
use crate::errors::DangleError;
use crate::utils::hostname::is_within;

/// Deterministic in-memory DNS. Unknown names are NXDOMAIN unless they sit
/// under a configured wildcard zone.
#[derive(Debug, Default)]
pub struct StaticDnsSource {
    records: HashMap<String, RawAnswer>,
    wildcards: HashMap<String, RawAnswer>,
    outages: HashSet<String>,
    calls: AtomicUsize,
}

impl StaticDnsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, name: &str, answer: RawAnswer) -> Self {
        self.records.insert(name.to_string(), answer);
        self
    }

    pub fn with_cname(self, name: &str, target: &str) -> Self {
        self.with_answer(name, RawAnswer::cname(target))
    }

    pub fn with_address(self, name: &str, addr: IpAddr) -> Self {
        self.with_answer(name, RawAnswer::addresses(vec![addr]))
    }

    /// Every name under `zone` without its own record gets `answer`.
    pub fn with_wildcard(mut self, zone: &str, answer: RawAnswer) -> Self {
        self.wildcards.insert(zone.to_string(), answer);
        self
    }

    /// Any lookup call that includes `name` fails as a whole.
    pub fn with_outage(mut self, name: &str) -> Self {
        self.outages.insert(name.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer_for(&self, name: &str) -> RawAnswer {
        if let Some(answer) = self.records.get(name) {
            return answer.clone();
        }
        self.wildcards
            .iter()
            .filter(|(zone, _)| name != zone.as_str() && is_within(name, zone))
            .max_by_key(|(zone, _)| zone.len())
            .map(|(_, answer)| answer.clone())
            .unwrap_or_else(RawAnswer::nxdomain)
    }
}

#[async_trait]
impl DnsSource for StaticDnsSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn lookup(&self, names: &[String]) -> Result<HashMap<String, RawAnswer>, DangleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(down) = names.iter().find(|n| self.outages.contains(n.as_str())) {
            return Err(DangleError::Dns(format!("resolver outage while querying {}", down)));
        }
        Ok(names.iter().map(|n| (n.clone(), self.answer_for(n))).collect())
    }
}
