use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::prober::HttpProber;
use crate::errors::DangleError;
use crate::models::{HttpProbe, ProbeFailure, ProbeOutcome};

/// Deterministic in-memory prober. Hosts without a canned response are
/// refused; every probed host is recorded.
#[derive(Debug, Default)]
pub struct StaticProber {
    responses: HashMap<String, ProbeOutcome>,
    outages: HashSet<String>,
    probed: Mutex<Vec<String>>,
}

impl StaticProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, host: &str, status: u16, body: &str) -> Self {
        let probe = HttpProbe::new(format!("https://{}/", host), status, body);
        self.responses.insert(host.to_string(), ProbeOutcome::Response(probe));
        self
    }

    pub fn with_failure(mut self, host: &str, failure: ProbeFailure) -> Self {
        self.responses.insert(host.to_string(), ProbeOutcome::Failed(failure));
        self
    }

    /// Any probe call that includes `host` fails as a whole.
    pub fn with_outage(mut self, host: &str) -> Self {
        self.outages.insert(host.to_string());
        self
    }

    /// Hosts seen so far, in call order.
    pub fn probed_hosts(&self) -> Vec<String> {
        self.probed.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpProber for StaticProber {
    fn name(&self) -> &str {
        "static"
    }

    async fn probe(&self, hosts: &[String]) -> Result<HashMap<String, ProbeOutcome>, DangleError> {
        if let Ok(mut probed) = self.probed.lock() {
            probed.extend(hosts.iter().cloned());
        }
        if let Some(down) = hosts.iter().find(|h| self.outages.contains(h.as_str())) {
            return Err(DangleError::Http(format!("prober outage while probing {}", down)));
        }
        Ok(hosts
            .iter()
            .map(|h| {
                let outcome = self
                    .responses
                    .get(h)
                    .cloned()
                    .unwrap_or(ProbeOutcome::Failed(ProbeFailure::ConnectionRefused));
                (h.clone(), outcome)
            })
            .collect())
    }
}
