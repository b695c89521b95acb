use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;

use super::prober::HttpProber;
use crate::errors::DangleError;
use crate::models::{HttpProbe, ProbeFailure, ProbeOutcome};
use crate::utils::truncation::{decode_body, truncate_error};
use crate::utils::WorkerPool;

const MAX_REDIRECTS: usize = 10;

/// Production prober: HTTPS first, plain HTTP when the TLS attempt never got
/// a response.
pub struct ReqwestProber {
    client: Client,
    max_body_bytes: usize,
    pool: WorkerPool,
}

impl ReqwestProber {
    pub fn new(
        timeout: Duration,
        max_body_kb: usize,
        user_agent: &str,
        pool: WorkerPool,
    ) -> Result<Self, DangleError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            // Takeover targets routinely serve the provider's default certificate.
            .danger_accept_invalid_certs(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DangleError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_body_bytes: max_body_kb.max(1) * 1024,
            pool,
        })
    }

    async fn probe_host(&self, host: &str) -> ProbeOutcome {
        match self.fetch(&format!("https://{}/", host)).await {
            Ok(probe) => ProbeOutcome::Response(probe),
            Err(https_failure) => {
                debug!(host, failure = %https_failure, "HTTPS probe failed, trying HTTP");
                match self.fetch(&format!("http://{}/", host)).await {
                    Ok(probe) => ProbeOutcome::Response(probe),
                    // A TLS failure on https is more telling than a refused port 80.
                    Err(ProbeFailure::ConnectionRefused) if https_failure == ProbeFailure::Tls => {
                        ProbeOutcome::Failed(ProbeFailure::Tls)
                    }
                    Err(failure) => ProbeOutcome::Failed(failure),
                }
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<HttpProbe, ProbeFailure> {
        let mut resp = self.client.get(url).send().await.map_err(map_error)?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let mut raw = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(map_error)? {
            raw.extend_from_slice(&chunk);
            if raw.len() > self.max_body_bytes {
                break;
            }
        }
        let (body, truncated) = decode_body(&raw, self.max_body_bytes);

        Ok(HttpProbe {
            url: final_url,
            status,
            body,
            truncated,
            headers,
        })
    }
}

fn map_error(err: reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        return ProbeFailure::Timeout;
    }
    let chain = error_chain(&err).to_ascii_lowercase();
    if err.is_connect() {
        if chain.contains("certificate") || chain.contains("tls") || chain.contains("handshake") {
            return ProbeFailure::Tls;
        }
        if chain.contains("dns") {
            return ProbeFailure::Other(truncate_error(&format!("name resolution failed: {}", chain)));
        }
        return ProbeFailure::ConnectionRefused;
    }
    ProbeFailure::Other(truncate_error(&chain))
}

/// reqwest hides the interesting part of a failure in its source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

#[async_trait]
impl HttpProber for ReqwestProber {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn probe(&self, hosts: &[String]) -> Result<HashMap<String, ProbeOutcome>, DangleError> {
        let futures = hosts.iter().map(|host| async move {
            let _permit = self.pool.acquire().await?;
            Ok::<_, DangleError>((host.clone(), self.probe_host(host).await))
        });

        let mut outcomes = HashMap::with_capacity(hosts.len());
        for result in join_all(futures).await {
            let (host, outcome) = result?;
            outcomes.insert(host, outcome);
        }
        Ok(outcomes)
    }
}
