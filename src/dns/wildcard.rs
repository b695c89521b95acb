use dashmap::DashMap;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::resolver::Resolver;
use crate::models::ResolutionRecord;

const LABEL_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const LABEL_LEN: usize = 12;

/// Flags parent zones that answer for any label.
///
/// Verdicts are cached per zone for the detector's lifetime, so repeated
/// calls within a scan see the same answer.
pub struct WildcardDetector {
    resolver: Arc<Resolver>,
    probes: usize,
    threshold_pct: u8,
    cache: DashMap<String, bool>,
}

impl WildcardDetector {
    pub fn new(resolver: Arc<Resolver>, probes: usize, threshold_pct: u8) -> Self {
        Self {
            resolver,
            probes: probes.max(1),
            threshold_pct: threshold_pct.clamp(1, 100),
            cache: DashMap::new(),
        }
    }

    pub async fn is_wildcard(&self, zone: &str) -> bool {
        if let Some(cached) = self.cache.get(zone) {
            return *cached;
        }

        let labels: Vec<String> = (0..self.probes)
            .map(|_| format!("{}.{}", random_label(), zone))
            .collect();

        let batch = match self.resolver.resolve_batch(&labels).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(zone, error = %e, "Wildcard probe aborted, treating zone as normal");
                return false;
            }
        };
        if !batch.failed_chunks.is_empty() {
            warn!(zone, "Wildcard probes could not be resolved, treating zone as normal");
            return false;
        }

        let mut signatures: HashMap<String, usize> = HashMap::new();
        for record in batch.records.values().filter(|r| r.is_resolved()) {
            *signatures.entry(terminal_signature(record)).or_insert(0) += 1;
        }
        let top = signatures.values().copied().max().unwrap_or(0);
        let wildcard = top * 100 >= self.threshold_pct as usize * self.probes;

        if wildcard {
            info!(zone, agreeing = top, probes = self.probes, "Wildcard zone detected");
        } else {
            debug!(zone, agreeing = top, probes = self.probes, "Zone is not wildcarded");
        }
        self.cache.insert(zone.to_string(), wildcard);
        wildcard
    }

    pub fn cached_zones(&self) -> usize {
        self.cache.len()
    }
}

/// Where a probe ultimately landed: its last CNAME target, else its addresses.
fn terminal_signature(record: &ResolutionRecord) -> String {
    match record.terminal_target() {
        Some(target) => target.to_string(),
        None => record
            .addresses
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(","),
    }
}

fn random_label() -> String {
    let mut rng = rand::thread_rng();
    (0..LABEL_LEN)
        .map(|_| LABEL_CHARSET[rng.gen_range(0..LABEL_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{RawAnswer, ResolverSettings, StaticDnsSource};
    use crate::errors::RetryConfig;

    fn detector(source: StaticDnsSource) -> (WildcardDetector, Arc<StaticDnsSource>) {
        let source = Arc::new(source);
        let settings = ResolverSettings {
            retry: RetryConfig::immediate(0),
            ..ResolverSettings::default()
        };
        let resolver = Arc::new(Resolver::new(source.clone(), settings));
        (WildcardDetector::new(resolver, 5, 80), source)
    }

    #[tokio::test]
    async fn test_catch_all_zone_is_wildcard() {
        let source = StaticDnsSource::new()
            .with_wildcard("apps.example.com", RawAnswer::cname("lb.example-cdn.net"))
            .with_address("lb.example-cdn.net", "10.1.1.1".parse().unwrap());
        let (detector, _) = detector(source);
        assert!(detector.is_wildcard("apps.example.com").await);
    }

    #[tokio::test]
    async fn test_normal_zone_is_not_wildcard() {
        let source = StaticDnsSource::new().with_address("www.example.com", "10.1.1.1".parse().unwrap());
        let (detector, _) = detector(source);
        assert!(!detector.is_wildcard("example.com").await);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_idempotent_and_cached() {
        let source = StaticDnsSource::new()
            .with_wildcard("example.org", RawAnswer::addresses(vec!["10.2.2.2".parse().unwrap()]));
        let (detector, source) = detector(source);

        let first = detector.is_wildcard("example.org").await;
        let calls = source.call_count();
        let second = detector.is_wildcard("example.org").await;
        assert!(first);
        assert_eq!(first, second);
        assert_eq!(source.call_count(), calls);
        assert_eq!(detector.cached_zones(), 1);
    }

    #[tokio::test]
    async fn test_nxdomain_zone_cached_as_normal() {
        let (detector, _) = detector(StaticDnsSource::new());
        assert!(!detector.is_wildcard("quiet.example.com").await);
        assert_eq!(detector.cached_zones(), 1);
    }

    #[test]
    fn test_random_label_shape() {
        let label = random_label();
        assert_eq!(label.len(), LABEL_LEN);
        assert!(label.bytes().all(|b| LABEL_CHARSET.contains(&b)));
    }
}
