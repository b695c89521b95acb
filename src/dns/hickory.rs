use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::lookup::Lookup;
use hickory_resolver::proto::error::ProtoErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

use super::source::{DnsSource, RawAnswer, RawOutcome};
use crate::errors::DangleError;
use crate::utils::WorkerPool;

/// Production DNS source backed by hickory's async resolver.
///
/// Queries rotate across the configured resolver pool. Each name is asked for
/// its own CNAME first, then A, then AAAA records. Only records owned by the
/// queried name are reported, so the caller walks the chain one hop at a time
/// and sees NXDOMAIN on the exact hop that dangles.
pub struct HickorySource {
    resolver: TokioAsyncResolver,
    pool: WorkerPool,
}

/// The query never reached a server.
#[derive(Debug)]
struct TransportFailure(String);

impl HickorySource {
    pub fn new(resolvers: &[IpAddr], timeout: Duration, pool: WorkerPool) -> Self {
        let config = if resolvers.is_empty() {
            ResolverConfig::default()
        } else {
            ResolverConfig::from_parts(
                None,
                vec![],
                NameServerConfigGroup::from_ips_clear(resolvers, 53, true),
            )
        };

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        // Retries are owned by the chain walker.
        opts.attempts = 1;
        opts.rotate = true;
        opts.use_hosts_file = false;
        opts.num_concurrent_reqs = resolvers.len().clamp(1, 4);

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            pool,
        }
    }

    async fn query(&self, name: &str) -> Result<RawAnswer, TransportFailure> {
        for record_type in [RecordType::CNAME, RecordType::A, RecordType::AAAA] {
            if let Some(answer) = self.query_type(name, record_type).await? {
                return Ok(answer);
            }
        }
        Ok(RawAnswer::nodata())
    }

    /// `Ok(None)` means the name exists but holds no data of this type.
    async fn query_type(&self, name: &str, record_type: RecordType) -> Result<Option<RawAnswer>, TransportFailure> {
        let fqdn = format!("{}.", name);
        match self.resolver.lookup(fqdn.as_str(), record_type).await {
            Ok(lookup) => Ok(extract_answer(name, &lookup)),
            Err(e) => classify_error(name, e),
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

fn extract_answer(name: &str, lookup: &Lookup) -> Option<RawAnswer> {
    let mut cname = None;
    let mut addresses = Vec::new();

    for record in lookup.record_iter() {
        let owner = normalize(&record.name().to_utf8());
        if owner != name {
            continue;
        }
        match record.data() {
            Some(RData::CNAME(target)) => cname = Some(normalize(&target.0.to_utf8())),
            Some(RData::A(a)) => addresses.push(IpAddr::V4(a.0)),
            Some(RData::AAAA(aaaa)) => addresses.push(IpAddr::V6(aaaa.0)),
            _ => {}
        }
    }

    match cname {
        Some(target) => Some(RawAnswer::cname(target)),
        None if !addresses.is_empty() => Some(RawAnswer::addresses(addresses)),
        None => None,
    }
}

fn classify_error(name: &str, err: ResolveError) -> Result<Option<RawAnswer>, TransportFailure> {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            if *response_code == ResponseCode::NXDomain {
                Ok(Some(RawAnswer::nxdomain()))
            } else if *response_code == ResponseCode::NoError {
                Ok(None)
            } else {
                Ok(Some(RawAnswer::servfail(response_code.to_string())))
            }
        }
        ResolveErrorKind::Timeout => Ok(Some(RawAnswer::timeout())),
        ResolveErrorKind::NoConnections | ResolveErrorKind::Io(_) => {
            Err(TransportFailure(format!("{}: {}", name, err)))
        }
        ResolveErrorKind::Proto(proto)
            if matches!(proto.kind(), ProtoErrorKind::Io(_)) =>
        {
            Err(TransportFailure(format!("{}: {}", name, err)))
        }
        _ => {
            debug!(name, error = %err, "Lookup failed");
            Ok(Some(RawAnswer::servfail(err.to_string())))
        }
    }
}

#[async_trait]
impl DnsSource for HickorySource {
    fn name(&self) -> &str {
        "hickory"
    }

    async fn lookup(&self, names: &[String]) -> Result<HashMap<String, RawAnswer>, DangleError> {
        let futures = names.iter().map(|name| async move {
            let _permit = self.pool.acquire().await?;
            Ok::<_, DangleError>((name.clone(), self.query(name).await))
        });

        let mut outcomes = Vec::with_capacity(names.len());
        for result in join_all(futures).await {
            outcomes.push(result?);
        }

        if let Some(reason) = total_outage(&outcomes) {
            warn!(names = names.len(), "No lookup in batch got an answer from a resolver");
            return Err(DangleError::Dns(format!("no resolver answered ({})", reason)));
        }

        Ok(outcomes
            .into_iter()
            .map(|(name, outcome)| {
                let answer = outcome.unwrap_or_else(|TransportFailure(reason)| RawAnswer::servfail(reason));
                (name, answer)
            })
            .collect())
    }
}

/// Reason to fail the whole call when no name got a server answer, i.e. every
/// query timed out or never left the host.
fn total_outage(outcomes: &[(String, Result<RawAnswer, TransportFailure>)]) -> Option<String> {
    let mut reason = None;
    for (name, outcome) in outcomes {
        match outcome {
            Err(TransportFailure(detail)) => {
                reason.get_or_insert_with(|| detail.clone());
            }
            Ok(answer) if answer.outcome == RawOutcome::Timeout => {
                reason.get_or_insert_with(|| format!("{}: timed out", name));
            }
            Ok(_) => return None,
        }
    }
    reason
}
