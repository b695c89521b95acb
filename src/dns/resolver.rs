use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::source::{DnsSource, RawAnswer, RawOutcome};
use crate::errors::{with_retry, DangleError, RetryConfig};
use crate::models::{ResolutionRecord, ResolutionStatus};

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub chunk_size: usize,
    /// Per-name timeout retries and per-chunk failure retries.
    pub retries: u32,
    pub max_chain_hops: usize,
    pub retry: RetryConfig,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            retries: 3,
            max_chain_hops: 10,
            retry: RetryConfig::default(),
        }
    }
}

/// Result of resolving a whole candidate set.
#[derive(Debug, Default)]
pub struct BatchResolution {
    pub records: HashMap<String, ResolutionRecord>,
    pub chunks: usize,
    /// Indices of chunks whose source calls all failed.
    pub failed_chunks: Vec<usize>,
}

/// Chunked bulk resolver that owns CNAME chain walking.
pub struct Resolver {
    source: Arc<dyn DnsSource>,
    settings: ResolverSettings,
    cancel: CancellationToken,
}

struct Walk {
    record: ResolutionRecord,
    current: String,
    attempts: u32,
    seen: HashSet<String>,
    done: bool,
}

impl Walk {
    fn new(hostname: &str) -> Self {
        let mut seen = HashSet::new();
        seen.insert(hostname.to_string());
        Self {
            record: ResolutionRecord::new(hostname),
            current: hostname.to_string(),
            attempts: 0,
            seen,
            done: false,
        }
    }

    fn finish(&mut self, status: ResolutionStatus, detail: Option<String>) {
        self.record.status = status;
        self.record.detail = detail;
        self.done = true;
    }
}

impl Resolver {
    pub fn new(source: Arc<dyn DnsSource>, settings: ResolverSettings) -> Self {
        Self {
            source,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Resolve every hostname, one fixed-size chunk at a time. A chunk whose
    /// source calls keep failing is marked failed; the remaining chunks run.
    pub async fn resolve_batch(&self, hostnames: &[String]) -> Result<BatchResolution, DangleError> {
        let chunk_size = self.settings.chunk_size.max(1);
        let mut batch = BatchResolution::default();

        for (idx, chunk) in hostnames.chunks(chunk_size).enumerate() {
            if self.cancel.is_cancelled() {
                return Err(DangleError::Cancelled);
            }
            batch.chunks += 1;

            let (records, failed) = self.resolve_chunk(idx, chunk).await;
            if failed {
                batch.failed_chunks.push(idx);
            }
            for record in records {
                batch.records.insert(record.hostname.clone(), record);
            }
        }

        info!(
            hostnames = hostnames.len(),
            chunks = batch.chunks,
            failed_chunks = batch.failed_chunks.len(),
            source = self.source.name(),
            "Batch resolution complete"
        );
        Ok(batch)
    }

    async fn resolve_chunk(&self, idx: usize, hostnames: &[String]) -> (Vec<ResolutionRecord>, bool) {
        let mut walks: Vec<Walk> = hostnames.iter().map(|h| Walk::new(h)).collect();
        let operation = format!("dns chunk {}", idx);

        loop {
            let mut pending: Vec<String> = walks
                .iter()
                .filter(|w| !w.done)
                .map(|w| w.current.clone())
                .collect();
            if pending.is_empty() {
                break;
            }
            pending.sort();
            pending.dedup();

            let answers = with_retry(&operation, &self.settings.retry, || {
                self.source.lookup(&pending)
            })
            .await;

            let answers = match answers {
                Ok(answers) => answers,
                Err(e) => {
                    let failure = DangleError::PartialBatch {
                        phase: "dns-validate".into(),
                        chunk: idx,
                        reason: e.to_string(),
                    };
                    warn!(chunk = idx, hostnames = hostnames.len(), error = %failure, "Marking chunk unresolved");
                    for walk in walks.iter_mut().filter(|w| !w.done) {
                        walk.record.batch_failed = true;
                        walk.finish(ResolutionStatus::Error, Some(failure.to_string()));
                    }
                    return (walks.into_iter().map(|w| w.record).collect(), true);
                }
            };

            for walk in walks.iter_mut().filter(|w| !w.done) {
                let answer = answers
                    .get(&walk.current)
                    .cloned()
                    .unwrap_or_else(|| RawAnswer::servfail("no answer returned"));
                self.advance(walk, answer);
            }
        }

        (walks.into_iter().map(|w| w.record).collect(), false)
    }

    fn advance(&self, walk: &mut Walk, answer: RawAnswer) {
        match answer.outcome {
            RawOutcome::Timeout => {
                walk.attempts += 1;
                if walk.attempts > self.settings.retries {
                    let detail = format!("{} timed out after {} attempts", walk.current, walk.attempts);
                    walk.finish(ResolutionStatus::Timeout, Some(detail));
                }
            }
            RawOutcome::NxDomain => {
                walk.record.dangling = !walk.record.aliases().is_empty();
                let detail = walk.record.dangling.then(|| walk.current.clone());
                walk.finish(ResolutionStatus::Nxdomain, detail);
            }
            RawOutcome::NoData => {
                let detail = format!("{} has no address records", walk.current);
                walk.finish(ResolutionStatus::Error, Some(detail));
            }
            RawOutcome::ServFail(reason) => {
                walk.finish(ResolutionStatus::Error, Some(reason));
            }
            RawOutcome::Answer => match answer.cname {
                Some(target) => {
                    let target = target.trim_end_matches('.').to_ascii_lowercase();
                    if !walk.seen.insert(target.clone()) {
                        walk.finish(ResolutionStatus::ChainTooLong, Some(format!("CNAME loop at {}", target)));
                    } else if walk.record.aliases().len() >= self.settings.max_chain_hops {
                        let detail = format!("more than {} CNAME hops", self.settings.max_chain_hops);
                        walk.finish(ResolutionStatus::ChainTooLong, Some(detail));
                    } else {
                        debug!(hostname = %walk.record.hostname, from = %walk.current, to = %target, "Following CNAME");
                        walk.record.chain.push(target.clone());
                        walk.current = target;
                        walk.attempts = 0;
                    }
                }
                None if !answer.addresses.is_empty() => {
                    let mut addresses = answer.addresses;
                    addresses.sort();
                    addresses.dedup();
                    walk.record.addresses = addresses;
                    walk.finish(ResolutionStatus::Resolved, None);
                }
                None => {
                    walk.finish(ResolutionStatus::Error, Some("empty answer".into()));
                }
            },
        }
    }
}
