use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::PipelineEvent;
use super::metrics::compute_summary;
use super::phase::display_name;
use super::state::*;
use crate::config::ReferenceSnapshot;
use crate::dns::{DnsSource, Resolver, ResolverSettings, WildcardDetector};
use crate::enumeration::SubdomainSource;
use crate::errors::{with_retry, DangleError, RetryConfig};
use crate::http::HttpProber;
use crate::models::{
    Candidate, Evidence, HttpEvidenceSummary, ProbeFailure, ProbeOutcome, ProviderMatch, ResolutionRecord, Verdict,
    VerdictRecord,
};
use crate::providers::ProviderIdentifier;
use crate::utils::hostname::{is_public_suffix, is_within, parent_zone};
use crate::utils::normalize_hostname;

const PROBE_BATCH_FAILED: &str = "probe batch failed";

/// External collaborators a scan talks to.
#[derive(Clone)]
pub struct ScanSources {
    pub subdomains: Arc<dyn SubdomainSource>,
    pub dns: Arc<dyn DnsSource>,
    pub http: Arc<dyn HttpProber>,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub summary: ScanSummary,
    pub verdicts: Vec<VerdictRecord>,
}

/// A candidate plus whatever earlier phases learned about it.
struct Tracked {
    candidate: Candidate,
    record: Option<ResolutionRecord>,
    provider: Option<ProviderMatch>,
    probe: Option<ProbeOutcome>,
}

impl Tracked {
    fn new(candidate: Candidate) -> Self {
        Self {
            candidate,
            record: None,
            provider: None,
            probe: None,
        }
    }

    fn hostname(&self) -> &str {
        &self.candidate.hostname
    }
}

/// Drives one target through the seven validation phases.
///
/// Phases run as barriers: each consumes the previous working set in full
/// and hands on a subset. Dropped candidates get their verdict immediately
/// and never re-enter.
pub struct ScanOrchestrator {
    context: ScanContext,
    snapshot: ReferenceSnapshot,
    sources: ScanSources,
    identifier: ProviderIdentifier,
    retry: RetryConfig,
    state: Arc<RwLock<PipelineState>>,
    cancel_token: CancellationToken,
    event_tx: Option<mpsc::UnboundedSender<PipelineEvent>>,
    verdicts: Arc<RwLock<Vec<VerdictRecord>>>,
    /// Per-candidate timing is measured from here.
    started: Instant,
}

impl ScanOrchestrator {
    pub fn new(
        context: ScanContext,
        snapshot: ReferenceSnapshot,
        sources: ScanSources,
    ) -> Result<Self, DangleError> {
        if let Some(filter) = &context.provider_filter {
            if snapshot.providers.get(filter).is_none() {
                return Err(DangleError::Config(format!("Unknown provider '{}'", filter)));
            }
        }

        let retry = RetryConfig::new(snapshot.settings.retries, snapshot.settings.retry_base_delay());
        let identifier = snapshot.identifier();

        Ok(Self {
            context,
            snapshot,
            sources,
            identifier,
            retry,
            state: Arc::new(RwLock::new(PipelineState::new())),
            cancel_token: CancellationToken::new(),
            event_tx: None,
            verdicts: Arc::new(RwLock::new(Vec::new())),
            started: Instant::now(),
        })
    }

    /// Replace the orchestrator's cancel token with an external one (e.g. a Ctrl-C handler).
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Attach an event channel for streaming pipeline events to a progress display or writer.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    pub async fn run(&self) -> Result<ScanOutcome, DangleError> {
        match self.execute().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                {
                    let mut state = self.state.write().await;
                    state.status = PipelineStatus::Failed;
                    state.error = Some(e.to_string());
                }
                warn!(scan_id = %self.context.scan_id, error = %e, "Scan aborted");
                self.emit(PipelineEvent::ScanFailed { error: e.to_string() });
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<ScanOutcome, DangleError> {
        let started_at = Utc::now();
        {
            let mut state = self.state.write().await;
            state.status = PipelineStatus::Running;
            state.start_time = started_at;
        }
        info!(
            scan_id = %self.context.scan_id,
            target = %self.context.target,
            root = %self.context.root,
            provider_filter = ?self.context.provider_filter,
            "Scan started"
        );
        self.emit(PipelineEvent::ScanStarted {
            scan_id: self.context.scan_id.clone(),
            target: self.context.target.clone(),
        });

        let settings = &self.snapshot.settings;
        let resolver = Arc::new(
            Resolver::new(
                Arc::clone(&self.sources.dns),
                ResolverSettings {
                    chunk_size: settings.chunk_size,
                    retries: settings.retries,
                    max_chain_hops: settings.max_chain_hops,
                    retry: self.retry.clone(),
                },
            )
            .with_cancel_token(self.cancel_token.clone()),
        );
        let wildcard = WildcardDetector::new(
            Arc::clone(&resolver),
            settings.effective_wildcard_probes(),
            settings.wildcard_threshold_pct,
        );

        let working = self.enumerate().await?;
        let working = self.dns_validate(&resolver, working).await?;
        let working = self.wildcard_filter(&wildcard, working).await?;
        let working = self.blacklist_filter(working).await?;
        let working = self.provider_identify(working).await?;
        let working = self.http_validate(working).await?;
        self.classify(working).await?;

        let verdicts = self.verdicts.read().await.clone();
        let summary = {
            let mut state = self.state.write().await;
            state.current_phase = Some(PhaseName::Done);
            state.working_set = 0;
            state.status = PipelineStatus::Completed;
            compute_summary(
                &self.context.scan_id,
                &self.context.target,
                started_at,
                Utc::now(),
                state.phases.clone(),
                &verdicts,
            )
        };

        info!(
            scan_id = %summary.scan_id,
            verdicts = summary.total_verdicts,
            findings = summary.findings,
            duration_ms = summary.total_duration_ms,
            "Scan complete"
        );
        self.emit(PipelineEvent::ScanCompleted { summary: summary.clone() });

        Ok(ScanOutcome { summary, verdicts })
    }

    async fn enumerate(&self) -> Result<Vec<Tracked>, DangleError> {
        let ctx = &self.context;
        let (mut stats, started) = self.begin_phase(PhaseName::Enumerate, 1).await?;

        if ctx.is_subdomain_target() {
            info!(target = %ctx.target, "Target is already a subdomain, skipping enumeration");
            stats.skipped = true;
            let working = vec![Tracked::new(Candidate::direct(ctx.target.as_str()))];
            self.complete_phase(stats, started, &working).await;
            return Ok(working);
        }

        let source = &self.sources.subdomains;
        let raw = match with_retry("enumerate", &self.retry, || source.enumerate(&ctx.root)).await {
            Ok(names) => names,
            Err(e) => {
                warn!(root = %ctx.root, source = source.name(), error = %e, "Enumeration failed, continuing with the root domain only");
                stats.failed = 1;
                stats.count("enumeration failed");
                Vec::new()
            }
        };
        self.check_cancelled()?;

        stats.entered = raw.len() + 1;
        let mut seen = HashSet::new();
        seen.insert(ctx.root.clone());
        let mut working = vec![Tracked::new(Candidate::root(ctx.root.as_str()))];

        for name in raw {
            let Some(host) = normalize_hostname(&name) else {
                stats.count("invalid hostname");
                continue;
            };
            if !is_within(&host, &ctx.root) {
                stats.count("out of scope");
                continue;
            }
            if !seen.insert(host.clone()) {
                stats.count("duplicate");
                continue;
            }
            working.push(Tracked::new(Candidate::enumerated(host, source.name())));
        }

        self.complete_phase(stats, started, &working).await;
        Ok(working)
    }

    async fn dns_validate(&self, resolver: &Resolver, working: Vec<Tracked>) -> Result<Vec<Tracked>, DangleError> {
        let (mut stats, started) = self.begin_phase(PhaseName::DnsValidate, working.len()).await?;

        let hostnames: Vec<String> = working.iter().map(|t| t.hostname().to_string()).collect();
        let mut batch = resolver.resolve_batch(&hostnames).await?;

        let mut survivors = Vec::with_capacity(working.len());
        for mut tracked in working {
            let record = batch.records.remove(tracked.hostname()).unwrap_or_else(|| {
                let mut record = ResolutionRecord::new(tracked.hostname());
                record.detail = Some("no resolution record returned".into());
                record
            });

            if record.is_resolved() {
                tracked.record = Some(record);
                survivors.push(tracked);
                continue;
            }

            if record.batch_failed {
                stats.failed += 1;
                stats.count("batch failed");
            } else {
                stats.count(record.status.to_string());
            }
            let evidence = Evidence::Resolution {
                status: record.status,
                dangling: record.dangling,
                detail: record.detail.clone(),
            };
            if record.dangling {
                // Recorded for reporting only; the candidate stays out of later phases.
                tracked.provider = self.identifier.identify(&record);
                match &tracked.provider {
                    Some(m) => warn!(
                        hostname = %record.hostname,
                        target = ?record.terminal_target(),
                        provider = %m.provider,
                        "Dangling CNAME points at provider"
                    ),
                    None => info!(hostname = %record.hostname, target = ?record.terminal_target(), "Dangling CNAME"),
                }
            }
            tracked.record = Some(record);
            self.conclude(tracked, PhaseName::DnsValidate, Verdict::unresolved(evidence)).await;
        }

        if !batch.failed_chunks.is_empty() {
            warn!(failed_chunks = ?batch.failed_chunks, chunks = batch.chunks, "DNS chunks failed after retries");
        }

        self.complete_phase(stats, started, &survivors).await;
        Ok(survivors)
    }

    async fn wildcard_filter(
        &self,
        detector: &WildcardDetector,
        working: Vec<Tracked>,
    ) -> Result<Vec<Tracked>, DangleError> {
        let (mut stats, started) = self.begin_phase(PhaseName::WildcardFilter, working.len()).await?;

        let zones: BTreeSet<String> = working
            .iter()
            .filter_map(|t| self.wildcard_zone(t.hostname()))
            .map(str::to_string)
            .collect();
        let verdicts = join_all(zones.iter().map(|zone| async move {
            (zone.as_str(), detector.is_wildcard(zone).await)
        }))
        .await;
        let wildcarded: HashSet<&str> = verdicts
            .into_iter()
            .filter_map(|(zone, wildcard)| wildcard.then_some(zone))
            .collect();
        self.check_cancelled()?;

        let mut survivors = Vec::with_capacity(working.len());
        for tracked in working {
            match self.wildcard_zone(tracked.hostname()) {
                Some(zone) if wildcarded.contains(zone) => {
                    stats.count("wildcard zone");
                    let evidence = Evidence::Filter {
                        reason: format!("wildcard zone {}", zone),
                    };
                    self.conclude(tracked, PhaseName::WildcardFilter, Verdict::filtered(evidence)).await;
                }
                _ => survivors.push(tracked),
            }
        }

        debug!(zones = zones.len(), wildcarded = wildcarded.len(), "Wildcard zones checked");
        self.complete_phase(stats, started, &survivors).await;
        Ok(survivors)
    }

    /// Zone to probe for `host`, or `None` when it sits directly under a
    /// public suffix.
    fn wildcard_zone<'a>(&self, host: &'a str) -> Option<&'a str> {
        parent_zone(host).filter(|zone| !is_public_suffix(zone))
    }

    async fn blacklist_filter(&self, working: Vec<Tracked>) -> Result<Vec<Tracked>, DangleError> {
        let (mut stats, started) = self.begin_phase(PhaseName::CnameBlacklistFilter, working.len()).await?;
        let blacklist = &self.snapshot.blacklist;

        let mut survivors = Vec::with_capacity(working.len());
        for tracked in working {
            let hit = tracked
                .record
                .as_ref()
                .and_then(|record| blacklist.is_blacklisted(&record.chain));
            match hit {
                Some(hit) => {
                    debug!(hostname = %tracked.hostname(), hop = hit.hop, pattern = %hit.pattern, "Blacklisted chain");
                    stats.count(hit.category.to_string());
                    self.conclude(tracked, PhaseName::CnameBlacklistFilter, Verdict::filtered(hit.into()))
                        .await;
                }
                None => survivors.push(tracked),
            }
        }

        self.complete_phase(stats, started, &survivors).await;
        Ok(survivors)
    }

    async fn provider_identify(&self, working: Vec<Tracked>) -> Result<Vec<Tracked>, DangleError> {
        let (mut stats, started) = self.begin_phase(PhaseName::ProviderIdentify, working.len()).await?;
        let filter = self.context.provider_filter.as_deref();

        let mut survivors = Vec::with_capacity(working.len());
        for mut tracked in working {
            let matched = tracked.record.as_ref().and_then(|r| self.identifier.identify(r));
            match matched {
                None => {
                    stats.count("no provider match");
                    let evidence = Evidence::Filter {
                        reason: "no provider match".into(),
                    };
                    self.conclude(tracked, PhaseName::ProviderIdentify, Verdict::filtered(evidence)).await;
                }
                Some(m) if filter.is_some_and(|f| !m.provider.eq_ignore_ascii_case(f)) => {
                    stats.count("provider filter");
                    let evidence = Evidence::Filter {
                        reason: format!("provider filter ({} is not {})", m.provider, filter.unwrap_or_default()),
                    };
                    tracked.provider = Some(m);
                    self.conclude(tracked, PhaseName::ProviderIdentify, Verdict::filtered(evidence)).await;
                }
                Some(m) => {
                    tracked.provider = Some(m);
                    survivors.push(tracked);
                }
            }
        }

        self.complete_phase(stats, started, &survivors).await;
        Ok(survivors)
    }

    async fn http_validate(&self, working: Vec<Tracked>) -> Result<Vec<Tracked>, DangleError> {
        let (mut stats, started) = self.begin_phase(PhaseName::HttpValidate, working.len()).await?;
        let prober = &self.sources.http;
        let chunk_size = self.snapshot.settings.chunk_size.max(1);

        let mut survivors = Vec::with_capacity(working.len());
        let mut pending = working.into_iter().peekable();
        let mut idx = 0;
        while pending.peek().is_some() {
            self.check_cancelled()?;
            let chunk: Vec<Tracked> = pending.by_ref().take(chunk_size).collect();
            let hosts: Vec<String> = chunk.iter().map(|t| t.hostname().to_string()).collect();
            let operation = format!("http chunk {}", idx);

            match with_retry(&operation, &self.retry, || prober.probe(&hosts)).await {
                Ok(mut outcomes) => {
                    for mut tracked in chunk {
                        let outcome = outcomes
                            .remove(tracked.hostname())
                            .unwrap_or_else(|| ProbeOutcome::Failed(ProbeFailure::Other("no probe result".into())));
                        if let ProbeOutcome::Failed(failure) = &outcome {
                            stats.count(format!("transport: {}", failure));
                        }
                        tracked.probe = Some(outcome);
                        survivors.push(tracked);
                    }
                }
                Err(e) => {
                    let failure = DangleError::PartialBatch {
                        phase: PhaseName::HttpValidate.to_string(),
                        chunk: idx,
                        reason: e.to_string(),
                    };
                    warn!(chunk = idx, hosts = hosts.len(), error = %failure, "Marking chunk unresolved");
                    for tracked in chunk {
                        stats.failed += 1;
                        stats.count(PROBE_BATCH_FAILED);
                        let evidence = Evidence::Transport {
                            failure: ProbeFailure::Other(PROBE_BATCH_FAILED.into()),
                        };
                        self.conclude(tracked, PhaseName::HttpValidate, Verdict::unresolved(evidence)).await;
                    }
                }
            }
            idx += 1;
        }

        self.complete_phase(stats, started, &survivors).await;
        Ok(survivors)
    }

    async fn classify(&self, working: Vec<Tracked>) -> Result<(), DangleError> {
        let (mut stats, started) = self.begin_phase(PhaseName::Classify, working.len()).await?;
        let classifier = &self.snapshot.classifier;
        let finished: Vec<String> = working.iter().map(|t| t.hostname().to_string()).collect();

        for tracked in working {
            let verdict = match (&tracked.probe, &tracked.provider) {
                (Some(probe), Some(provider)) => classifier.classify(probe, provider),
                // Unreachable through `execute`; every survivor carries both.
                _ => Verdict::unresolved(Evidence::Filter {
                    reason: "missing probe or provider".into(),
                }),
            };
            stats.count(verdict.classification.to_string());
            if verdict.classification.is_finding() {
                info!(
                    hostname = %tracked.hostname(),
                    provider = ?tracked.provider.as_ref().map(|p| p.provider.as_str()),
                    classification = %verdict.classification,
                    confidence = verdict.confidence,
                    "Takeover candidate"
                );
            }
            self.conclude(tracked, PhaseName::Classify, verdict).await;
        }

        stats.close(finished.len(), started.elapsed().as_millis() as u64);
        self.record_phase(stats, finished).await;
        Ok(())
    }

    async fn begin_phase(&self, phase: PhaseName, entering: usize) -> Result<(PhaseStats, Instant), DangleError> {
        self.check_cancelled()?;
        {
            let mut state = self.state.write().await;
            state.current_phase = Some(phase);
            state.working_set = entering;
        }
        info!(phase = %phase, entering, "Phase started");
        self.emit(PipelineEvent::PhaseStarted {
            phase,
            display_name: display_name(phase).to_string(),
            entering,
        });
        Ok((PhaseStats::new(phase, entering), Instant::now()))
    }

    async fn complete_phase(&self, mut stats: PhaseStats, started: Instant, survivors: &[Tracked]) {
        stats.close(survivors.len(), started.elapsed().as_millis() as u64);
        let names = survivors.iter().map(|t| t.hostname().to_string()).collect();
        self.record_phase(stats, names).await;
    }

    async fn record_phase(&self, stats: PhaseStats, survivors: Vec<String>) {
        info!(
            phase = %stats.phase,
            entered = stats.entered,
            survived = stats.survived,
            removed = stats.removed,
            failed = stats.failed,
            duration_ms = stats.duration_ms,
            "Phase complete"
        );
        self.state.write().await.phases.push(stats.clone());
        self.emit(PipelineEvent::PhaseCompleted {
            phase: stats.phase,
            stats,
            survivors,
        });
    }

    /// Record a terminal verdict and stream it out.
    async fn conclude(&self, tracked: Tracked, phase: PhaseName, verdict: Verdict) {
        let (chain, resolution) = match tracked.record {
            Some(record) => (record.chain, Some(record.status)),
            None => (Vec::new(), None),
        };
        let record = VerdictRecord {
            hostname: tracked.candidate.hostname,
            provenance: tracked.candidate.provenance,
            chain,
            resolution,
            provider: tracked.provider,
            http: tracked.probe.as_ref().map(HttpEvidenceSummary::from),
            decided_in: phase,
            verdict,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        };
        debug!(
            hostname = %record.hostname,
            phase = %phase,
            classification = %record.verdict.classification,
            "Verdict"
        );
        self.emit(PipelineEvent::Verdict(record.clone()));
        self.verdicts.write().await.push(record);
    }

    fn check_cancelled(&self) -> Result<(), DangleError> {
        if self.cancel_token.is_cancelled() {
            info!("Scan cancelled");
            Err(DangleError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn state(&self) -> Arc<RwLock<PipelineState>> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_config, ReferenceSnapshot};
    use crate::dns::StaticDnsSource;
    use crate::enumeration::StaticSource;
    use crate::http::StaticProber;
    use crate::models::{Classification, ResolutionStatus};
    use std::path::Path;

    async fn snapshot() -> ReferenceSnapshot {
        let mut config = default_config().await.unwrap();
        config.scan.retry_base_delay_ms = 0;
        ReferenceSnapshot::build(&config, Path::new(".")).await.unwrap()
    }

    fn sources(subs: StaticSource, dns: StaticDnsSource, http: StaticProber) -> ScanSources {
        ScanSources {
            subdomains: Arc::new(subs),
            dns: Arc::new(dns),
            http: Arc::new(http),
        }
    }

    #[tokio::test]
    async fn test_enumeration_scopes_and_dedups() {
        let subs = StaticSource::new(["WWW.example.com.", "www.example.com", "evil.com", "bad host", "example.com"]);
        let dns = StaticDnsSource::new();
        let orch = ScanOrchestrator::new(
            ScanContext::new("example.com").unwrap(),
            snapshot().await,
            sources(subs, dns, StaticProber::new()),
        )
        .unwrap();

        let outcome = orch.run().await.unwrap();
        let enumerate = outcome.summary.phase(PhaseName::Enumerate).unwrap();
        assert_eq!(enumerate.entered, 6);
        assert_eq!(enumerate.survived, 2);
        assert_eq!(enumerate.reasons["duplicate"], 2);
        assert_eq!(enumerate.reasons["out of scope"], 1);
        assert_eq!(enumerate.reasons["invalid hostname"], 1);
        // Both survivors are NXDOMAIN in an empty DNS source.
        assert_eq!(outcome.summary.count(Classification::Unresolved), 2);
        let nxdomain = outcome
            .verdicts
            .iter()
            .filter(|v| v.decided_in == PhaseName::DnsValidate && v.resolution == Some(ResolutionStatus::Nxdomain))
            .count();
        assert_eq!(nxdomain, 2);
    }

    #[tokio::test]
    async fn test_enumeration_failure_degrades_to_root() {
        let subs = StaticSource::new(["www.example.com"]).failing_first(10);
        let orch = ScanOrchestrator::new(
            ScanContext::new("example.com").unwrap(),
            snapshot().await,
            sources(subs, StaticDnsSource::new(), StaticProber::new()),
        )
        .unwrap();

        let outcome = orch.run().await.unwrap();
        let enumerate = outcome.summary.phase(PhaseName::Enumerate).unwrap();
        assert_eq!(enumerate.failed, 1);
        assert_eq!(enumerate.survived, 1);
        assert_eq!(outcome.verdicts.len(), 1);
        assert_eq!(outcome.verdicts[0].hostname, "example.com");
    }

    #[tokio::test]
    async fn test_unknown_provider_filter_rejected() {
        let ctx = ScanContext::new("example.com")
            .unwrap()
            .with_provider_filter(Some("Nonexistent Cloud".into()));
        let result = ScanOrchestrator::new(
            ctx,
            snapshot().await,
            sources(StaticSource::default(), StaticDnsSource::new(), StaticProber::new()),
        );
        assert!(matches!(result, Err(DangleError::Config(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let orch = ScanOrchestrator::new(
            ScanContext::new("shop.example.com").unwrap(),
            snapshot().await,
            sources(StaticSource::default(), StaticDnsSource::new(), StaticProber::new()),
        )
        .unwrap();
        orch.cancel();

        let err = orch.run().await.unwrap_err();
        assert!(matches!(err, DangleError::Cancelled));
        assert_eq!(orch.state().read().await.status, PipelineStatus::Failed);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_provider_match_logged_once() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dns = StaticDnsSource::new()
            .with_cname("shop.example.com", "shops.myshopify.com")
            .with_address("shops.myshopify.com", "23.227.38.65".parse().unwrap());
        let http = StaticProber::new().with_response("shop.example.com", 404, "Sorry, this shop is currently unavailable.");
        let orch = ScanOrchestrator::new(
            ScanContext::new("shop.example.com").unwrap(),
            snapshot().await,
            sources(StaticSource::default(), dns, http),
        )
        .unwrap();
        let outcome = orch.run().await.unwrap();
        assert!(outcome.verdicts[0].provider.is_some());

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("Provider identified").count(), 1, "{}", text);
    }

    #[tokio::test]
    async fn test_events_stream_verdicts_and_phases() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let orch = ScanOrchestrator::new(
            ScanContext::new("shop.example.com").unwrap(),
            snapshot().await,
            sources(StaticSource::default(), StaticDnsSource::new(), StaticProber::new()),
        )
        .unwrap()
        .with_event_channel(tx);
        orch.run().await.unwrap();
        drop(orch);

        let mut completed = Vec::new();
        let mut verdicts = 0;
        while let Some(event) = rx.recv().await {
            match event {
                PipelineEvent::PhaseCompleted { phase, .. } => completed.push(phase),
                PipelineEvent::Verdict(_) => verdicts += 1,
                _ => {}
            }
        }
        assert_eq!(completed.len(), 7);
        assert_eq!(verdicts, 1);
    }
}
