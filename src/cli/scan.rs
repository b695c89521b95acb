use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::commands::ScanArgs;
use super::output::{render_summary, VerdictWriter};
use super::progress::ScanProgress;
use crate::config::{config_base_dir, validate_conflicts, DangleConfig, ReferenceSnapshot};
use crate::dns::HickorySource;
use crate::enumeration::{StaticSource, SubdomainSource, SubfinderSource};
use crate::errors::DangleError;
use crate::http::ReqwestProber;
use crate::pipeline::{PipelineEvent, ScanContext, ScanOrchestrator, ScanSources};
use crate::utils::WorkerPool;

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut DangleConfig, args: &ScanArgs) -> Result<(), DangleError> {
    if let Some(workers) = args.workers {
        config.scan.workers = workers;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.scan.chunk_size = chunk_size;
    }
    validate_conflicts(config)
}

async fn build_sources(config: &DangleConfig, args: &ScanArgs) -> Result<ScanSources, DangleError> {
    let pool = WorkerPool::new(config.scan.workers);

    let subdomains: Arc<dyn SubdomainSource> = match &args.subdomains {
        Some(path) => Arc::new(StaticSource::from_file(Path::new(path)).await?),
        None => Arc::new(SubfinderSource::new(&config.enumeration)),
    };
    let dns = Arc::new(HickorySource::new(
        &config.scan.resolvers,
        config.scan.dns_timeout(),
        pool.clone(),
    ));
    let http = Arc::new(ReqwestProber::new(
        config.scan.http_timeout(),
        config.scan.max_body_kb,
        &config.scan.user_agent,
        pool,
    )?);

    Ok(ScanSources { subdomains, dns, http })
}

pub async fn handle_scan(args: ScanArgs, quiet: bool) -> Result<(), DangleError> {
    let config_path = args.config.as_deref().map(Path::new);
    let mut config = DangleConfig::load(config_path).await?;
    apply_overrides(&mut config, &args)?;

    let snapshot = ReferenceSnapshot::build(&config, &config_base_dir(config_path)).await?;
    let sources = build_sources(&config, &args).await?;

    // Validate every target up front so a typo in the last one fails fast.
    let contexts = args
        .targets
        .iter()
        .map(|t| ScanContext::new(t).map(|c| c.with_provider_filter(args.provider.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling scan");
            ctrl_c_token.cancel();
        }
    });

    let mut writer = VerdictWriter::new(args.format, args.only_findings);
    let mut result = Ok(());

    for context in contexts {
        if cancel.is_cancelled() {
            break;
        }
        let target = context.target.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let orchestrator = match ScanOrchestrator::new(context, snapshot.clone(), sources.clone()) {
            Ok(o) => o.with_cancel_token(cancel.clone()).with_event_channel(tx),
            Err(e) => {
                result = Err(e);
                break;
            }
        };

        let handle = tokio::spawn(async move { orchestrator.run().await });

        let mut progress = (!quiet).then(ScanProgress::new);
        while let Some(event) = rx.recv().await {
            if let Some(p) = progress.as_mut() {
                p.handle_event(&event);
            }
            if let PipelineEvent::Verdict(record) = &event {
                let written = match &progress {
                    Some(p) => p.suspend(|| writer.write(record)),
                    None => writer.write(record),
                };
                if let Err(e) = written {
                    cancel.cancel();
                    result = Err(e);
                }
            }
        }

        let outcome = handle
            .await
            .map_err(|e| DangleError::Internal(format!("Scan task for {} panicked: {}", target, e)))
            .and_then(|r| r);

        match outcome {
            Ok(outcome) => {
                info!(
                    target = %target,
                    verdicts = outcome.summary.total_verdicts,
                    findings = outcome.summary.findings,
                    "Scan finished"
                );
                if !quiet {
                    eprintln!("{}", render_summary(&outcome.summary));
                }
            }
            Err(e) => {
                if result.is_ok() {
                    result = Err(e);
                }
                break;
            }
        }
        if result.is_err() {
            break;
        }
    }

    ctrl_c.abort();
    info!(written = writer.written(), "Verdict stream closed");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::OutputFormat;
    use crate::config::default_config;

    fn args() -> ScanArgs {
        ScanArgs {
            targets: vec!["example.com".into()],
            config: None,
            subdomains: None,
            provider: None,
            workers: Some(8),
            chunk_size: Some(250),
            format: OutputFormat::Jsonl,
            only_findings: false,
        }
    }

    #[tokio::test]
    async fn test_overrides_apply_and_revalidate() {
        let mut config = default_config().await.unwrap();
        apply_overrides(&mut config, &args()).unwrap();
        assert_eq!(config.scan.workers, 8);
        assert_eq!(config.scan.chunk_size, 250);

        let mut bad = args();
        bad.chunk_size = Some(0);
        assert!(matches!(apply_overrides(&mut config, &bad), Err(DangleError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_target_fails_before_scanning() {
        let mut a = args();
        a.targets = vec!["example.com".into(), "not a host".into()];
        a.subdomains = None;
        let err = handle_scan(a, true).await.unwrap_err();
        assert!(matches!(err, DangleError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_missing_subdomain_list_is_config_error() {
        let mut a = args();
        a.subdomains = Some("/nonexistent/dangle/subdomains.txt".into());
        let err = handle_scan(a, true).await.unwrap_err();
        assert!(matches!(err, DangleError::Config(_)));
    }
}
