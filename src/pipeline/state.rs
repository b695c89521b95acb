use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::DangleError;
use crate::models::Classification;
use crate::utils::hostname::{label_count, registrable_domain};
use crate::utils::normalize_hostname;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub status: PipelineStatus,
    pub current_phase: Option<PhaseName>,
    pub start_time: DateTime<Utc>,
    /// Size of the working set entering the current phase.
    pub working_set: usize,
    pub phases: Vec<PhaseStats>,
    pub error: Option<String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            status: PipelineStatus::Queued,
            current_phase: None,
            start_time: Utc::now(),
            working_set: 0,
            phases: Vec::new(),
            error: None,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseName {
    Enumerate,
    DnsValidate,
    WildcardFilter,
    CnameBlacklistFilter,
    ProviderIdentify,
    HttpValidate,
    Classify,
    Done,
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enumerate => write!(f, "enumerate"),
            Self::DnsValidate => write!(f, "dns-validate"),
            Self::WildcardFilter => write!(f, "wildcard-filter"),
            Self::CnameBlacklistFilter => write!(f, "cname-blacklist-filter"),
            Self::ProviderIdentify => write!(f, "provider-identify"),
            Self::HttpValidate => write!(f, "http-validate"),
            Self::Classify => write!(f, "classify"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// What one phase did to the working set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseStats {
    pub phase: PhaseName,
    pub entered: usize,
    pub survived: usize,
    pub removed: usize,
    /// Work lost to failures rather than filtering: candidates in failed
    /// chunks, or a failed enumeration call.
    pub failed: usize,
    /// Removal (or, for CLASSIFY, outcome) counts keyed by reason.
    pub reasons: BTreeMap<String, usize>,
    pub duration_ms: u64,
    #[serde(default)]
    pub skipped: bool,
}

impl PhaseStats {
    pub fn new(phase: PhaseName, entered: usize) -> Self {
        Self {
            phase,
            entered,
            survived: 0,
            removed: 0,
            failed: 0,
            reasons: BTreeMap::new(),
            duration_ms: 0,
            skipped: false,
        }
    }

    pub fn count(&mut self, reason: impl Into<String>) {
        *self.reasons.entry(reason.into()).or_insert(0) += 1;
    }

    /// Fix `survived` and derive `removed` from it.
    pub fn close(&mut self, survived: usize, duration_ms: u64) {
        self.survived = survived;
        self.removed = self.entered.saturating_sub(survived);
        self.duration_ms = duration_ms;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_id: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub phases: Vec<PhaseStats>,
    pub classifications: BTreeMap<Classification, usize>,
    pub total_verdicts: usize,
    pub findings: usize,
}

impl ScanSummary {
    pub fn count(&self, classification: Classification) -> usize {
        self.classifications.get(&classification).copied().unwrap_or(0)
    }

    pub fn phase(&self, phase: PhaseName) -> Option<&PhaseStats> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

/// Per-scan inputs that are not reference data.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub scan_id: String,
    /// Normalized target hostname.
    pub target: String,
    /// Registrable domain of the target.
    pub root: String,
    /// Restrict takeover analysis to one provider.
    pub provider_filter: Option<String>,
}

impl ScanContext {
    pub fn new(target: &str) -> Result<Self, DangleError> {
        let host = normalize_hostname(target)
            .ok_or_else(|| DangleError::InvalidTarget(format!("'{}' is not a valid hostname", target)))?;
        let root = registrable_domain(&host)
            .ok_or_else(|| {
                DangleError::InvalidTarget(format!("'{}' has no registrable domain", host))
            })?
            .to_string();

        Ok(Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            target: host,
            root,
            provider_filter: None,
        })
    }

    pub fn with_provider_filter(mut self, provider: Option<String>) -> Self {
        self.provider_filter = provider.filter(|p| !p.trim().is_empty());
        self
    }

    /// The target already names a subdomain, so there is nothing to enumerate.
    pub fn is_subdomain_target(&self) -> bool {
        label_count(&self.target) > label_count(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_target_detection() {
        let ctx = ScanContext::new("Shop.Example.com.").unwrap();
        assert_eq!(ctx.target, "shop.example.com");
        assert_eq!(ctx.root, "example.com");
        assert!(ctx.is_subdomain_target());

        let ctx = ScanContext::new("example.co.uk").unwrap();
        assert_eq!(ctx.root, "example.co.uk");
        assert!(!ctx.is_subdomain_target());
    }

    #[test]
    fn test_invalid_targets() {
        assert!(matches!(ScanContext::new("not a host"), Err(DangleError::InvalidTarget(_))));
        assert!(matches!(ScanContext::new("co.uk"), Err(DangleError::InvalidTarget(_))));
    }

    #[test]
    fn test_phase_stats_close() {
        let mut stats = PhaseStats::new(PhaseName::DnsValidate, 10);
        stats.count("nxdomain");
        stats.count("nxdomain");
        stats.close(8, 12);
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.reasons["nxdomain"], 2);
    }

    #[test]
    fn test_phase_name_serde() {
        assert_eq!(serde_json::to_string(&PhaseName::CnameBlacklistFilter).unwrap(), "\"CNAME_BLACKLIST_FILTER\"");
        assert_eq!(PhaseName::HttpValidate.to_string(), "http-validate");
    }
}
