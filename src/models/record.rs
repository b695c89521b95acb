use serde::{Deserialize, Serialize};

use super::candidate::Provenance;
use super::probe::{ProbeFailure, ProbeOutcome};
use super::provider::ProviderMatch;
use super::resolution::ResolutionStatus;
use super::verdict::{Evidence, Verdict};
use crate::pipeline::state::PhaseName;
use crate::utils::truncation::body_excerpt;

/// Compact view of the HTTP exchange attached to a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpEvidenceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl From<&ProbeOutcome> for HttpEvidenceSummary {
    fn from(outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Response(probe) => Self {
                url: Some(probe.url.clone()),
                status: Some(probe.status),
                failure: None,
                excerpt: Some(body_excerpt(&probe.body)),
            },
            ProbeOutcome::Failed(failure) => Self {
                url: None,
                status: None,
                failure: Some(failure.clone()),
                excerpt: None,
            },
        }
    }
}

/// One entry of the verdict stream handed to reporting consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub hostname: String,
    pub provenance: Provenance,
    /// Root hostname first, terminal target last. Empty if never resolved.
    pub chain: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpEvidenceSummary>,
    /// Phase that produced the verdict.
    pub decided_in: PhaseName,
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Milliseconds from scan start until this verdict.
    pub elapsed_ms: u64,
}

impl VerdictRecord {
    /// A finding, or an alias left dangling at a known provider.
    pub fn is_reportable(&self) -> bool {
        if self.verdict.classification.is_finding() {
            return true;
        }
        let dangling = matches!(self.verdict.evidence, Evidence::Resolution { dangling: true, .. });
        dangling && self.provider.is_some()
    }
}
