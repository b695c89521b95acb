use serde::{Deserialize, Serialize};

use super::probe::ProbeFailure;
use super::resolution::ResolutionStatus;
use crate::blacklist::BlacklistCategory;

/// Terminal classification of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Provider serves its "unclaimed resource" page for this host.
    DefiniteTakeover,
    /// Suspicious status code on a provider-hosted host, not confirmed by body text.
    HighProbability,
    /// Hosted on the provider but gated behind DNS-console verification.
    FalsePositive,
    /// Nothing exploitable observed.
    NotVulnerable,
    /// Removed by a wildcard, blacklist or provider filter.
    Filtered,
    /// DNS or probing never produced usable data.
    Unresolved,
}

impl Classification {
    /// Verdicts worth surfacing to an operator.
    pub fn is_finding(&self) -> bool {
        matches!(self, Classification::DefiniteTakeover | Classification::HighProbability)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DefiniteTakeover => write!(f, "DEFINITE_TAKEOVER"),
            Self::HighProbability => write!(f, "HIGH_PROBABILITY"),
            Self::FalsePositive => write!(f, "FALSE_POSITIVE"),
            Self::NotVulnerable => write!(f, "NOT_VULNERABLE"),
            Self::Filtered => write!(f, "FILTERED"),
            Self::Unresolved => write!(f, "UNRESOLVED"),
        }
    }
}

/// The single piece of evidence a verdict rests on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum Evidence {
    /// A chain hop matched a blacklist pattern (hop 0 is the hostname itself).
    Blacklist {
        hop: usize,
        host: String,
        pattern: String,
        category: BlacklistCategory,
    },
    /// Response body matched a verification or unclaimed-resource pattern.
    HttpPattern { pattern: String, status: u16 },
    /// Response status alone was suspicious for the provider.
    Status { status: u16 },
    /// No response could be obtained.
    Transport { failure: ProbeFailure },
    /// Chain walk did not end in address records.
    Resolution {
        status: ResolutionStatus,
        dangling: bool,
        detail: Option<String>,
    },
    /// Removed by a filter that has no pattern (wildcard zone, provider scope).
    Filter { reason: String },
    /// No rule-specific signal.
    None,
}

impl std::fmt::Display for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blacklist { hop, host, pattern, category } => write!(
                f,
                "blacklisted {} pattern '{}' at hop {} ({})",
                category, pattern, hop, host
            ),
            Self::HttpPattern { pattern, status } => {
                write!(f, "HTTP {} body matched '{}'", status, pattern)
            }
            Self::Status { status } => write!(f, "suspicious HTTP status {}", status),
            Self::Transport { failure } => write!(f, "no reachable evidence: {}", failure),
            Self::Resolution { status, dangling, detail } => {
                write!(f, "resolution {}", status)?;
                if *dangling {
                    write!(f, " (dangling CNAME)")?;
                }
                if let Some(detail) = detail {
                    write!(f, ": {}", detail)?;
                }
                Ok(())
            }
            Self::Filter { reason } => write!(f, "{}", reason),
            Self::None => write!(f, "no takeover indicators"),
        }
    }
}

/// Final judgement on a candidate. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub classification: Classification,
    /// 0-100.
    pub confidence: u8,
    pub evidence: Evidence,
    /// Human-readable rendering of `evidence`.
    pub summary: String,
}

impl Verdict {
    pub fn new(classification: Classification, confidence: u8, evidence: Evidence) -> Self {
        let summary = evidence.to_string();
        Self {
            classification,
            confidence: confidence.min(100),
            evidence,
            summary,
        }
    }

    pub fn filtered(evidence: Evidence) -> Self {
        Self::new(Classification::Filtered, 100, evidence)
    }

    pub fn unresolved(evidence: Evidence) -> Self {
        Self::new(Classification::Unresolved, 0, evidence)
    }
}
