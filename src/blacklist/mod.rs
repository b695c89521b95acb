//! CNAME chain blacklist.
//!
//! Every hop of a resolution chain is checked against a categorized set of
//! case-insensitive substrings. A match anywhere in the chain filters the
//! candidate, even when a later hop lands on an exploitable provider: an
//! ownership-verification hop means the zone owner already controls
//! provisioning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::DangleError;
use crate::models::Evidence;
use crate::utils::PatternSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistCategory {
    /// Records a platform uses to prove domain ownership.
    OwnershipVerification,
    /// Actively maintained platforms with negligible takeover risk.
    MaintainedPlatform,
    /// Private namespaces never reachable from the internet.
    InternalNamespace,
    /// DKIM, DMARC and mail-provider records.
    EmailAuthentication,
}

impl std::fmt::Display for BlacklistCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnershipVerification => write!(f, "ownership-verification"),
            Self::MaintainedPlatform => write!(f, "maintained-platform"),
            Self::InternalNamespace => write!(f, "internal-namespace"),
            Self::EmailAuthentication => write!(f, "email-authentication"),
        }
    }
}

/// Where and why a chain was blacklisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistMatch {
    /// 0 is the hostname itself, 1 its first CNAME target, and so on.
    pub hop: usize,
    pub host: String,
    pub pattern: String,
    pub category: BlacklistCategory,
}

impl From<BlacklistMatch> for Evidence {
    fn from(m: BlacklistMatch) -> Self {
        Evidence::Blacklist {
            hop: m.hop,
            host: m.host,
            pattern: m.pattern,
            category: m.category,
        }
    }
}

/// Immutable pattern repository, compiled once per scan.
#[derive(Debug, Clone)]
pub struct CnameBlacklist {
    patterns: PatternSet,
    categories: Vec<BlacklistCategory>,
}

impl CnameBlacklist {
    pub fn new(groups: &BTreeMap<BlacklistCategory, Vec<String>>) -> Result<Self, DangleError> {
        let mut flat = Vec::new();
        let mut categories = Vec::new();
        for (category, patterns) in groups {
            for pattern in patterns {
                let pattern = pattern.trim();
                if pattern.is_empty() {
                    continue;
                }
                flat.push(pattern.to_string());
                categories.push(*category);
            }
        }
        let patterns = PatternSet::new(&flat)?;
        Ok(Self { patterns, categories })
    }

    /// Check every hop of `chain`; the first matching hop wins.
    pub fn is_blacklisted(&self, chain: &[String]) -> Option<BlacklistMatch> {
        chain.iter().enumerate().find_map(|(hop, host)| {
            // The root dot lets patterns ending in "." anchor on a label boundary.
            let rooted = format!("{}.", host.trim_end_matches('.'));
            self.patterns.find(&rooted).map(|(idx, pattern)| BlacklistMatch {
                hop,
                host: host.clone(),
                pattern: pattern.to_string(),
                category: self.categories[idx],
            })
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
