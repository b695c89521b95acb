use serde::{Deserialize, Serialize};

/// Where a candidate hostname came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "source")]
pub enum Provenance {
    /// The root domain of the scan itself.
    Root,
    /// Emitted by an enumeration source (e.g. "subfinder", "list").
    Enumerated(String),
    /// Supplied directly as an already-qualified subdomain.
    Direct,
}

/// A hostname under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub hostname: String,
    pub provenance: Provenance,
}

impl Candidate {
    pub fn new(hostname: impl Into<String>, provenance: Provenance) -> Self {
        Self { hostname: hostname.into(), provenance }
    }

    pub fn direct(hostname: impl Into<String>) -> Self {
        Self::new(hostname, Provenance::Direct)
    }

    pub fn root(hostname: impl Into<String>) -> Self {
        Self::new(hostname, Provenance::Root)
    }

    pub fn enumerated(hostname: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(hostname, Provenance::Enumerated(source.into()))
    }
}
