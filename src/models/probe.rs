use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A completed HTTP exchange with a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProbe {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    /// Possibly truncated response body.
    pub body: String,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
            truncated: false,
            headers: BTreeMap::new(),
        }
    }
}

/// Transport-level failure to obtain a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ProbeFailure {
    ConnectionRefused,
    Timeout,
    Tls,
    Other(String),
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::Timeout => write!(f, "HTTP timeout"),
            Self::Tls => write!(f, "TLS error"),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// What the prober observed for one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Response(HttpProbe),
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(probe) => Some(probe.status),
            Self::Failed(_) => None,
        }
    }
}
