use serde::{Deserialize, Serialize};

/// Which signal attributed a candidate to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchedBy {
    Cname,
    Ip,
    Both,
}

/// A candidate attributed to a hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMatch {
    pub provider: String,
    /// 0-100.
    pub confidence: u8,
    pub matched_by: MatchedBy,
}
