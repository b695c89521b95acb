//! Published provider IP ranges.
//!
//! Range files are JSON documents in the shape most providers publish:
//! `{"ipv4_ranges": [...], "ipv6_ranges": [...]}` where each entry is either a
//! bare CIDR string or an object carrying `ip_prefix` / `ipv6_prefix`.

use ipnetwork::IpNetwork;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::DangleError;

#[derive(Debug, Deserialize)]
struct RangeFile {
    #[serde(default)]
    ipv4_ranges: Vec<RangeEntry>,
    #[serde(default)]
    ipv6_ranges: Vec<RangeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RangeEntry {
    Plain(String),
    Prefixed {
        #[serde(alias = "ipv6_prefix")]
        ip_prefix: String,
    },
}

impl RangeEntry {
    fn prefix(&self) -> &str {
        match self {
            RangeEntry::Plain(p) => p,
            RangeEntry::Prefixed { ip_prefix } => ip_prefix,
        }
    }
}

pub fn parse_cidr(provider: &str, raw: &str) -> Result<IpNetwork, DangleError> {
    raw.trim().parse::<IpNetwork>().map_err(|e| {
        DangleError::Config(format!("Invalid CIDR '{}' for provider {}: {}", raw, provider, e))
    })
}

/// Parse the contents of a range file.
pub fn parse_range_document(provider: &str, content: &str) -> Result<Vec<IpNetwork>, DangleError> {
    let file: RangeFile = serde_json::from_str(content).map_err(|e| {
        DangleError::Config(format!("Malformed range file for provider {}: {}", provider, e))
    })?;
    file.ipv4_ranges
        .iter()
        .chain(file.ipv6_ranges.iter())
        .map(|entry| parse_cidr(provider, entry.prefix()))
        .collect()
}

/// Load a range file. A missing file is not an error: the provider falls back
/// to domain-only matching.
pub async fn load_range_file(provider: &str, path: &Path) -> Result<Option<Vec<IpNetwork>>, DangleError> {
    if !path.exists() {
        warn!(
            provider,
            path = %path.display(),
            "Range file not found, falling back to domain-only matching"
        );
        return Ok(None);
    }
    let content = tokio::fs::read_to_string(path).await?;
    let networks = parse_range_document(provider, &content)?;
    debug!(provider, path = %path.display(), ranges = networks.len(), "Loaded provider ranges");
    Ok(Some(networks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_entries() {
        let doc = r#"{
            "ipv4_ranges": [
                {"ip_prefix": "3.5.140.0/22", "service": "S3", "region": "ap-northeast-2"},
                "23.227.38.0/24"
            ],
            "ipv6_ranges": [{"ipv6_prefix": "2600:1f18::/33", "service": "S3"}]
        }"#;
        let nets = parse_range_document("AWS S3", doc).unwrap();
        assert_eq!(nets.len(), 3);
        assert!(nets[1].contains("23.227.38.65".parse().unwrap()));
    }

    #[test]
    fn test_malformed_cidr_is_config_error() {
        let doc = r#"{"ipv4_ranges": ["300.1.2.0/24"]}"#;
        let err = parse_range_document("Broken", doc).unwrap_err();
        assert!(matches!(err, DangleError::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            parse_range_document("Broken", "{not json"),
            Err(DangleError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_range_file("Ghost", &dir.path().join("absent.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_empty_file_yields_no_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();
        let result = load_range_file("Ghost", &path).await.unwrap();
        assert_eq!(result, Some(Vec::new()));
    }
}
