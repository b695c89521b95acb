use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::types::{DangleConfig, ScanSettings};
use crate::blacklist::CnameBlacklist;
use crate::errors::DangleError;
use crate::http::HttpEvidenceClassifier;
use crate::providers::{ProviderCatalog, ProviderIdentifier};

/// Reference data compiled once at scan start and shared read-only by every
/// phase.
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    pub settings: ScanSettings,
    pub blacklist: Arc<CnameBlacklist>,
    pub providers: Arc<ProviderCatalog>,
    pub classifier: Arc<HttpEvidenceClassifier>,
}

impl ReferenceSnapshot {
    pub async fn build(config: &DangleConfig, base_dir: &Path) -> Result<Self, DangleError> {
        let blacklist = CnameBlacklist::new(&config.blacklist)?;
        let providers = ProviderCatalog::build(&config.providers, base_dir).await?;
        let classifier = HttpEvidenceClassifier::new(
            &config.verification_patterns,
            &providers,
            config.scan.body_scan_kb,
        )?;

        info!(
            blacklist_patterns = blacklist.len(),
            providers = providers.len(),
            verification_patterns = classifier.verification_pattern_count(),
            "Reference snapshot ready"
        );

        Ok(Self {
            settings: config.scan.clone(),
            blacklist: Arc::new(blacklist),
            providers: Arc::new(providers),
            classifier: Arc::new(classifier),
        })
    }

    pub fn identifier(&self) -> ProviderIdentifier {
        ProviderIdentifier::new(Arc::clone(&self.providers))
    }
}
