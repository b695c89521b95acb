use std::sync::Arc;
use tracing::debug;

use super::catalog::ProviderCatalog;
use crate::models::{MatchedBy, ProviderMatch, ResolutionRecord};

/// Terminal CNAME target matched a provider suffix.
pub const CNAME_CONFIDENCE: u8 = 80;
/// Resolved address fell inside a provider range, no suffix agreement.
pub const IP_CONFIDENCE: u8 = 50;
/// Both signals name the same provider.
pub const FUSED_CONFIDENCE: u8 = 100;

/// Attributes resolved candidates to hosting providers.
#[derive(Debug, Clone)]
pub struct ProviderIdentifier {
    catalog: Arc<ProviderCatalog>,
}

impl ProviderIdentifier {
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self { catalog }
    }

    pub fn identify(&self, record: &ResolutionRecord) -> Option<ProviderMatch> {
        let by_cname = record
            .terminal_target()
            .and_then(|target| self.catalog.match_cname(target));

        let result = match by_cname {
            Some(provider) => {
                let agrees = record.addresses.iter().any(|a| provider.contains_address(a));
                if agrees {
                    ProviderMatch {
                        provider: provider.name.clone(),
                        confidence: FUSED_CONFIDENCE,
                        matched_by: MatchedBy::Both,
                    }
                } else {
                    ProviderMatch {
                        provider: provider.name.clone(),
                        confidence: CNAME_CONFIDENCE,
                        matched_by: MatchedBy::Cname,
                    }
                }
            }
            None => {
                let provider = self.catalog.match_addresses(&record.addresses)?;
                ProviderMatch {
                    provider: provider.name.clone(),
                    confidence: IP_CONFIDENCE,
                    matched_by: MatchedBy::Ip,
                }
            }
        };

        debug!(
            hostname = %record.hostname,
            provider = %result.provider,
            confidence = result.confidence,
            matched_by = ?result.matched_by,
            "Provider identified"
        );
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolutionStatus;
    use crate::providers::ProviderReference;

    fn identifier() -> ProviderIdentifier {
        let shopify = ProviderReference::new(
            "Shopify",
            &["myshopify.com".to_string()],
            vec!["23.227.38.0/24".parse().unwrap()],
            Vec::new(),
            vec![404],
        );
        let heroku = ProviderReference::new(
            "Heroku",
            &["herokuapp.com".to_string()],
            Vec::new(),
            Vec::new(),
            vec![404],
        );
        ProviderIdentifier::new(Arc::new(ProviderCatalog::new(vec![shopify, heroku])))
    }

    fn record(chain: &[&str], addresses: &[&str]) -> ResolutionRecord {
        let mut r = ResolutionRecord::new(chain[0]);
        r.chain = chain.iter().map(|h| h.to_string()).collect();
        r.addresses = addresses.iter().map(|a| a.parse().unwrap()).collect();
        r.status = ResolutionStatus::Resolved;
        r
    }

    #[test]
    fn test_cname_and_ip_fuse_to_max_confidence() {
        let r = record(
            &["shop.example.com", "example.myshopify.com", "shops.myshopify.com"],
            &["23.227.38.65"],
        );
        let m = identifier().identify(&r).unwrap();
        assert_eq!(m.provider, "Shopify");
        assert_eq!(m.confidence, FUSED_CONFIDENCE);
        assert_eq!(m.matched_by, MatchedBy::Both);
    }

    #[test]
    fn test_cname_only_is_domain_confirmed() {
        let r = record(&["api.example.com", "old-app.herokuapp.com"], &["54.1.2.3"]);
        let m = identifier().identify(&r).unwrap();
        assert_eq!(m.provider, "Heroku");
        assert_eq!(m.confidence, CNAME_CONFIDENCE);
        assert_eq!(m.matched_by, MatchedBy::Cname);
    }

    #[test]
    fn test_ip_only_is_lower_confidence() {
        let r = record(&["store.example.com"], &["23.227.38.10"]);
        let m = identifier().identify(&r).unwrap();
        assert_eq!(m.provider, "Shopify");
        assert_eq!(m.confidence, IP_CONFIDENCE);
        assert_eq!(m.matched_by, MatchedBy::Ip);
        assert!(IP_CONFIDENCE < CNAME_CONFIDENCE);
    }

    #[test]
    fn test_no_signal_no_match() {
        let r = record(&["www.example.com", "lb.example.net"], &["93.184.216.34"]);
        assert!(identifier().identify(&r).is_none());
    }

    #[test]
    fn test_only_terminal_target_counts_for_suffix() {
        let r = record(
            &["a.example.com", "x.herokuapp.com", "edge.example.net"],
            &["93.184.216.34"],
        );
        assert!(identifier().identify(&r).is_none());
    }
}
