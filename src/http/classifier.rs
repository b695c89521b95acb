//! Priority-ordered HTTP evidence rules.
//!
//! The first rule whose check yields evidence decides the verdict. Matching is
//! case-insensitive and limited to the first `body_scan_kb` KiB of the body.

use std::collections::HashMap;

use crate::errors::DangleError;
use crate::models::{Classification, Evidence, ProbeOutcome, ProviderMatch, Verdict};
use crate::providers::ProviderCatalog;
use crate::utils::truncation::truncate_at_boundary;
use crate::utils::PatternSet;

pub struct ClassificationRule {
    pub name: &'static str,
    pub classification: Classification,
    pub confidence: u8,
    check: fn(&RuleInput<'_>) -> Option<Evidence>,
}

pub static RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "transport-failure",
        classification: Classification::NotVulnerable,
        confidence: 60,
        check: transport_failure,
    },
    ClassificationRule {
        name: "verification-required",
        classification: Classification::FalsePositive,
        confidence: 90,
        check: verification_required,
    },
    ClassificationRule {
        name: "unclaimed-signature",
        classification: Classification::DefiniteTakeover,
        confidence: 95,
        check: unclaimed_signature,
    },
    ClassificationRule {
        name: "suspicious-status",
        classification: Classification::HighProbability,
        confidence: 70,
        check: suspicious_status,
    },
    ClassificationRule {
        name: "no-indicators",
        classification: Classification::NotVulnerable,
        confidence: 80,
        check: no_indicators,
    },
];

/// Per-provider signals compiled from the catalog.
#[derive(Debug, Clone)]
struct ProviderSignals {
    unclaimed: PatternSet,
    suspicious_statuses: Vec<u16>,
}

struct RuleInput<'a> {
    outcome: &'a ProbeOutcome,
    window: &'a str,
    verification: &'a PatternSet,
    provider: Option<&'a ProviderSignals>,
}

fn transport_failure(input: &RuleInput<'_>) -> Option<Evidence> {
    match input.outcome {
        ProbeOutcome::Failed(failure) => Some(Evidence::Transport { failure: failure.clone() }),
        ProbeOutcome::Response(_) => None,
    }
}

fn verification_required(input: &RuleInput<'_>) -> Option<Evidence> {
    let status = input.outcome.status()?;
    input.verification.find(input.window).map(|(_, pattern)| Evidence::HttpPattern {
        pattern: pattern.to_string(),
        status,
    })
}

fn unclaimed_signature(input: &RuleInput<'_>) -> Option<Evidence> {
    let status = input.outcome.status()?;
    input.provider?.unclaimed.find(input.window).map(|(_, pattern)| Evidence::HttpPattern {
        pattern: pattern.to_string(),
        status,
    })
}

fn suspicious_status(input: &RuleInput<'_>) -> Option<Evidence> {
    let status = input.outcome.status()?;
    input
        .provider?
        .suspicious_statuses
        .contains(&status)
        .then_some(Evidence::Status { status })
}

fn no_indicators(_: &RuleInput<'_>) -> Option<Evidence> {
    Some(Evidence::None)
}

/// Turns one probe outcome plus its provider match into a verdict.
///
/// Holds only immutable, compiled pattern data; `classify` is pure.
#[derive(Debug, Clone)]
pub struct HttpEvidenceClassifier {
    verification: PatternSet,
    providers: HashMap<String, ProviderSignals>,
    scan_bytes: usize,
}

impl HttpEvidenceClassifier {
    pub fn new(
        verification_patterns: &[String],
        catalog: &ProviderCatalog,
        body_scan_kb: usize,
    ) -> Result<Self, DangleError> {
        let verification = PatternSet::new(verification_patterns)?;
        let mut providers = HashMap::with_capacity(catalog.len());
        for reference in catalog.iter() {
            providers.insert(
                reference.name.to_ascii_lowercase(),
                ProviderSignals {
                    unclaimed: PatternSet::new(&reference.unclaimed_signatures)?,
                    suspicious_statuses: reference.suspicious_statuses.clone(),
                },
            );
        }
        Ok(Self {
            verification,
            providers,
            scan_bytes: body_scan_kb.max(1) * 1024,
        })
    }

    pub fn verification_pattern_count(&self) -> usize {
        self.verification.len()
    }

    pub fn classify(&self, outcome: &ProbeOutcome, provider: &ProviderMatch) -> Verdict {
        let window = match outcome {
            ProbeOutcome::Response(probe) => truncate_at_boundary(&probe.body, self.scan_bytes),
            ProbeOutcome::Failed(_) => "",
        };
        let input = RuleInput {
            outcome,
            window,
            verification: &self.verification,
            provider: self.providers.get(&provider.provider.to_ascii_lowercase()),
        };

        RULES
            .iter()
            .find_map(|rule| {
                (rule.check)(&input).map(|evidence| Verdict::new(rule.classification, rule.confidence, evidence))
            })
            .unwrap_or_else(|| Verdict::new(Classification::NotVulnerable, 80, Evidence::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpProbe, MatchedBy, ProbeFailure};
    use crate::providers::ProviderReference;

    fn shopify() -> ProviderMatch {
        ProviderMatch {
            provider: "Shopify".into(),
            confidence: 80,
            matched_by: MatchedBy::Cname,
        }
    }

    fn classifier(body_scan_kb: usize) -> HttpEvidenceClassifier {
        let catalog = ProviderCatalog::new(vec![ProviderReference::new(
            "Shopify",
            &["myshopify.com".to_string()],
            vec![],
            vec!["Sorry, this shop is currently unavailable".into()],
            vec![403, 404, 409],
        )]);
        let verification = vec!["Checking DNS records".to_string(), "Log in to Cloudflare".to_string()];
        HttpEvidenceClassifier::new(&verification, &catalog, body_scan_kb).unwrap()
    }

    fn response(status: u16, body: &str) -> ProbeOutcome {
        ProbeOutcome::Response(HttpProbe::new("https://shop.example.com/", status, body))
    }

    #[test]
    fn test_unclaimed_signature_is_definite_takeover() {
        let verdict = classifier(64).classify(
            &response(404, "<h1>Sorry, this shop is currently unavailable.</h1>"),
            &shopify(),
        );
        assert_eq!(verdict.classification, Classification::DefiniteTakeover);
        assert_eq!(verdict.confidence, 95);
        assert_eq!(
            verdict.evidence,
            Evidence::HttpPattern {
                pattern: "Sorry, this shop is currently unavailable".into(),
                status: 404,
            }
        );
    }

    #[test]
    fn test_verification_page_is_false_positive() {
        let verdict = classifier(64).classify(
            &response(200, "Checking DNS records... Log in to Cloudflare to continue"),
            &shopify(),
        );
        assert_eq!(verdict.classification, Classification::FalsePositive);
        assert_eq!(verdict.confidence, 90);
    }

    #[test]
    fn test_verification_beats_unclaimed_signature() {
        let verdict = classifier(64).classify(
            &response(404, "Sorry, this shop is currently unavailable. Checking DNS records"),
            &shopify(),
        );
        assert_eq!(verdict.classification, Classification::FalsePositive);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let verdict = classifier(64).classify(
            &response(404, "SORRY, THIS SHOP IS CURRENTLY UNAVAILABLE"),
            &shopify(),
        );
        assert_eq!(verdict.classification, Classification::DefiniteTakeover);
    }

    #[test]
    fn test_signature_beyond_scan_window_is_ignored() {
        let body = format!("{}Sorry, this shop is currently unavailable", " ".repeat(2048));
        let verdict = classifier(1).classify(&response(200, &body), &shopify());
        assert_eq!(verdict.classification, Classification::NotVulnerable);
        assert_eq!(verdict.evidence, Evidence::None);
    }

    #[test]
    fn test_transport_failure_is_not_vulnerable() {
        let verdict = classifier(64).classify(&ProbeOutcome::Failed(ProbeFailure::Timeout), &shopify());
        assert_eq!(verdict.classification, Classification::NotVulnerable);
        assert_eq!(verdict.confidence, 60);
        assert_eq!(verdict.evidence, Evidence::Transport { failure: ProbeFailure::Timeout });
    }

    #[test]
    fn test_suspicious_status_without_body_match() {
        let verdict = classifier(64).classify(&response(409, "Conflict"), &shopify());
        assert_eq!(verdict.classification, Classification::HighProbability);
        assert_eq!(verdict.evidence, Evidence::Status { status: 409 });
    }

    #[test]
    fn test_unknown_provider_only_reaches_fallback() {
        let other = ProviderMatch {
            provider: "Unlisted".into(),
            confidence: 50,
            matched_by: MatchedBy::Ip,
        };
        let verdict = classifier(64).classify(&response(404, "Sorry, this shop is currently unavailable"), &other);
        assert_eq!(verdict.classification, Classification::NotVulnerable);
        assert_eq!(verdict.confidence, 80);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let c = classifier(64);
        let outcome = response(404, "nothing to see");
        assert_eq!(c.classify(&outcome, &shopify()), c.classify(&outcome, &shopify()));
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["transport-failure", "verification-required", "unclaimed-signature", "suspicious-status", "no-indicators"]
        );
    }
}
