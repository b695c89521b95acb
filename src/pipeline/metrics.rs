use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::state::{PhaseStats, ScanSummary};
use crate::models::{Classification, VerdictRecord};

pub fn compute_summary(
    scan_id: &str,
    target: &str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    phases: Vec<PhaseStats>,
    verdicts: &[VerdictRecord],
) -> ScanSummary {
    let mut classifications: BTreeMap<Classification, usize> = BTreeMap::new();
    for record in verdicts {
        *classifications.entry(record.verdict.classification).or_insert(0) += 1;
    }

    let findings = verdicts
        .iter()
        .filter(|r| r.verdict.classification.is_finding())
        .count();

    let total_duration_ms = finished_at
        .signed_duration_since(started_at)
        .num_milliseconds()
        .max(0) as u64;

    ScanSummary {
        scan_id: scan_id.to_string(),
        target: target.to_string(),
        started_at,
        finished_at,
        total_duration_ms,
        phases,
        classifications,
        total_verdicts: verdicts.len(),
        findings,
    }
}
