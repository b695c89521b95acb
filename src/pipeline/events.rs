use super::state::{PhaseName, PhaseStats, ScanSummary};
use crate::models::VerdictRecord;

/// Messages sent from the pipeline to progress displays and writers.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Scan execution started
    ScanStarted {
        scan_id: String,
        target: String,
    },
    /// A phase has begun with `entering` candidates
    PhaseStarted {
        phase: PhaseName,
        display_name: String,
        entering: usize,
    },
    /// A phase finished; `survivors` is the working set handed to the next one
    PhaseCompleted {
        phase: PhaseName,
        stats: PhaseStats,
        survivors: Vec<String>,
    },
    /// A candidate reached its terminal verdict
    Verdict(VerdictRecord),
    /// Scan completed
    ScanCompleted {
        summary: ScanSummary,
    },
    /// Scan aborted
    ScanFailed {
        error: String,
    },
}
