pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod phase;
pub mod state;

pub use events::PipelineEvent;
pub use orchestrator::{ScanOrchestrator, ScanOutcome, ScanSources};
pub use phase::PHASES;
pub use state::{PhaseName, PhaseStats, PipelineState, PipelineStatus, ScanContext, ScanSummary};
