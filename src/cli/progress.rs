use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::models::Classification;
use crate::pipeline::{PipelineEvent, PHASES};
use crate::utils::format_duration;

/// Manages indicatif multi-progress bars while a scan runs.
pub struct ScanProgress {
    multi: MultiProgress,
    phase_bar: Option<ProgressBar>,
    status_bar: ProgressBar,
    working_set: usize,
    verdicts: usize,
    findings: usize,
    start_time: std::time::Instant,
}

impl ScanProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status_bar.set_message("Preparing scan...");
        status_bar.enable_steady_tick(std::time::Duration::from_millis(120));

        Self {
            multi,
            phase_bar: None,
            status_bar,
            working_set: 0,
            verdicts: 0,
            findings: 0,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn handle_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::ScanStarted { target, .. } => {
                self.start_time = std::time::Instant::now();
                self.verdicts = 0;
                self.findings = 0;
                let bar = self
                    .multi
                    .insert_before(&self.status_bar, ProgressBar::new(PHASES.len() as u64));
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("  {bar:30.cyan/dark_gray} {pos}/{len} phases | {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░"),
                );
                bar.set_message(format!("Scanning {}", target));
                self.phase_bar = Some(bar);
                self.update_status();
            }
            PipelineEvent::PhaseStarted { display_name, entering, .. } => {
                self.working_set = *entering;
                if let Some(bar) = &self.phase_bar {
                    bar.set_message(format!("{} ({} candidates)", display_name, entering));
                }
                self.update_status();
            }
            PipelineEvent::PhaseCompleted { stats, .. } => {
                self.working_set = stats.survived;
                if let Some(bar) = &self.phase_bar {
                    bar.inc(1);
                }
                self.update_status();
            }
            PipelineEvent::Verdict(record) => {
                self.verdicts += 1;
                if record.verdict.classification.is_finding() {
                    self.findings += 1;
                }
                self.update_status();
            }
            PipelineEvent::ScanCompleted { summary } => {
                if let Some(bar) = self.phase_bar.take() {
                    bar.finish_and_clear();
                }
                let takeovers = summary.count(Classification::DefiniteTakeover);
                self.status_bar.finish_with_message(format!(
                    "{} complete: {} verdicts, {} findings ({} definite) | {}",
                    summary.target,
                    summary.total_verdicts,
                    summary.findings,
                    takeovers,
                    format_duration(summary.total_duration_ms),
                ));
            }
            PipelineEvent::ScanFailed { error } => {
                if let Some(bar) = self.phase_bar.take() {
                    bar.abandon_with_message("Failed");
                }
                self.status_bar
                    .finish_with_message(format!("{} {}", style("Scan failed:").red(), error));
            }
        }
    }

    fn update_status(&self) {
        let elapsed = format_duration(self.start_time.elapsed().as_millis() as u64);
        self.status_bar.set_message(format!(
            "{} | {} in flight | {} verdicts | {} findings",
            elapsed, self.working_set, self.verdicts, self.findings,
        ));
    }

    /// Run `f` with the bars hidden so plain stdout writes stay readable.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.multi.suspend(f)
    }

    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}
