use console::style;
use std::io::Write;

use super::commands::OutputFormat;
use crate::errors::DangleError;
use crate::models::{Classification, VerdictRecord};
use crate::pipeline::state::ScanSummary;
use crate::pipeline::PHASES;
use crate::utils::{format_chain, format_duration, format_ratio};

/// Order used when listing classifications.
const CLASSIFICATION_ORDER: [Classification; 6] = [
    Classification::DefiniteTakeover,
    Classification::HighProbability,
    Classification::FalsePositive,
    Classification::NotVulnerable,
    Classification::Filtered,
    Classification::Unresolved,
];

fn paint(classification: Classification, text: &str) -> String {
    match classification {
        Classification::DefiniteTakeover => style(text).red().bold().to_string(),
        Classification::HighProbability => style(text).red().to_string(),
        Classification::FalsePositive => style(text).yellow().to_string(),
        Classification::NotVulnerable => style(text).green().to_string(),
        Classification::Filtered | Classification::Unresolved => style(text).dim().to_string(),
    }
}

/// Writes the verdict stream to stdout in the selected format.
pub struct VerdictWriter {
    format: OutputFormat,
    only_findings: bool,
    written: usize,
}

impl VerdictWriter {
    pub fn new(format: OutputFormat, only_findings: bool) -> Self {
        Self {
            format,
            only_findings,
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Render one record, or `None` when it is filtered out.
    pub fn render(&self, record: &VerdictRecord) -> Result<Option<String>, DangleError> {
        if self.only_findings && !record.is_reportable() {
            return Ok(None);
        }
        let line = match self.format {
            OutputFormat::Jsonl => serde_json::to_string(record)?,
            OutputFormat::Table => render_verdict_line(record),
        };
        Ok(Some(line))
    }

    pub fn write(&mut self, record: &VerdictRecord) -> Result<(), DangleError> {
        if let Some(line) = self.render(record)? {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", line)?;
            self.written += 1;
        }
        Ok(())
    }
}

pub fn render_verdict_line(record: &VerdictRecord) -> String {
    let classification = record.verdict.classification;
    let provider = record
        .provider
        .as_ref()
        .map(|p| p.provider.as_str())
        .unwrap_or("-");
    let mut line = format!(
        "{} {:>3}  {:<40} {} {}",
        paint(classification, &format!("{:<18}", classification.to_string())),
        record.verdict.confidence,
        record.hostname,
        style(format!("{:<14}", provider)).cyan(),
        record.verdict.summary,
    );
    if record.chain.len() > 1 {
        line.push_str(&format!("\n{:>24}{}", "", style(format_chain(&record.chain)).dim()));
    }
    line
}

/// Boxed per-scan summary with the phase funnel and classification counts.
pub fn render_summary(summary: &ScanSummary) -> String {
    let mut out = String::new();

    let w = 64;
    out.push_str(&format!("\n  {}\n", style("╭".to_string() + &"─".repeat(w - 2) + "╮").cyan()));
    for line in [
        style("TAKEOVER SCAN SUMMARY").white().bold().to_string(),
        format!("Target:   {}", style(&summary.target).white().bold()),
        format!("Scan:     {}", style(&summary.scan_id).cyan()),
        format!("Duration: {}", format_duration(summary.total_duration_ms)),
    ] {
        out.push_str(&format!(
            "  {} {:<width$} {}\n",
            style("│").cyan(),
            line,
            style("│").cyan(),
            width = w - 4,
        ));
    }
    out.push_str(&format!("  {}\n", style("╰".to_string() + &"─".repeat(w - 2) + "╯").cyan()));

    out.push_str(&format!("\n  {}\n", style("Phase Funnel").white().bold()));
    out.push_str(&format!("  {}\n", style("─".repeat(58)).dim()));
    for stats in &summary.phases {
        let name = PHASES
            .iter()
            .find(|p| p.name == stats.phase)
            .map(|p| p.display_name)
            .unwrap_or("?");
        let mut line = format!(
            "   {:<18} {:>6} → {:>6}  {:>7}",
            name,
            stats.entered,
            stats.survived,
            format_ratio(stats.survived, stats.entered),
        );
        if stats.skipped {
            line.push_str(&format!("  {}", style("skipped").dim()));
        }
        if stats.failed > 0 {
            line.push_str(&format!("  {}", style(format!("{} failed", stats.failed)).yellow()));
        }
        out.push_str(&line);
        out.push('\n');
        for (reason, count) in &stats.reasons {
            out.push_str(&format!("      {:<32} {:>6}\n", style(reason).dim(), count));
        }
    }

    out.push_str(&format!("\n  {}\n", style("Verdicts").white().bold()));
    out.push_str(&format!("  {}\n", style("─".repeat(58)).dim()));
    let max_count = CLASSIFICATION_ORDER
        .iter()
        .map(|c| summary.count(*c))
        .max()
        .unwrap_or(0)
        .max(1);
    for classification in CLASSIFICATION_ORDER {
        let count = summary.count(classification);
        let bar_len = (count as f64 / max_count as f64 * 20.0).ceil() as usize;
        out.push_str(&format!(
            "   {} {:>6}  {}\n",
            paint(classification, &format!("{:<18}", classification.to_string())),
            count,
            paint(classification, &"█".repeat(bar_len)),
        ));
    }
    out.push_str(&format!("  {}\n", style("─".repeat(58)).dim()));
    out.push_str(&format!(
        "   {:<18} {:>6}\n",
        style("Total").white().bold(),
        summary.total_verdicts,
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Evidence, MatchedBy, Provenance, ProviderMatch, ResolutionStatus, Verdict};
    use crate::pipeline::state::PhaseName;

    fn record(classification: Classification) -> VerdictRecord {
        VerdictRecord {
            hostname: "shop.example.com".into(),
            provenance: Provenance::Enumerated("subfinder".into()),
            chain: vec!["shop.example.com".into(), "example.myshopify.com".into()],
            resolution: None,
            provider: None,
            http: None,
            decided_in: PhaseName::Classify,
            verdict: Verdict::new(classification, 95, Evidence::None),
            elapsed_ms: 10,
        }
    }

    #[test]
    fn test_only_findings_filters_records() {
        let writer = VerdictWriter::new(OutputFormat::Jsonl, true);
        assert!(writer.render(&record(Classification::NotVulnerable)).unwrap().is_none());
        let line = writer.render(&record(Classification::DefiniteTakeover)).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["classification"], "DEFINITE_TAKEOVER");
        assert_eq!(value["hostname"], "shop.example.com");
    }

    #[test]
    fn test_only_findings_keeps_dangling_provider_alias() {
        let writer = VerdictWriter::new(OutputFormat::Jsonl, true);
        let evidence = Evidence::Resolution {
            status: ResolutionStatus::Nxdomain,
            dangling: true,
            detail: Some("old-app.herokuapp.com".into()),
        };
        let mut dangling = record(Classification::Unresolved);
        dangling.chain = vec!["old.example.com".into(), "old-app.herokuapp.com".into()];
        dangling.decided_in = PhaseName::DnsValidate;
        dangling.verdict = Verdict::unresolved(evidence);
        assert!(writer.render(&dangling).unwrap().is_none());

        dangling.provider = Some(ProviderMatch {
            provider: "Heroku".into(),
            confidence: 80,
            matched_by: MatchedBy::Cname,
        });
        let line = writer.render(&dangling).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["classification"], "UNRESOLVED");
        assert_eq!(value["provider"]["provider"], "Heroku");
    }

    #[test]
    fn test_table_line_shows_chain() {
        console::set_colors_enabled(false);
        let line = render_verdict_line(&record(Classification::HighProbability));
        assert!(line.contains("HIGH_PROBABILITY"));
        assert!(line.contains("shop.example.com -> example.myshopify.com"));
    }
}
