use clap::{Args, Parser, Subcommand, ValueEnum};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("DANGLE_BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "dangle", version, long_version = LONG_VERSION, about = "Dangling DNS and subdomain takeover validation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress bars and the summary
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan one or more domains for takeover candidates
    Scan(ScanArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Root domains or subdomains to scan
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// YAML configuration file (defaults to the built-in reference data)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Read subdomains from a file instead of running the enumeration tool
    #[arg(long)]
    pub subdomains: Option<String>,

    /// Only analyze candidates hosted on this provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Concurrent DNS and HTTP probes
    #[arg(long)]
    pub workers: Option<usize>,

    /// Candidates per DNS and HTTP batch
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Verdict output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Only print DEFINITE_TAKEOVER and HIGH_PROBABILITY verdicts
    #[arg(long)]
    pub only_findings: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per verdict
    Jsonl,
    /// Aligned, colored lines
    Table,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Configuration file to check
    #[arg(short, long)]
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_args() {
        let cli = Cli::parse_from([
            "dangle", "-vv", "scan", "example.com", "shop.example.org", "--provider", "Shopify", "--format", "jsonl",
            "--only-findings",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.targets, vec!["example.com", "shop.example.org"]);
                assert_eq!(args.provider.as_deref(), Some("Shopify"));
                assert_eq!(args.format, OutputFormat::Jsonl);
                assert!(args.only_findings);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_scan_requires_target() {
        assert!(Cli::try_parse_from(["dangle", "scan"]).is_err());
    }
}
