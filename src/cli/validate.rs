use console::style;
use std::path::Path;

use super::commands::ValidateArgs;
use crate::config::{config_base_dir, parse_config, ReferenceSnapshot};
use crate::errors::DangleError;

/// Parse and compile a configuration file without scanning anything.
pub async fn handle_validate(args: ValidateArgs) -> Result<(), DangleError> {
    let path = Path::new(&args.config);
    let config = parse_config(path).await?;
    let snapshot = ReferenceSnapshot::build(&config, &config_base_dir(Some(path))).await?;

    println!("  {} {}", style("✓").green(), style(path.display()).white().bold());
    println!(
        "    {:<24} {}",
        "providers",
        snapshot.providers.len()
    );
    for provider in snapshot.providers.iter() {
        println!(
            "      {:<22} {} signatures, {} networks",
            style(&provider.name).cyan(),
            provider.unclaimed_signatures.len(),
            provider.networks.len()
        );
    }
    println!("    {:<24} {}", "blacklist patterns", snapshot.blacklist.len());
    println!(
        "    {:<24} {}",
        "verification patterns",
        snapshot.classifier.verification_pattern_count()
    );
    println!(
        "    {:<24} {} per chunk, {} workers",
        "batching", snapshot.settings.chunk_size, snapshot.settings.workers
    );
    Ok(())
}
