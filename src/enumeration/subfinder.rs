use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::source::SubdomainSource;
use crate::config::EnumerationSettings;
use crate::errors::DangleError;
use crate::utils::truncation::truncate_error;

/// Passive enumeration through the `subfinder` binary.
pub struct SubfinderSource {
    binary: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubfinderSource {
    pub fn new(settings: &EnumerationSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            args: settings.args.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Accepts plain hostnames or `-oJ` JSON lines carrying a `host` field.
fn parse_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            if line.starts_with('{') {
                serde_json::from_str::<serde_json::Value>(line)
                    .ok()
                    .and_then(|v| v.get("host").and_then(|h| h.as_str()).map(str::to_string))
            } else {
                Some(line.to_string())
            }
        })
        .filter(|name| name.contains('.'))
        .collect()
}

#[async_trait]
impl SubdomainSource for SubfinderSource {
    fn name(&self) -> &str {
        "subfinder"
    }

    async fn enumerate(&self, root: &str) -> Result<Vec<String>, DangleError> {
        debug!(binary = %self.binary, root, "Running subdomain enumeration");

        let child = Command::new(&self.binary)
            .arg("-d")
            .arg(root)
            .arg("-silent")
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                return Err(DangleError::Timeout(format!(
                    "{} timed out after {}s",
                    self.binary,
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DangleError::ToolUnavailable(format!(
                    "{} not found on PATH; install it or pass --subdomains",
                    self.binary
                )))
            }
            Ok(Err(e)) => return Err(DangleError::Io(e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DangleError::Tool(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                truncate_error(stderr.trim())
            )));
        }

        let names = parse_output(&String::from_utf8_lossy(&output.stdout));
        info!(root, found = names.len(), "Enumeration finished");
        Ok(names)
    }
}
