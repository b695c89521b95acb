use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::schema::CONFIG_SCHEMA;
use super::types::{DangleConfig, ProviderProfile};
use crate::errors::DangleError;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.yaml");
const MAX_CONFIG_BYTES: u64 = 1_048_576;

impl DangleConfig {
    /// Load `path` over the embedded defaults, or the defaults alone.
    pub async fn load(path: Option<&Path>) -> Result<Self, DangleError> {
        match path {
            Some(path) => parse_config(path).await,
            None => default_config().await,
        }
    }
}

/// Directory that relative `cidr_files` and `provider_files` resolve against.
pub fn config_base_dir(path: Option<&Path>) -> PathBuf {
    path.and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The compiled-in reference data.
pub async fn default_config() -> Result<DangleConfig, DangleError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
    finish(yaml, &config_base_dir(None)).await
}

pub async fn parse_config(path: &Path) -> Result<DangleConfig, DangleError> {
    if !path.exists() {
        return Err(DangleError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(DangleError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let user: serde_yaml::Value = serde_yaml::from_str(&content)?;
    if !matches!(user, serde_yaml::Value::Mapping(_) | serde_yaml::Value::Null) {
        return Err(DangleError::Config(format!(
            "Config file {} must be a YAML mapping",
            path.display()
        )));
    }

    // JSON Schema validation
    validate_schema(&user)?;

    let defaults: serde_yaml::Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
    let merged = overlay_sections(defaults, user);

    finish(merged, &config_base_dir(Some(path))).await
}

async fn finish(yaml: serde_yaml::Value, base_dir: &Path) -> Result<DangleConfig, DangleError> {
    // Parse into typed config
    let mut config: DangleConfig = serde_yaml::from_value(yaml)?;

    let extra = load_provider_files(&config.provider_files, base_dir).await?;
    config.providers.extend(extra);

    // Semantic conflict detection
    validate_conflicts(&config)?;

    Ok(config)
}

/// Each top-level section named by `user` replaces the default one whole.
fn overlay_sections(defaults: serde_yaml::Value, user: serde_yaml::Value) -> serde_yaml::Value {
    match (defaults, user) {
        (serde_yaml::Value::Mapping(mut base), serde_yaml::Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                base.insert(key, value);
            }
            serde_yaml::Value::Mapping(base)
        }
        (defaults, serde_yaml::Value::Null) => defaults,
        (_, user) => user,
    }
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), DangleError> {
    // Convert YAML value to JSON for schema validation
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| DangleError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| DangleError::Config(format!("Schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(&json_value) {
        // Advisory: the typed parse and conflict checks are authoritative.
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

async fn load_provider_files(patterns: &[String], base_dir: &Path) -> Result<Vec<ProviderProfile>, DangleError> {
    let mut profiles = Vec::new();

    for raw in patterns {
        let pattern = if Path::new(raw).is_absolute() {
            PathBuf::from(raw)
        } else {
            base_dir.join(raw)
        };
        let pattern_str = pattern.to_string_lossy();

        let mut matched = 0;
        for entry in glob::glob(&pattern_str)
            .map_err(|e| DangleError::Config(format!("Invalid provider_files pattern '{}': {}", raw, e)))?
        {
            let path = entry.map_err(|e| DangleError::Config(format!("Glob error: {}", e)))?;
            let content = tokio::fs::read_to_string(&path).await?;
            let loaded: Vec<ProviderProfile> = serde_yaml::from_str(&content).map_err(|e| {
                DangleError::Config(format!("Malformed provider file {}: {}", path.display(), e))
            })?;
            info!(file = %path.display(), providers = loaded.len(), "Loaded provider file");
            matched += 1;
            profiles.extend(loaded);
        }

        if matched == 0 {
            warn!(pattern = %raw, "provider_files pattern matched nothing");
        }
    }

    Ok(profiles)
}

/// Detect semantic conflicts in the parsed configuration.
pub fn validate_conflicts(config: &DangleConfig) -> Result<(), DangleError> {
    let scan = &config.scan;
    if scan.chunk_size == 0 {
        return Err(DangleError::Config("scan.chunk_size must be at least 1".into()));
    }
    if scan.workers == 0 {
        return Err(DangleError::Config("scan.workers must be at least 1".into()));
    }
    if scan.max_chain_hops == 0 {
        return Err(DangleError::Config("scan.max_chain_hops must be at least 1".into()));
    }
    if !(1..=100).contains(&scan.wildcard_threshold_pct) {
        return Err(DangleError::Config(format!(
            "scan.wildcard_threshold_pct must be within 1..=100, got {}",
            scan.wildcard_threshold_pct
        )));
    }
    if scan.resolvers.is_empty() {
        return Err(DangleError::Config("scan.resolvers must name at least one resolver".into()));
    }

    if config.providers.is_empty() {
        return Err(DangleError::Config("No provider profiles configured".into()));
    }

    let mut seen = HashSet::new();
    for provider in &config.providers {
        if !seen.insert(provider.name.to_ascii_lowercase()) {
            return Err(DangleError::Config(format!("Duplicate provider '{}'", provider.name)));
        }
        if provider.cname_suffixes.iter().all(|s| s.trim().is_empty()) {
            return Err(DangleError::Config(format!(
                "Provider '{}' has no cname_suffixes",
                provider.name
            )));
        }
    }

    // A pattern inside a provider suffix would filter every chain landing there.
    for (category, patterns) in &config.blacklist {
        for pattern in patterns {
            let needle = pattern.trim().to_ascii_lowercase();
            if needle.is_empty() {
                continue;
            }
            for provider in &config.providers {
                for suffix in &provider.cname_suffixes {
                    let rooted = format!("{}.", suffix.trim().trim_end_matches('.').to_ascii_lowercase());
                    if rooted.contains(&needle) {
                        return Err(DangleError::Config(format!(
                            "Blacklist pattern '{}' ({}) shadows provider '{}' suffix '{}'",
                            pattern, category, provider.name, suffix
                        )));
                    }
                }
            }
        }
    }

    if config.verification_patterns.is_empty() {
        warn!("No verification patterns configured; verification pages will not be recognized");
    }

    Ok(())
}
