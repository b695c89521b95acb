use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::path::Path;
use tracing::info;

use super::ranges::{load_range_file, parse_cidr};
use crate::config::ProviderProfile;
use crate::errors::DangleError;

/// Compiled reference data for one provider.
#[derive(Debug, Clone)]
pub struct ProviderReference {
    pub name: String,
    /// Lowercased, stored as `.suffix.` for label-aligned matching.
    suffixes: Vec<String>,
    pub networks: Vec<IpNetwork>,
    pub unclaimed_signatures: Vec<String>,
    pub suspicious_statuses: Vec<u16>,
}

impl ProviderReference {
    pub fn new(
        name: impl Into<String>,
        cname_suffixes: &[String],
        networks: Vec<IpNetwork>,
        unclaimed_signatures: Vec<String>,
        suspicious_statuses: Vec<u16>,
    ) -> Self {
        let suffixes = cname_suffixes
            .iter()
            .map(|s| s.trim().trim_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .map(|s| format!(".{}.", s))
            .collect();
        Self {
            name: name.into(),
            suffixes,
            networks,
            unclaimed_signatures,
            suspicious_statuses,
        }
    }

    /// Length of the longest suffix matching `target`, if any.
    pub fn cname_match_len(&self, target: &str) -> Option<usize> {
        let host = format!(".{}.", target.trim_matches('.').to_ascii_lowercase());
        self.suffixes
            .iter()
            .filter(|suffix| host.contains(suffix.as_str()))
            .map(|suffix| suffix.len())
            .max()
    }

    pub fn contains_address(&self, addr: &IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(*addr))
    }

    pub fn has_ranges(&self) -> bool {
        !self.networks.is_empty()
    }
}

/// All providers known to a scan. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: Vec<ProviderReference>,
}

impl ProviderCatalog {
    pub fn new(providers: Vec<ProviderReference>) -> Self {
        Self { providers }
    }

    /// Compile profiles, resolving `cidr_files` relative to `base_dir`.
    pub async fn build(profiles: &[ProviderProfile], base_dir: &Path) -> Result<Self, DangleError> {
        let mut providers = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let mut networks = profile
                .cidrs
                .iter()
                .map(|raw| parse_cidr(&profile.name, raw))
                .collect::<Result<Vec<_>, _>>()?;

            for file in &profile.cidr_files {
                if let Some(loaded) = load_range_file(&profile.name, &base_dir.join(file)).await? {
                    networks.extend(loaded);
                }
            }

            info!(
                provider = %profile.name,
                suffixes = profile.cname_suffixes.len(),
                ranges = networks.len(),
                signatures = profile.unclaimed_signatures.len(),
                "Loaded provider profile"
            );

            providers.push(ProviderReference::new(
                profile.name.clone(),
                &profile.cname_suffixes,
                networks,
                profile.unclaimed_signatures.clone(),
                profile.suspicious_statuses.clone(),
            ));
        }
        Ok(Self { providers })
    }

    pub fn get(&self, name: &str) -> Option<&ProviderReference> {
        self.providers.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderReference> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider whose suffix list best matches `target` (longest suffix wins).
    pub fn match_cname(&self, target: &str) -> Option<&ProviderReference> {
        self.providers
            .iter()
            .filter_map(|p| p.cname_match_len(target).map(|len| (len, p)))
            .fold(None, |best: Option<(usize, &ProviderReference)>, (len, p)| match best {
                Some((best_len, _)) if best_len >= len => best,
                _ => Some((len, p)),
            })
            .map(|(_, p)| p)
    }

    /// First provider whose ranges contain any of `addresses`.
    pub fn match_addresses(&self, addresses: &[IpAddr]) -> Option<&ProviderReference> {
        self.providers
            .iter()
            .find(|p| addresses.iter().any(|a| p.contains_address(a)))
    }
}
