//! Hostname normalization and zone arithmetic backed by the Public Suffix List.

use regex::Regex;
use std::sync::LazyLock;

/// Labels may carry leading underscores (`_dmarc`, `_acme-challenge`).
static HOSTNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?(\.[a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?)*$")
        .expect("hostname regex is valid")
});

const MAX_HOSTNAME_LEN: usize = 253;

/// Lowercase, trim, drop the trailing root dot and any leading `*.` wildcard
/// marker. Returns `None` when the result is not a plausible DNS name.
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let mut name = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    while let Some(stripped) = name.strip_prefix("*.") {
        name = stripped.to_string();
    }
    if name.is_empty() || name.len() > MAX_HOSTNAME_LEN {
        return None;
    }
    if !HOSTNAME_REGEX.is_match(&name) {
        return None;
    }
    Some(name)
}

/// Registrable domain (`shop.example.co.uk` -> `example.co.uk`).
pub fn registrable_domain(host: &str) -> Option<&str> {
    psl::domain_str(host)
}

/// True when the name has more labels than its registrable domain.
pub fn is_subdomain(host: &str) -> bool {
    match registrable_domain(host) {
        Some(root) => label_count(host) > label_count(root),
        None => false,
    }
}

/// True when the name is itself a public suffix (`com`, `github.io`).
pub fn is_public_suffix(host: &str) -> bool {
    registrable_domain(host).is_none()
}

/// The zone one label above `host`, if any.
pub fn parent_zone(host: &str) -> Option<&str> {
    host.split_once('.').map(|(_, parent)| parent).filter(|p| !p.is_empty())
}

/// True when `host` equals `root` or sits underneath it.
pub fn is_within(host: &str, root: &str) -> bool {
    host == root || host.ends_with(&format!(".{}", root))
}

pub fn label_count(host: &str) -> usize {
    host.split('.').filter(|l| !l.is_empty()).count()
}
