use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;

use dangle::config::{config_base_dir, parse_config, ReferenceSnapshot};
use dangle::dns::StaticDnsSource;
use dangle::enumeration::StaticSource;
use dangle::errors::DangleError;
use dangle::http::StaticProber;
use dangle::models::{Classification, MatchedBy};
use dangle::pipeline::{ScanContext, ScanOrchestrator, ScanSources};

const PROVIDERS: &str = r#"
scan:
  retry_base_delay_ms: 0
providers:
  - name: Acme Hosting
    cname_suffixes: [acme-hosting.net]
    cidr_files: [ranges/acme.json]
    unclaimed_signatures: ["This site has not been claimed"]
    suspicious_statuses: [404]
"#;

async fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(path, content).await.unwrap();
}

#[tokio::test]
async fn test_user_file_replaces_sections_and_loads_ranges() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "dangle.yaml", PROVIDERS).await;
    write(
        dir.path(),
        "ranges/acme.json",
        r#"{"ipv4_ranges": ["203.0.113.0/24", {"ip_prefix": "192.0.2.0/25", "service": "EDGE"}], "ipv6_ranges": [{"ipv6_prefix": "2001:db8::/32"}]}"#,
    )
    .await;

    let path = dir.path().join("dangle.yaml");
    let config = parse_config(&path).await.unwrap();
    assert_eq!(config.providers.len(), 1);
    assert_eq!(config.scan.retry_base_delay_ms, 0);
    // Sections the file does not name keep their defaults.
    assert!(!config.verification_patterns.is_empty());
    assert!(!config.blacklist.is_empty());

    let snapshot = ReferenceSnapshot::build(&config, &config_base_dir(Some(&path))).await.unwrap();
    let acme = snapshot.providers.get("acme hosting").unwrap();
    assert_eq!(acme.networks.len(), 3);

    // An address-only match inside the loaded range.
    let dns = StaticDnsSource::new().with_address("shop.example.com", IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)));
    let http = StaticProber::new().with_response("shop.example.com", 404, "This site has not been claimed");
    let sources = ScanSources {
        subdomains: Arc::new(StaticSource::default()),
        dns: Arc::new(dns),
        http: Arc::new(http),
    };
    let outcome = ScanOrchestrator::new(ScanContext::new("shop.example.com").unwrap(), snapshot, sources)
        .unwrap()
        .run()
        .await
        .unwrap();

    let record = &outcome.verdicts[0];
    let provider = record.provider.as_ref().unwrap();
    assert_eq!(provider.provider, "Acme Hosting");
    assert_eq!(provider.matched_by, MatchedBy::Ip);
    assert_eq!(provider.confidence, 50);
    assert_eq!(record.verdict.classification, Classification::DefiniteTakeover);
}

#[tokio::test]
async fn test_missing_range_file_degrades_to_domain_matching() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "dangle.yaml", PROVIDERS).await;

    let path = dir.path().join("dangle.yaml");
    let config = parse_config(&path).await.unwrap();
    let snapshot = ReferenceSnapshot::build(&config, &config_base_dir(Some(&path))).await.unwrap();

    let acme = snapshot.providers.get("Acme Hosting").unwrap();
    assert!(acme.networks.is_empty());
    assert!(snapshot.providers.match_cname("site.acme-hosting.net").is_some());
}

#[tokio::test]
async fn test_malformed_range_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "dangle.yaml", PROVIDERS).await;
    write(dir.path(), "ranges/acme.json", r#"{"ipv4_ranges": ["203.0.113.0/33"]}"#).await;

    let path = dir.path().join("dangle.yaml");
    let config = parse_config(&path).await.unwrap();
    let err = ReferenceSnapshot::build(&config, &config_base_dir(Some(&path)))
        .await
        .unwrap_err();
    assert!(matches!(err, DangleError::Config(_)));
}

#[tokio::test]
async fn test_blacklist_shadowing_provider_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "dangle.yaml",
        r#"
blacklist:
  maintained_platform: [acme-hosting]
providers:
  - name: Acme Hosting
    cname_suffixes: [acme-hosting.net]
"#,
    )
    .await;

    let err = parse_config(&dir.path().join("dangle.yaml")).await.unwrap_err();
    match err {
        DangleError::Config(msg) => assert!(msg.contains("acme-hosting"), "{}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_files_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "dangle.yaml",
        "provider_files: [\"providers.d/*.yaml\"]\n",
    )
    .await;
    write(
        dir.path(),
        "providers.d/extra.yaml",
        "- name: Example Pages\n  cname_suffixes: [example-pages.io]\n  unclaimed_signatures: [\"Page not found\"]\n",
    )
    .await;

    let config = parse_config(&dir.path().join("dangle.yaml")).await.unwrap();
    assert!(config.providers.iter().any(|p| p.name == "Shopify"));
    assert_eq!(config.providers.last().unwrap().name, "Example Pages");
}

#[tokio::test]
async fn test_duplicate_provider_from_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "dangle.yaml", "provider_files: [\"extra.yaml\"]\n").await;
    write(dir.path(), "extra.yaml", "- name: shopify\n  cname_suffixes: [shopify-mirror.example]\n").await;

    let err = parse_config(&dir.path().join("dangle.yaml")).await.unwrap_err();
    assert!(matches!(err, DangleError::Config(_)));
}
