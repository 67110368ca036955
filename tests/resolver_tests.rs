//! Integration tests for client version resolution.

use std::collections::BTreeMap;

use serde_json::json;
use tigergraph::gsql::{ClientVersion, ClientVersionResolver, ResolutionError};
use tigergraph::{CacheConfig, HostUrl, RestClient, TigerGraphConfig, Version};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a resolver from `(server, client)` pairs.
fn create_test_resolver(entries: &[(&str, &str)]) -> ClientVersionResolver {
    let table: BTreeMap<Version, ClientVersion> = entries
        .iter()
        .map(|(server, client)| (server.parse().unwrap(), ClientVersion::new(*client).unwrap()))
        .collect();
    ClientVersionResolver::new(table)
}

fn v(s: &str) -> Version {
    s.parse().unwrap()
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_greatest_lesser_entry_uses_numeric_ordering() {
    let resolver = create_test_resolver(&[("3.8.0", "A"), ("3.9.0", "B"), ("3.10.0", "C")]);

    let client = resolver.resolve(&v("3.9.2"), None).unwrap();

    assert_eq!(client.as_str(), "B");
}

#[test]
fn test_every_server_version_resolves_to_greatest_entry_at_or_below() {
    let resolver = create_test_resolver(&[("2.6.0", "2.6"), ("3.2.0", "3.2"), ("3.10.0", "3.10")]);

    let cases = [
        ("2.6.0", "2.6"),
        ("2.6.9", "2.6"),
        ("3.1.99", "2.6"),
        ("3.2", "3.2"),
        ("3.9.9", "3.2"),
        ("3.10.0", "3.10"),
        ("4.0", "3.10"),
    ];
    for (server, expected) in cases {
        assert_eq!(
            resolver.resolve(&v(server), None).unwrap().as_str(),
            expected,
            "server version {server}"
        );
    }
}

#[test]
fn test_override_wins_regardless_of_table() {
    for resolver in [
        create_test_resolver(&[]),
        create_test_resolver(&[("3.6.0", "3.6.0")]),
        ClientVersionResolver::default(),
    ] {
        assert_eq!(
            resolver.resolve(&v("0.1"), Some("3.6.0")).unwrap().as_str(),
            "3.6.0"
        );
    }
}

#[test]
fn test_cache_config_table_overrides_builtin() {
    let mut table = BTreeMap::new();
    table.insert(v("1.0"), ClientVersion::new("custom").unwrap());
    let cache = CacheConfig::new("/tmp/gsql").version_map(table);

    let resolver = ClientVersionResolver::from_cache_config(&cache);

    assert_eq!(resolver.table().len(), 1);
    assert_eq!(resolver.resolve(&v("3.6.0"), None).unwrap().as_str(), "custom");
}

// ============================================================================
// End-to-End With a Reporting Server
// ============================================================================

async fn create_reporting_server(version: &str) -> MockServer {
    let server = MockServer::start().await;
    let listing = format!(
        "TigerGraph RESTPP: \n--- Version --- \nTigerGraph version: {version}\n\
         product release_{version}_05-19-2022 4e3ca2d3c0 2022-05-19 10:31:08 -0700\n"
    );
    Mock::given(method("GET"))
        .and(path("/version/MyGraph"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": false, "message": listing})),
        )
        .mount(&server)
        .await;
    server
}

async fn reported_version(server: &MockServer) -> Version {
    let config = TigerGraphConfig::builder()
        .host(HostUrl::new("http://127.0.0.1").unwrap())
        .restpp_port(server.address().port())
        .build()
        .unwrap();
    RestClient::new(&config)
        .unwrap()
        .server_version()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_reported_version_falls_back_to_older_client() {
    let server = create_reporting_server("3.6.0").await;
    let server_version = reported_version(&server).await;

    let resolver = create_test_resolver(&[("3.5.0", "3.5.0")]);

    assert_eq!(
        resolver.resolve(&server_version, None).unwrap().as_str(),
        "3.5.0"
    );
}

#[tokio::test]
async fn test_reported_version_older_than_table_fails() {
    let server = create_reporting_server("3.6.0").await;
    let server_version = reported_version(&server).await;

    let resolver = create_test_resolver(&[("3.6.1", "3.6.1"), ("3.7.0", "3.7.0")]);
    let error = resolver.resolve(&server_version, None).unwrap_err();

    assert!(matches!(error, ResolutionError::ServerTooOld { .. }));
    assert!(error.to_string().contains("3.6.0"));
}
