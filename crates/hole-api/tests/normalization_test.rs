#![allow(clippy::unwrap_used)]
// Both API generations must produce identical canonical values for the
// same appliance state.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hole_api::{Adapter, ApiVersion, ClientConfig, HoleClient};

fn bytes(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

fn v5_summary() -> serde_json::Value {
    json!({
        "domains_being_blocked": 98_000,
        "dns_queries_today": 5_000,
        "ads_blocked_today": 250,
        "ads_percentage_today": 5.0,
        "unique_domains": 800,
        "queries_forwarded": 3_000,
        "queries_cached": 1_750,
        "clients_ever_seen": 12,
        "unique_clients": 7,
        "privacy_level": 0,
        "status": "enabled",
        "gravity_last_updated": { "file_exists": true, "absolute": 1_718_000_000 },
        "reply_UNKNOWN": 0,
        "reply_NODATA": 40,
        "reply_NXDOMAIN": 12,
        "reply_IP": 4_000
    })
}

fn v6_summary() -> serde_json::Value {
    json!({
        "queries": {
            "total": 5_000,
            "blocked": 250,
            "percent_blocked": 5.0,
            "unique_domains": 800,
            "forwarded": 3_000,
            "cached": 1_750,
            "replies": { "UNKNOWN": 0, "NODATA": 40, "NXDOMAIN": 12, "IP": 4_000 }
        },
        "clients": { "active": 7, "total": 12 },
        "gravity": { "domains_being_blocked": 98_000, "last_update": 1_718_000_000 },
        "took": 0.002
    })
}

#[test]
fn summary_is_version_independent() {
    let v5 = Adapter::new(ApiVersion::V5, "admin")
        .parse_summary(&bytes(&v5_summary()))
        .unwrap();
    let v6 = Adapter::new(ApiVersion::V6, "admin")
        .parse_summary(&bytes(&v6_summary()))
        .unwrap();

    assert_eq!(v5, v6);
    assert_eq!(v5.reply_types.len(), 4);
}

#[test]
fn top_items_are_version_independent() {
    let v5 = Adapter::new(ApiVersion::V5, "admin")
        .parse_top_items(&[bytes(&json!({
            "top_queries": { "b.example": 10, "a.example": 10, "c.example": 30 },
            "top_ads": []
        }))])
        .unwrap();

    let v6 = Adapter::new(ApiVersion::V6, "admin")
        .parse_top_items(&[
            bytes(&json!({
                "domains": [
                    { "domain": "c.example", "count": 30 },
                    { "domain": "a.example", "count": 10 },
                    { "domain": "b.example", "count": 10 }
                ],
                "total_queries": 50,
                "blocked_queries": 0
            })),
            bytes(&json!({ "domains": [], "total_queries": 50, "blocked_queries": 0 })),
        ])
        .unwrap();

    assert_eq!(v5, v6);
    assert!(v5.top_ads.is_empty());
}

#[test]
fn versions_are_version_independent() {
    let v5 = Adapter::new(ApiVersion::V5, "admin")
        .parse_versions(&bytes(&json!({
            "core_update": true,
            "web_update": false,
            "FTL_update": false,
            "core_current": "v5.17",
            "web_current": "v5.20",
            "FTL_current": "v5.23",
            "core_latest": "v5.18",
            "web_latest": "v5.20",
            "FTL_latest": "v5.23"
        })))
        .unwrap();

    let v6 = Adapter::new(ApiVersion::V6, "admin")
        .parse_versions(&bytes(&json!({
            "version": {
                "core": {
                    "local": { "version": "v5.17", "hash": "111" },
                    "remote": { "version": "v5.18", "hash": "222" }
                },
                "web": {
                    "local": { "version": "v5.20", "hash": "333" },
                    "remote": { "version": "v5.20", "hash": "333" }
                },
                "ftl": {
                    "local": { "version": "v5.23", "hash": "444" },
                    "remote": { "version": "v5.23", "hash": "444" }
                }
            }
        })))
        .unwrap();

    assert_eq!(v5, v6);
}

async fn client_for(server: &MockServer, version: u8) -> HoleClient {
    let uri = Url::parse(&server.uri()).unwrap();
    let config = ClientConfig::new(uri.host_str().unwrap())
        .with_port(uri.port().unwrap())
        .with_version(version);
    HoleClient::with_client(reqwest::Client::new(), &config).unwrap()
}

#[tokio::test]
async fn summary_through_both_clients_matches() {
    let v5_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api.php"))
        .and(query_param("summaryRaw", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(v5_summary()))
        .mount(&v5_server)
        .await;

    let v6_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stats/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(v6_summary()))
        .mount(&v6_server)
        .await;

    let v5 = client_for(&v5_server, 5).await.summary().await.unwrap();
    let v6 = client_for(&v6_server, 6).await.summary().await.unwrap();

    assert_eq!(v5, v6);
}

#[test]
fn unsupported_versions_are_config_errors() {
    for version in [0, 4, 7, 255] {
        let config = ClientConfig::new("pi.hole").with_version(version);
        let err = HoleClient::new(&config).err().unwrap();
        assert!(err.is_config_error(), "version {version}: {err:?}");
    }
}
