// v5 adapter
//
// One PHP endpoint at `/{location}/api.php`. The operation is selected by
// query parameter and authenticated calls carry the API token as `auth`.
// Responses are flat objects; PHP encodes an empty associative array as `[]`,
// and an unauthenticated call to a protected operation also answers `[]`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{Operation, RequestSpec, timer_secs};
use crate::error::Error;
use crate::models::{
    BlockingState, BlockingStatus, ComponentVersion, DomainCount, ForwardDestination, Summary,
    TopClient, TopItems, Versions,
};

/// Query parameter carrying the API token.
pub(crate) const AUTH_PARAM: &str = "auth";

const REPLY_PREFIX: &str = "reply_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V5Adapter {
    endpoint: String,
}

impl V5Adapter {
    pub fn new(location: &str) -> Self {
        let location = location.trim_matches('/');
        let endpoint = if location.is_empty() {
            "/api.php".to_owned()
        } else {
            format!("/{location}/api.php")
        };
        Self { endpoint }
    }

    /// Path of the PHP endpoint, e.g. `/admin/api.php`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request(&self, op: &Operation) -> RequestSpec {
        let spec = RequestSpec::get(self.endpoint.clone());
        match *op {
            Operation::Summary => spec.param("summaryRaw", ""),
            Operation::Status => spec.param("status", "").authenticated(),
            Operation::Enable => spec.param("enable", "").authenticated(),
            // 0 disables until re-enabled
            Operation::Disable { duration } => spec
                .param("disable", timer_secs(duration).unwrap_or(0).to_string())
                .authenticated(),
            Operation::TopItems { count } => {
                spec.param("topItems", count.to_string()).authenticated()
            }
            Operation::TopClients { count } => {
                spec.param("topClients", count.to_string()).authenticated()
            }
            Operation::ForwardDestinations => {
                spec.param("getForwardDestinations", "").authenticated()
            }
            Operation::Versions => spec.param("versions", ""),
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawSummary {
    domains_being_blocked: u64,
    dns_queries_today: u64,
    ads_blocked_today: u64,
    ads_percentage_today: f64,
    #[serde(default)]
    unique_domains: u64,
    #[serde(default)]
    queries_forwarded: u64,
    #[serde(default)]
    queries_cached: u64,
    #[serde(default)]
    clients_ever_seen: u64,
    #[serde(default)]
    unique_clients: u64,
    /// `status`, `gravity_last_updated`, and the flattened `reply_*` counters.
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawStatus {
    status: String,
}

/// A PHP associative array: a JSON object, or `[]` when empty.
#[derive(Deserialize)]
#[serde(untagged)]
enum PhpMap<V> {
    Map(BTreeMap<String, V>),
    Empty([(); 0]),
}

impl<V> PhpMap<V> {
    fn into_entries(self) -> Vec<(String, V)> {
        match self {
            Self::Map(map) => map.into_iter().collect(),
            Self::Empty(_) => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawTopItems {
    top_queries: PhpMap<u64>,
    top_ads: PhpMap<u64>,
}

#[derive(Deserialize)]
struct RawTopSources {
    top_sources: PhpMap<u64>,
}

#[derive(Deserialize)]
struct RawForwardDestinations {
    forward_destinations: PhpMap<f64>,
}

#[derive(Deserialize)]
struct RawVersions {
    core_current: Option<String>,
    core_latest: Option<String>,
    #[serde(default)]
    core_update: bool,
    web_current: Option<String>,
    web_latest: Option<String>,
    #[serde(default)]
    web_update: bool,
    #[serde(rename = "FTL_current")]
    ftl_current: Option<String>,
    #[serde(rename = "FTL_latest")]
    ftl_latest: Option<String>,
    #[serde(default, rename = "FTL_update")]
    ftl_update: bool,
}

// ── Response mapping ─────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    if is_empty_array(body) {
        return Err(Error::Authentication {
            message: "appliance returned an empty result; the API token is missing or invalid"
                .into(),
        });
    }
    serde_json::from_slice(body).map_err(|e| Error::decode(&e, body))
}

fn is_empty_array(body: &[u8]) -> bool {
    body.iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .eq(*b"[]")
}

pub(crate) fn parse_summary(body: &[u8]) -> Result<Summary, Error> {
    let raw: RawSummary = decode(body)?;
    let reply_types = raw
        .extra
        .iter()
        .filter_map(|(key, value)| {
            let kind = key.strip_prefix(REPLY_PREFIX)?;
            Some((kind.to_owned(), value.as_u64()?))
        })
        .collect();

    Ok(Summary {
        domains_being_blocked: raw.domains_being_blocked,
        dns_queries_today: raw.dns_queries_today,
        ads_blocked_today: raw.ads_blocked_today,
        ads_percentage_today: raw.ads_percentage_today,
        unique_domains: raw.unique_domains,
        queries_forwarded: raw.queries_forwarded,
        queries_cached: raw.queries_cached,
        clients_ever_seen: raw.clients_ever_seen,
        unique_clients: raw.unique_clients,
        reply_types,
    })
}

/// v5 never reports a re-enable timer.
pub(crate) fn parse_status(body: &[u8], received_at: DateTime<Utc>) -> Result<BlockingStatus, Error> {
    let raw: RawStatus = decode(body)?;
    Ok(BlockingStatus::new(
        BlockingState::from_wire(&raw.status),
        None,
        received_at,
    ))
}

pub(crate) fn parse_top_items(body: &[u8]) -> Result<TopItems, Error> {
    let raw: RawTopItems = decode(body)?;
    Ok(TopItems {
        top_queries: ranked(raw.top_queries),
        top_ads: ranked(raw.top_ads),
    })
}

fn ranked(map: PhpMap<u64>) -> Vec<DomainCount> {
    let mut items: Vec<DomainCount> = map
        .into_entries()
        .into_iter()
        .map(|(domain, count)| DomainCount { domain, count })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    items
}

/// Sources are keyed `hostname|ip`, or just `ip` when unresolved.
fn split_source(key: &str) -> (Option<String>, String) {
    match key.split_once('|') {
        Some((name, ip)) => (
            Some(name.to_owned()).filter(|n| !n.is_empty()),
            ip.to_owned(),
        ),
        None => (None, key.to_owned()),
    }
}

pub(crate) fn parse_top_clients(body: &[u8]) -> Result<Vec<TopClient>, Error> {
    let raw: RawTopSources = decode(body)?;
    let mut clients: Vec<TopClient> = raw
        .top_sources
        .into_entries()
        .into_iter()
        .map(|(key, count)| {
            let (name, ip) = split_source(&key);
            TopClient { name, ip, count }
        })
        .collect();
    clients.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.ip.cmp(&b.ip)));
    Ok(clients)
}

pub(crate) fn parse_forward_destinations(body: &[u8]) -> Result<Vec<ForwardDestination>, Error> {
    let raw: RawForwardDestinations = decode(body)?;
    let mut destinations: Vec<ForwardDestination> = raw
        .forward_destinations
        .into_entries()
        .into_iter()
        .map(|(key, percentage)| {
            let (name, ip) = split_source(&key);
            ForwardDestination {
                name,
                ip,
                percentage,
            }
        })
        .collect();
    destinations.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.ip.cmp(&b.ip))
    });
    Ok(destinations)
}

pub(crate) fn parse_versions(body: &[u8]) -> Result<Versions, Error> {
    let raw: RawVersions = decode(body)?;
    Ok(Versions {
        core: ComponentVersion {
            current: raw.core_current,
            latest: raw.core_latest,
            update_available: raw.core_update,
        },
        web: ComponentVersion {
            current: raw.web_current,
            latest: raw.web_latest,
            update_available: raw.web_update,
        },
        ftl: ComponentVersion {
            current: raw.ftl_current,
            latest: raw.ftl_latest,
            update_available: raw.ftl_update,
        },
    })
}
