// v6 adapter
//
// REST endpoints under `/api/`. Authentication exchanges the password for a
// session at `/api/auth`; the session id then travels as `X-FTL-SID` on
// every request. Responses nest their counters by topic.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{Operation, RequestSpec, timer_secs};
use crate::error::Error;
use crate::models::{
    BlockingState, BlockingStatus, ComponentVersion, DomainCount, ForwardDestination, Summary,
    TopClient, TopItems, Versions,
};
use crate::session::{DEFAULT_VALIDITY_SECS, Session};

pub(crate) const AUTH_PATH: &str = "/api/auth";
const BLOCKING_PATH: &str = "/api/dns/blocking";
const SUMMARY_PATH: &str = "/api/stats/summary";
const TOP_DOMAINS_PATH: &str = "/api/stats/top_domains";
const TOP_CLIENTS_PATH: &str = "/api/stats/top_clients";
const UPSTREAMS_PATH: &str = "/api/stats/upstreams";
const VERSION_PATH: &str = "/api/info/version";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct V6Adapter;

impl V6Adapter {
    pub fn requests(&self, op: &Operation) -> Vec<RequestSpec> {
        match *op {
            Operation::Summary => vec![RequestSpec::get(SUMMARY_PATH)],
            Operation::Status => vec![RequestSpec::get(BLOCKING_PATH)],
            Operation::Enable => vec![blocking_request(true, None)],
            Operation::Disable { duration } => {
                vec![blocking_request(false, timer_secs(duration))]
            }
            Operation::TopItems { count } => {
                vec![top_domains_request(false, count), top_domains_request(true, count)]
            }
            Operation::TopClients { count } => {
                vec![RequestSpec::get(TOP_CLIENTS_PATH).param("count", count.to_string())]
            }
            Operation::ForwardDestinations => vec![RequestSpec::get(UPSTREAMS_PATH)],
            Operation::Versions => vec![RequestSpec::get(VERSION_PATH)],
        }
    }
}

fn blocking_request(blocking: bool, timer: Option<u64>) -> RequestSpec {
    RequestSpec::new(Method::POST, BLOCKING_PATH)
        .json(json!({ "blocking": blocking, "timer": timer }))
        .authenticated()
}

fn top_domains_request(blocked: bool, count: u32) -> RequestSpec {
    RequestSpec::get(TOP_DOMAINS_PATH)
        .param("blocked", blocked.to_string())
        .param("count", count.to_string())
}

pub(crate) fn login_request(password: &SecretString) -> RequestSpec {
    RequestSpec::new(Method::POST, AUTH_PATH)
        .json(json!({ "password": password.expose_secret() }))
}

pub(crate) fn logout_request() -> RequestSpec {
    RequestSpec::new(Method::DELETE, AUTH_PATH)
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawSummary {
    queries: RawQueries,
    #[serde(default)]
    clients: RawClients,
    gravity: RawGravity,
}

#[derive(Deserialize)]
struct RawQueries {
    total: u64,
    blocked: u64,
    percent_blocked: f64,
    #[serde(default)]
    unique_domains: u64,
    #[serde(default)]
    forwarded: u64,
    #[serde(default)]
    cached: u64,
    #[serde(default)]
    replies: BTreeMap<String, u64>,
}

#[derive(Default, Deserialize)]
struct RawClients {
    #[serde(default)]
    active: u64,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct RawGravity {
    domains_being_blocked: u64,
}

#[derive(Deserialize)]
struct RawBlocking {
    blocking: String,
    #[serde(default)]
    timer: Option<f64>,
}

#[derive(Deserialize)]
struct RawTopDomains {
    domains: Vec<RawDomain>,
}

#[derive(Deserialize)]
struct RawDomain {
    domain: String,
    count: u64,
}

#[derive(Deserialize)]
struct RawTopClients {
    clients: Vec<RawClient>,
}

#[derive(Deserialize)]
struct RawClient {
    name: Option<String>,
    ip: String,
    count: u64,
}

#[derive(Deserialize)]
struct RawUpstreams {
    upstreams: Vec<RawUpstream>,
    total_queries: u64,
}

#[derive(Deserialize)]
struct RawUpstream {
    name: Option<String>,
    ip: Option<String>,
    count: u64,
}

#[derive(Deserialize)]
struct RawVersionEnvelope {
    version: RawVersionSet,
}

#[derive(Deserialize)]
struct RawVersionSet {
    core: Option<RawComponent>,
    web: Option<RawComponent>,
    ftl: Option<RawComponent>,
}

#[derive(Deserialize)]
struct RawComponent {
    local: Option<RawBuild>,
    remote: Option<RawBuild>,
}

#[derive(Deserialize)]
struct RawBuild {
    version: Option<String>,
    hash: Option<String>,
}

#[derive(Deserialize)]
struct RawAuth {
    session: RawSession,
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default)]
    valid: bool,
    sid: Option<String>,
    csrf: Option<String>,
    validity: Option<i64>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct RawErrorEnvelope {
    error: RawError,
}

#[derive(Deserialize)]
struct RawError {
    message: Option<String>,
}

// ── Response mapping ─────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::decode(&e, body))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub(crate) fn parse_summary(body: &[u8]) -> Result<Summary, Error> {
    let raw: RawSummary = decode(body)?;
    Ok(Summary {
        domains_being_blocked: raw.gravity.domains_being_blocked,
        dns_queries_today: raw.queries.total,
        ads_blocked_today: raw.queries.blocked,
        ads_percentage_today: raw.queries.percent_blocked,
        unique_domains: raw.queries.unique_domains,
        queries_forwarded: raw.queries.forwarded,
        queries_cached: raw.queries.cached,
        clients_ever_seen: raw.clients.total,
        unique_clients: raw.clients.active,
        reply_types: raw.queries.replies,
    })
}

pub(crate) fn parse_status(body: &[u8], received_at: DateTime<Utc>) -> Result<BlockingStatus, Error> {
    let raw: RawBlocking = decode(body)?;
    let timer = raw
        .timer
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
    Ok(BlockingStatus::new(
        BlockingState::from_wire(&raw.blocking),
        timer,
        received_at,
    ))
}

pub(crate) fn parse_top_items(permitted: &[u8], blocked: &[u8]) -> Result<TopItems, Error> {
    let permitted: RawTopDomains = decode(permitted)?;
    let blocked: RawTopDomains = decode(blocked)?;
    Ok(TopItems {
        top_queries: domain_counts(permitted),
        top_ads: domain_counts(blocked),
    })
}

fn domain_counts(raw: RawTopDomains) -> Vec<DomainCount> {
    raw.domains
        .into_iter()
        .map(|d| DomainCount {
            domain: d.domain,
            count: d.count,
        })
        .collect()
}

pub(crate) fn parse_top_clients(body: &[u8]) -> Result<Vec<TopClient>, Error> {
    let raw: RawTopClients = decode(body)?;
    Ok(raw
        .clients
        .into_iter()
        .map(|c| TopClient {
            name: non_empty(c.name),
            ip: c.ip,
            count: c.count,
        })
        .collect())
}

pub(crate) fn parse_forward_destinations(body: &[u8]) -> Result<Vec<ForwardDestination>, Error> {
    let raw: RawUpstreams = decode(body)?;
    let total = raw.total_queries;
    Ok(raw
        .upstreams
        .into_iter()
        .map(|u| {
            let name = non_empty(u.name);
            let ip = non_empty(u.ip)
                .or_else(|| name.clone())
                .unwrap_or_default();
            ForwardDestination {
                name,
                ip,
                percentage: percent(u.count, total),
            }
        })
        .collect())
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// An update is available when both build hashes are known and differ.
fn component_version(raw: Option<RawComponent>) -> ComponentVersion {
    let Some(raw) = raw else {
        return ComponentVersion::default();
    };
    let (current, local_hash) = split_build(raw.local);
    let (latest, remote_hash) = split_build(raw.remote);
    let update_available = match (local_hash, remote_hash) {
        (Some(local), Some(remote)) => local != remote,
        _ => false,
    };
    ComponentVersion {
        current,
        latest,
        update_available,
    }
}

fn split_build(build: Option<RawBuild>) -> (Option<String>, Option<String>) {
    build.map_or((None, None), |b| (non_empty(b.version), non_empty(b.hash)))
}

pub(crate) fn parse_versions(body: &[u8]) -> Result<Versions, Error> {
    let raw: RawVersionEnvelope = decode(body)?;
    Ok(Versions {
        core: component_version(raw.version.core),
        web: component_version(raw.version.web),
        ftl: component_version(raw.version.ftl),
    })
}

pub(crate) fn parse_session(body: &[u8], issued_at: DateTime<Utc>) -> Result<Session, Error> {
    let raw: RawAuth = decode(body)?;
    let session = raw.session;
    if !session.valid {
        return Err(Error::Authentication {
            message: format!(
                "session rejected: {}",
                session.message.as_deref().unwrap_or("no reason given")
            ),
        });
    }
    let sid = non_empty(session.sid).ok_or_else(|| Error::Authentication {
        message: "no session id received".into(),
    })?;
    let validity = session
        .validity
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_VALIDITY_SECS);
    Ok(Session::new(
        SecretString::from(sid),
        non_empty(session.csrf).map(SecretString::from),
        validity,
        issued_at,
    ))
}

/// The `error.message` of a v6 error body, if it has one.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<RawErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
}
