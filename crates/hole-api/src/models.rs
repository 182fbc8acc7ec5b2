// Canonical response types
//
// Every adapter maps its version's JSON into these shapes, so callers never
// see which API generation answered. All values are immutable snapshots of a
// single response.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Query and blocklist counters for the current day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Number of entries in the compiled blocklist.
    pub domains_being_blocked: u64,
    pub dns_queries_today: u64,
    pub ads_blocked_today: u64,
    /// Share of today's queries that were blocked, 0–100.
    pub ads_percentage_today: f64,
    pub unique_domains: u64,
    pub queries_forwarded: u64,
    pub queries_cached: u64,
    pub clients_ever_seen: u64,
    /// Clients active today.
    pub unique_clients: u64,
    /// Reply kind (`NODATA`, `NXDOMAIN`, `IP`, ...) to count.
    pub reply_types: BTreeMap<String, u64>,
}

/// Whether DNS blocking is active.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BlockingState {
    Enabled,
    Disabled,
    Failed,
    #[default]
    Unknown,
}

impl BlockingState {
    /// Lenient parse: anything unrecognised maps to `Unknown`.
    pub fn from_wire(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }
}

/// Blocking state plus an optional scheduled re-enable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockingStatus {
    pub state: BlockingState,
    /// Time left before blocking turns back on, as reported by the appliance.
    pub timer: Option<Duration>,
    /// When blocking turns back on, computed from `timer` and the time the
    /// response was received.
    pub reenable_at: Option<DateTime<Utc>>,
}

impl BlockingStatus {
    pub(crate) fn new(
        state: BlockingState,
        timer: Option<Duration>,
        received_at: DateTime<Utc>,
    ) -> Self {
        let reenable_at = timer
            .and_then(|t| chrono::TimeDelta::from_std(t).ok())
            .and_then(|delta| received_at.checked_add_signed(delta));
        Self {
            state,
            timer,
            reenable_at,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state == BlockingState::Enabled
    }
}

/// One domain and how many queries it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

/// Most-queried permitted and blocked domains, each by descending count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopItems {
    pub top_queries: Vec<DomainCount>,
    pub top_ads: Vec<DomainCount>,
}

/// A client ranked by query volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopClient {
    /// Resolved hostname, when the appliance knows one.
    pub name: Option<String>,
    pub ip: String,
    pub count: u64,
}

/// An upstream (or the blocklist / cache pseudo-destinations) and its share
/// of answered queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardDestination {
    pub name: Option<String>,
    pub ip: String,
    /// Percentage of total queries, 0–100.
    pub percentage: f64,
}

/// Installed and available version of one appliance component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentVersion {
    pub current: Option<String>,
    pub latest: Option<String>,
    pub update_available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Versions {
    pub core: ComponentVersion,
    pub web: ComponentVersion,
    /// The DNS engine.
    pub ftl: ComponentVersion,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn blocking_state_is_lenient() {
        assert_eq!(BlockingState::from_wire("enabled"), BlockingState::Enabled);
        assert_eq!(BlockingState::from_wire("Disabled"), BlockingState::Disabled);
        assert_eq!(BlockingState::from_wire("failed"), BlockingState::Failed);
        assert_eq!(BlockingState::from_wire("paused"), BlockingState::Unknown);
        assert_eq!(BlockingState::Disabled.to_string(), "disabled");
    }

    #[test]
    fn reenable_time_is_offset_from_receipt() {
        let received = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        let status = BlockingStatus::new(
            BlockingState::Disabled,
            Some(Duration::from_secs(60)),
            received,
        );
        assert_eq!(
            status.reenable_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 15, 10, 31, 0).unwrap())
        );
        assert!(!status.is_enabled());

        let open_ended = BlockingStatus::new(BlockingState::Disabled, None, received);
        assert_eq!(open_ended.reenable_at, None);
    }
}
