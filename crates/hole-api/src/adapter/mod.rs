// Version adapters
//
// Translate a logical `Operation` into the version-specific HTTP request and
// map the version's JSON body back into the canonical models. Version
// branching happens here and only here: `Adapter` is a closed enum over the
// two supported API generations.

pub mod v5;
pub mod v6;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::SecretString;

use crate::error::Error;
use crate::models::{BlockingStatus, ForwardDestination, Summary, TopClient, TopItems, Versions};
use crate::session::Session;
use crate::version::ApiVersion;

pub use v5::V5Adapter;
pub use v6::V6Adapter;

/// A logical operation, independent of API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Summary,
    Status,
    Enable,
    /// Disable blocking, for `duration` or until re-enabled.
    Disable { duration: Option<Duration> },
    TopItems { count: u32 },
    TopClients { count: u32 },
    ForwardDestinations,
    Versions,
}

impl Operation {
    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Status => "status",
            Self::Enable => "enable",
            Self::Disable { .. } => "disable",
            Self::TopItems { .. } => "top items",
            Self::TopClients { .. } => "top clients",
            Self::ForwardDestinations => "forward destinations",
            Self::Versions => "versions",
        }
    }
}

/// One HTTP request, before credentials are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    /// Absolute path, joined onto the appliance root URL.
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
    /// The call fails with `MissingCredentials` when no token is configured.
    pub requires_auth: bool,
}

impl RequestSpec {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            requires_auth: false,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub(crate) fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Query parameter names in order, without values.
    pub fn query_names(&self) -> Vec<&'static str> {
        self.query.iter().map(|(name, _)| *name).collect()
    }

    /// Value of the first query parameter with this name.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Where the client puts the configured credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPlacement {
    /// Sent as a query parameter with this name on every request.
    QueryParam(&'static str),
    /// Exchanged for a session whose id travels in request headers.
    Session,
}

/// The adapter for one API version.
#[derive(Debug, Clone)]
pub enum Adapter {
    V5(V5Adapter),
    V6(V6Adapter),
}

impl Adapter {
    /// `location` is the web interface path used by v5; v6 ignores it.
    pub fn new(version: ApiVersion, location: &str) -> Self {
        match version {
            ApiVersion::V5 => Self::V5(V5Adapter::new(location)),
            ApiVersion::V6 => Self::V6(V6Adapter),
        }
    }

    pub fn version(&self) -> ApiVersion {
        match self {
            Self::V5(_) => ApiVersion::V5,
            Self::V6(_) => ApiVersion::V6,
        }
    }

    pub fn credential_placement(&self) -> CredentialPlacement {
        match self {
            Self::V5(_) => CredentialPlacement::QueryParam(v5::AUTH_PARAM),
            Self::V6(_) => CredentialPlacement::Session,
        }
    }

    /// The requests that make up `op`, in the order they are sent.
    ///
    /// Most operations are a single request; v6 top items needs one for
    /// permitted and one for blocked domains.
    pub fn requests(&self, op: &Operation) -> Vec<RequestSpec> {
        match self {
            Self::V5(a) => vec![a.request(op)],
            Self::V6(a) => a.requests(op),
        }
    }

    /// Login request, for versions that use sessions.
    pub fn login_request(&self, password: &SecretString) -> Option<RequestSpec> {
        match self {
            Self::V5(_) => None,
            Self::V6(_) => Some(v6::login_request(password)),
        }
    }

    /// Logout request, for versions that use sessions.
    pub fn logout_request(&self) -> Option<RequestSpec> {
        match self {
            Self::V5(_) => None,
            Self::V6(_) => Some(v6::logout_request()),
        }
    }

    // ── Response mapping ─────────────────────────────────────────────

    pub fn parse_summary(&self, body: &[u8]) -> Result<Summary, Error> {
        match self {
            Self::V5(_) => v5::parse_summary(body),
            Self::V6(_) => v6::parse_summary(body),
        }
    }

    pub fn parse_status(
        &self,
        body: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<BlockingStatus, Error> {
        match self {
            Self::V5(_) => v5::parse_status(body, received_at),
            Self::V6(_) => v6::parse_status(body, received_at),
        }
    }

    /// `bodies` holds one response per request from [`Adapter::requests`].
    pub fn parse_top_items(&self, bodies: &[Vec<u8>]) -> Result<TopItems, Error> {
        match self {
            Self::V5(_) => v5::parse_top_items(single(bodies)?),
            Self::V6(_) => match bodies {
                [permitted, blocked] => v6::parse_top_items(permitted, blocked),
                _ => Err(unexpected_count(2, bodies.len())),
            },
        }
    }

    pub fn parse_top_clients(&self, body: &[u8]) -> Result<Vec<TopClient>, Error> {
        match self {
            Self::V5(_) => v5::parse_top_clients(body),
            Self::V6(_) => v6::parse_top_clients(body),
        }
    }

    pub fn parse_forward_destinations(
        &self,
        body: &[u8],
    ) -> Result<Vec<ForwardDestination>, Error> {
        match self {
            Self::V5(_) => v5::parse_forward_destinations(body),
            Self::V6(_) => v6::parse_forward_destinations(body),
        }
    }

    pub fn parse_versions(&self, body: &[u8]) -> Result<Versions, Error> {
        match self {
            Self::V5(_) => v5::parse_versions(body),
            Self::V6(_) => v6::parse_versions(body),
        }
    }

    pub(crate) fn parse_session(
        &self,
        body: &[u8],
        issued_at: DateTime<Utc>,
    ) -> Result<Session, Error> {
        match self {
            Self::V5(_) => Err(Error::UnsupportedOperation("sessions on the v5 API")),
            Self::V6(_) => v6::parse_session(body, issued_at),
        }
    }
}

/// Whole seconds to disable for, rounded up. `None` (or a zero duration)
/// means until re-enabled.
pub(crate) fn timer_secs(duration: Option<Duration>) -> Option<u64> {
    let d = duration.filter(|d| !d.is_zero())?;
    Some(d.as_secs() + u64::from(d.subsec_nanos() > 0))
}

/// The only body of a single-request operation.
pub(crate) fn single(bodies: &[Vec<u8>]) -> Result<&[u8], Error> {
    match bodies {
        [body] => Ok(body.as_slice()),
        _ => Err(unexpected_count(1, bodies.len())),
    }
}

fn unexpected_count(expected: usize, got: usize) -> Error {
    Error::Deserialization {
        message: format!("expected {expected} response bodies, got {got}"),
        body: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn adapter_follows_version() {
        let v5 = Adapter::new(ApiVersion::V5, "admin");
        let v6 = Adapter::new(ApiVersion::V6, "admin");
        assert_eq!(v5.version(), ApiVersion::V5);
        assert_eq!(v6.version(), ApiVersion::V6);
        assert_eq!(
            v5.credential_placement(),
            CredentialPlacement::QueryParam("auth")
        );
        assert_eq!(v6.credential_placement(), CredentialPlacement::Session);
    }

    #[test]
    fn sessions_only_exist_on_v6() {
        let password: SecretString = "hunter2".to_string().into();
        let v5 = Adapter::new(ApiVersion::V5, "admin");
        assert!(v5.login_request(&password).is_none());
        assert!(v5.logout_request().is_none());
        assert!(matches!(
            v5.parse_session(b"{}", Utc::now()),
            Err(Error::UnsupportedOperation(_))
        ));

        let v6 = Adapter::new(ApiVersion::V6, "admin");
        assert!(v6.login_request(&password).is_some());
        assert_eq!(
            v6.logout_request().map(|r| r.method),
            Some(Method::DELETE)
        );
    }

    #[test]
    fn every_operation_maps_to_at_least_one_request() {
        let ops = [
            Operation::Summary,
            Operation::Status,
            Operation::Enable,
            Operation::Disable { duration: None },
            Operation::TopItems { count: 10 },
            Operation::TopClients { count: 10 },
            Operation::ForwardDestinations,
            Operation::Versions,
        ];
        for version in [ApiVersion::V5, ApiVersion::V6] {
            let adapter = Adapter::new(version, "admin");
            for op in &ops {
                assert!(
                    !adapter.requests(op).is_empty(),
                    "{version} {} has no request",
                    op.name()
                );
            }
        }
    }

    #[test]
    fn disable_timer_rounds_up_to_whole_seconds() {
        assert_eq!(timer_secs(None), None);
        assert_eq!(timer_secs(Some(Duration::ZERO)), None);
        assert_eq!(timer_secs(Some(Duration::from_millis(1))), Some(1));
        assert_eq!(timer_secs(Some(Duration::from_secs(60))), Some(60));
        assert_eq!(timer_secs(Some(Duration::from_millis(60_500))), Some(61));
    }

    #[test]
    fn top_items_body_count_is_checked() {
        let v6 = Adapter::new(ApiVersion::V6, "admin");
        let err = v6.parse_top_items(&[b"{}".to_vec()]).err();
        assert!(matches!(err, Some(Error::Deserialization { .. })));
    }
}
