// Appliance HTTP client
//
// Wraps `reqwest::Client` with adapter-driven request construction,
// credential placement, and status handling. The public operations live in
// sibling files as inherent methods so this module stays focused on
// transport mechanics.

mod auth;
mod blocking;
mod stats;

use std::sync::RwLock;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace, warn};
use url::Url;

use crate::adapter::{Adapter, CredentialPlacement, Operation, RequestSpec};
use crate::config::ClientConfig;
use crate::error::{Error, preview};
use crate::session::Session;
use crate::version::ApiVersion;

/// Client for one appliance, speaking the API version fixed at construction.
///
/// Every operation is a single round trip (two for v6 top items) with no
/// retry. The only state carried between calls is the v6 session.
pub struct HoleClient {
    http: reqwest::Client,
    base_url: Url,
    adapter: Adapter,
    token: Option<SecretString>,
    session: RwLock<Option<Session>>,
}

impl HoleClient {
    /// Build a client from a config.
    ///
    /// The config is validated first, so an unsupported version or a bad
    /// host fails here without touching the network.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        let http = config.transport().build_client()?;
        Self::with_client(http, config)
    }

    /// Build a client around a pre-configured `reqwest::Client`.
    ///
    /// TLS and timeout settings in `config` are ignored; the caller's client
    /// is used as-is.
    pub fn with_client(http: reqwest::Client, config: &ClientConfig) -> Result<Self, Error> {
        let version = config.validate()?;
        Ok(Self {
            http,
            base_url: config.base_url()?,
            adapter: Adapter::new(version, config.location()),
            token: config.token.clone(),
            session: RwLock::new(None),
        })
    }

    pub fn version(&self) -> ApiVersion {
        self.adapter.version()
    }

    /// The appliance root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Whether a v6 session is currently held and unexpired.
    pub fn has_session(&self) -> bool {
        self.current_session().is_some()
    }

    // ── Session state ────────────────────────────────────────────────

    fn current_session(&self) -> Option<Session> {
        let guard = self.session.read().expect("session lock poisoned");
        guard
            .as_ref()
            .filter(|s| s.is_valid_at(Utc::now()))
            .cloned()
    }

    fn store_session(&self, session: Session) {
        *self.session.write().expect("session lock poisoned") = Some(session);
    }

    fn take_session(&self) -> Option<Session> {
        self.session.write().expect("session lock poisoned").take()
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Run every request of `op` in order and collect the bodies.
    pub(crate) async fn fetch(&self, op: &Operation) -> Result<Vec<Vec<u8>>, Error> {
        let specs = self.adapter.requests(op);
        debug!(operation = op.name(), version = %self.version(), "running operation");
        let mut bodies = Vec::with_capacity(specs.len());
        for spec in &specs {
            bodies.push(self.execute(op, spec).await?);
        }
        Ok(bodies)
    }

    /// Attach credentials according to the adapter, then send.
    async fn execute(&self, op: &Operation, spec: &RequestSpec) -> Result<Vec<u8>, Error> {
        if spec.requires_auth && self.token.is_none() {
            return Err(Error::MissingCredentials {
                operation: op.name(),
            });
        }

        let mut query = spec.query.clone();
        let mut headers = HeaderMap::new();

        match (self.adapter.credential_placement(), &self.token) {
            (CredentialPlacement::QueryParam(name), Some(token)) => {
                query.push((name, token.expose_secret().to_owned()));
            }
            (CredentialPlacement::Session, Some(password)) => {
                let session = self.ensure_session(password).await?;
                session.apply(&mut headers)?;
            }
            (_, None) => {}
        }

        let result = self.send(spec, &query, headers).await;
        if matches!(result, Err(Error::Authentication { .. }))
            && self.take_session().is_some()
        {
            warn!("appliance rejected the session; it will be renewed on the next call");
        }
        result
    }

    /// Send one request and return the body of a 2xx response.
    ///
    /// The status is checked before the body is read, so an error status
    /// never surfaces as a JSON error.
    async fn send(
        &self,
        spec: &RequestSpec,
        query: &[(&'static str, String)],
        headers: HeaderMap,
    ) -> Result<Vec<u8>, Error> {
        let mut url = self.base_url.join(&spec.path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        debug!(
            method = %spec.method,
            path = %spec.path,
            params = ?spec.query_names(),
            "sending request"
        );

        let mut builder = self
            .http
            .request(spec.method.clone(), url)
            .headers(headers);
        if let Some(body) = &spec.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        debug!(%status, "response received");

        if status == StatusCode::UNAUTHORIZED {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("rejected by appliance (HTTP {status}): {}", preview(&body)),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        let body = resp.bytes().await?.to_vec();
        trace!(body = %String::from_utf8_lossy(&body), "response body");
        Ok(body)
    }
}
