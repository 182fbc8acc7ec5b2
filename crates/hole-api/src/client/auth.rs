// Session authentication (v6)
//
// The v6 API exchanges the configured password for a session id. The v5 API
// has no sessions: its token rides on every request, so both calls here are
// no-ops there.

use chrono::Utc;
use reqwest::header::HeaderMap;
use secrecy::SecretString;
use tracing::{debug, info};

use super::HoleClient;
use crate::adapter::{CredentialPlacement, v6};
use crate::error::Error;
use crate::session::Session;

impl HoleClient {
    /// Open a fresh session, replacing any current one.
    ///
    /// `POST /api/auth` with `{"password": ...}`. On v5 this does nothing.
    pub async fn authenticate(&self) -> Result<(), Error> {
        if self.adapter.credential_placement() != CredentialPlacement::Session {
            return Ok(());
        }
        let password = self.token.as_ref().ok_or(Error::MissingCredentials {
            operation: "authenticate",
        })?;
        self.login(password).await.map(|_| ())
    }

    /// End the current session.
    ///
    /// `DELETE /api/auth`. The local session is dropped whatever the
    /// appliance answers. An expired session is dropped without a request,
    /// and a 401 or 404 means the appliance already forgot it. Without a
    /// session (and always on v5) this does nothing.
    pub async fn logout(&self) -> Result<(), Error> {
        let Some(session) = self.take_session() else {
            return Ok(());
        };
        if !session.is_valid_at(Utc::now()) {
            debug!("dropped expired session");
            return Ok(());
        }
        let Some(spec) = self.adapter.logout_request() else {
            return Ok(());
        };

        let mut headers = HeaderMap::new();
        session.apply(&mut headers)?;
        match self.send(&spec, &spec.query, headers).await {
            Ok(_) => debug!("session closed"),
            Err(Error::Authentication { .. } | Error::Http { status: 404, .. }) => {
                debug!("session already gone on the appliance");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// The current session, logging in first if there is none or it expired.
    pub(super) async fn ensure_session(&self, password: &SecretString) -> Result<Session, Error> {
        if let Some(session) = self.current_session() {
            return Ok(session);
        }
        debug!("no live session, authenticating");
        self.login(password).await
    }

    async fn login(&self, password: &SecretString) -> Result<Session, Error> {
        let Some(spec) = self.adapter.login_request(password) else {
            return Err(Error::UnsupportedOperation("sessions on the v5 API"));
        };

        if let Err(e) = self.logout().await {
            debug!(error = %e, "closing previous session failed");
        }

        let body = match self.send(&spec, &spec.query, HeaderMap::new()).await {
            Ok(body) => body,
            Err(Error::Http { status: 400, body }) => {
                return Err(Error::Authentication {
                    message: v6::error_message(&body).unwrap_or_else(|| "bad request".into()),
                });
            }
            Err(Error::Http { status, .. }) => {
                return Err(Error::Authentication {
                    message: format!("login failed with HTTP {status}"),
                });
            }
            Err(e) => return Err(e),
        };

        let session = self.adapter.parse_session(&body, Utc::now())?;
        self.store_session(session.clone());
        info!("authenticated with appliance");
        Ok(session)
    }
}
