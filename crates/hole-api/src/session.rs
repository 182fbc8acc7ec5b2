// v6 session state
//
// The session id (and CSRF token) returned by `/api/auth`, with the instant
// it stops being valid. Lives in memory only.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

pub(crate) const SID_HEADER: &str = "x-ftl-sid";
pub(crate) const CSRF_HEADER: &str = "x-ftl-csrf";

/// Seconds a v6 session stays valid when the appliance doesn't say.
pub(crate) const DEFAULT_VALIDITY_SECS: i64 = 300;

/// An authenticated v6 session.
///
/// Held in memory by the client for as long as it is valid; never persisted.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub sid: SecretString,
    pub csrf: Option<SecretString>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        sid: SecretString,
        csrf: Option<SecretString>,
        validity_secs: i64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = issued_at
            .checked_add_signed(TimeDelta::seconds(validity_secs))
            .unwrap_or(issued_at);
        Self {
            sid,
            csrf,
            expires_at,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Insert the session id (and CSRF token, when present) as sensitive
    /// headers.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        headers.insert(SID_HEADER, sensitive(&self.sid)?);
        if let Some(csrf) = &self.csrf {
            headers.insert(CSRF_HEADER, sensitive(csrf)?);
        }
        Ok(())
    }
}

fn sensitive(secret: &SecretString) -> Result<HeaderValue, Error> {
    let mut value =
        HeaderValue::from_str(secret.expose_secret()).map_err(|e| Error::Authentication {
            message: format!("invalid session header value: {e}"),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn expires_after_validity() {
        let issued = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let session = Session::new("sid".to_string().into(), None, 300, issued);
        assert!(session.is_valid_at(issued + TimeDelta::seconds(299)));
        assert!(!session.is_valid_at(issued + TimeDelta::seconds(300)));
    }

    #[test]
    fn applies_sid_and_csrf_headers() {
        let issued = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let session = Session::new(
            "abc".to_string().into(),
            Some("xyz".to_string().into()),
            300,
            issued,
        );
        let mut headers = HeaderMap::new();
        session.apply(&mut headers).unwrap();
        assert_eq!(headers.get(SID_HEADER).unwrap(), "abc");
        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "xyz");
        assert!(headers.get(SID_HEADER).unwrap().is_sensitive());
    }
}
