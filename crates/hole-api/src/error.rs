use thiserror::Error;

/// Top-level error type for the `hole-api` crate.
///
/// Covers every failure mode of a call against the appliance:
/// configuration, credentials, transport, HTTP status, and response shape.
/// Nothing is retried internally; every variant reaches the caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// The requested API version is not one this client speaks.
    #[error("Unsupported API version {0} (expected 5 or 6)")]
    UnsupportedVersion(u8),

    /// A configuration value failed validation.
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Extracting the configuration from a figment provider failed.
    #[error("Configuration loading failed: {0}")]
    Config(Box<figment::Error>),

    // ── Authentication ──────────────────────────────────────────────
    /// The operation needs a token or password and none was configured.
    #[error("{operation} requires an API token or password")]
    MissingCredentials { operation: &'static str },

    /// The appliance rejected the credential, or the session is gone.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// The appliance answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Operation not available on the selected API version.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl Error {
    /// Build a `Deserialization` error from a serde failure and the body
    /// that caused it.
    pub(crate) fn decode(err: &serde_json::Error, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).into_owned();
        Self::Deserialization {
            message: format!("{err} (body preview: {:?})", preview(&body)),
            body,
        }
    }

    /// Returns `true` for errors raised while validating configuration,
    /// before any request is made.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion(_) | Self::InvalidConfig { .. } | Self::Config(_)
        )
    }

    /// Returns `true` if the credential is missing or was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials { .. } | Self::Authentication { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status code, if the appliance answered with an error status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// First 200 characters of a body, for error messages and logs.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn classification() {
        assert!(Error::UnsupportedVersion(4).is_config_error());
        assert!(!Error::UnsupportedVersion(4).is_transient());
        assert!(
            Error::MissingCredentials {
                operation: "enable"
            }
            .is_auth_error()
        );

        let server_error = Error::Http {
            status: 503,
            body: String::new(),
        };
        assert!(server_error.is_transient());
        assert_eq!(server_error.status_code(), Some(503));

        let not_found = Error::Http {
            status: 404,
            body: String::new(),
        };
        assert!(!not_found.is_transient());
    }
}
