// ── Client connection configuration ──
//
// Describes *how* to reach one appliance. The library never reads files or
// the environment on its own: callers build a `ClientConfig` directly or hand
// in a `Figment` assembled from whatever providers they choose.

use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::Error;
use crate::transport::{TlsMode, TransportConfig};
use crate::version::{ApiVersion, Protocol};

/// Connection settings for a single appliance.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Hostname or IP address, without scheme or port.
    pub host: String,

    /// Port; defaults to 80 for http and 443 for https.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub protocol: Protocol,

    /// Web interface location for the v5 `api.php` endpoint.
    #[serde(default = "default_location")]
    pub location: String,

    /// API major version, 5 or 6. Validated when the client is built.
    #[serde(default = "default_version")]
    pub version: u8,

    /// Verify the appliance's TLS certificate. Ignored for plain http.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Extra CA certificate (PEM) to trust.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// v5 API token or v6 password.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
}

fn default_location() -> String {
    "admin".into()
}
fn default_version() -> u8 {
    6
}
fn default_verify_tls() -> bool {
    true
}
fn default_timeout() -> u64 {
    5
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            protocol: Protocol::default(),
            location: default_location(),
            version: default_version(),
            verify_tls: default_verify_tls(),
            ca_cert: None,
            timeout_secs: default_timeout(),
            token: None,
        }
    }

    /// Extract a config from a caller-assembled figment.
    ///
    /// ```no_run
    /// use figment::{Figment, providers::{Env, Format, Toml}};
    /// # fn main() -> Result<(), hole_api::Error> {
    /// let figment = Figment::new()
    ///     .merge(Toml::string("host = \"pi.hole\"\nversion = 5"))
    ///     .merge(Env::prefixed("MYAPP_HOLE_"));
    /// let config = hole_api::ClientConfig::from_figment(&figment)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_figment(figment: &Figment) -> Result<Self, Error> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Check every field and return the selected API version.
    pub fn validate(&self) -> Result<ApiVersion, Error> {
        let version = ApiVersion::try_from(self.version)?;

        let host = self.host.trim();
        if host.is_empty() {
            return Err(Error::InvalidConfig {
                field: "host",
                reason: "must not be empty".into(),
            });
        }
        if host.contains("://") || host.contains('/') {
            return Err(Error::InvalidConfig {
                field: "host",
                reason: format!("expected a bare hostname, got {host:?}"),
            });
        }
        if self.port == Some(0) {
            return Err(Error::InvalidConfig {
                field: "port",
                reason: "must be non-zero".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig {
                field: "timeout_secs",
                reason: "must be at least one second".into(),
            });
        }

        Ok(version)
    }

    /// The effective port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// `location` with surrounding slashes removed.
    pub fn location(&self) -> &str {
        self.location.trim_matches('/')
    }

    /// Appliance root URL, e.g. `http://pi.hole` or `https://10.0.0.2:8443`.
    ///
    /// The port is left out when it matches the protocol default.
    pub fn base_url(&self) -> Result<Url, Error> {
        let scheme = self.protocol.scheme();
        let host = self.host.trim();
        // IPv6 literals need brackets in a URL.
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let port = self.port();
        let raw = if port == self.protocol.default_port() {
            format!("{scheme}://{host}/")
        } else {
            format!("{scheme}://{host}:{port}/")
        };
        Ok(Url::parse(&raw)?)
    }

    /// Transport settings derived from the TLS and timeout fields.
    pub fn transport(&self) -> TransportConfig {
        let tls = match (self.protocol, &self.ca_cert) {
            (Protocol::Https, _) if !self.verify_tls => TlsMode::DangerAcceptInvalid,
            (Protocol::Https, Some(path)) => TlsMode::CustomCa(path.clone()),
            (Protocol::Http, _) | (Protocol::Https, None) => TlsMode::System,
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
