//! Async Rust client for the Pi-hole management API (v5 + v6).
//!
//! Two incompatible API generations are supported behind one façade:
//!
//! - **v5**: a single PHP endpoint (`/admin/api.php`) where the operation is
//!   picked by query parameter and the API token rides along as `auth`.
//! - **v6**: REST endpoints under `/api/` with password-based sessions.
//!
//! The version is fixed in [`ClientConfig`]; an [`Adapter`] translates each
//! operation into that version's request and maps the response into the
//! canonical [`Summary`], [`BlockingStatus`], [`TopItems`], ... types.
//!
//! ```no_run
//! use hole_api::{ClientConfig, HoleClient};
//!
//! # async fn run() -> Result<(), hole_api::Error> {
//! let config = ClientConfig::new("pi.hole").with_version(5).with_token("0123abcd");
//! let client = HoleClient::new(&config)?;
//! let summary = client.summary().await?;
//! println!("{} of {} queries blocked", summary.ads_blocked_today, summary.dns_queries_today);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod transport;
pub mod version;

mod session;

pub use adapter::{Adapter, CredentialPlacement, Operation, RequestSpec, V5Adapter, V6Adapter};
pub use client::HoleClient;
pub use config::ClientConfig;
pub use error::Error;
pub use models::{
    BlockingState, BlockingStatus, ComponentVersion, DomainCount, ForwardDestination, Summary,
    TopClient, TopItems, Versions,
};
pub use transport::{TlsMode, TransportConfig};
pub use version::{ApiVersion, Protocol};
