// Blocking control
//
// Read and toggle DNS blocking. Enable and disable require a credential and
// return the state the appliance reports right after the change.

use std::time::Duration;

use chrono::Utc;
use tracing::info;

use super::HoleClient;
use crate::adapter::{Operation, single};
use crate::error::Error;
use crate::models::BlockingStatus;

impl HoleClient {
    /// Current blocking state and any scheduled re-enable.
    ///
    /// v5: `GET /{location}/api.php?status&auth=...`
    /// v6: `GET /api/dns/blocking`
    pub async fn status(&self) -> Result<BlockingStatus, Error> {
        self.blocking_call(Operation::Status).await
    }

    /// Turn blocking on.
    ///
    /// v5: `GET /{location}/api.php?enable&auth=...`
    /// v6: `POST /api/dns/blocking` with `{"blocking": true, "timer": null}`
    pub async fn enable(&self) -> Result<BlockingStatus, Error> {
        let status = self.blocking_call(Operation::Enable).await?;
        info!(state = %status.state, "blocking enabled");
        Ok(status)
    }

    /// Turn blocking off, for `duration` or until re-enabled when `None`.
    ///
    /// Durations are rounded up to whole seconds.
    ///
    /// v5: `GET /{location}/api.php?disable={secs}&auth=...`
    /// v6: `POST /api/dns/blocking` with `{"blocking": false, "timer": secs}`
    pub async fn disable(&self, duration: Option<Duration>) -> Result<BlockingStatus, Error> {
        let status = self.blocking_call(Operation::Disable { duration }).await?;
        match duration {
            Some(d) => info!(state = %status.state, seconds = d.as_secs(), "blocking disabled"),
            None => info!(state = %status.state, "blocking disabled until re-enabled"),
        }
        Ok(status)
    }

    async fn blocking_call(&self, op: Operation) -> Result<BlockingStatus, Error> {
        let bodies = self.fetch(&op).await?;
        self.adapter.parse_status(single(&bodies)?, Utc::now())
    }
}
