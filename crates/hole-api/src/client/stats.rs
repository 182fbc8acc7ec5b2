// Statistics operations
//
// Read-only counters: the daily summary, top domains and clients, upstream
// shares, and component versions.

use tracing::debug;

use super::HoleClient;
use crate::adapter::{Operation, single};
use crate::error::Error;
use crate::models::{ForwardDestination, Summary, TopClient, TopItems, Versions};

impl HoleClient {
    /// Today's query and blocklist counters.
    ///
    /// v5: `GET /{location}/api.php?summaryRaw`
    /// v6: `GET /api/stats/summary`
    pub async fn summary(&self) -> Result<Summary, Error> {
        let bodies = self.fetch(&Operation::Summary).await?;
        let summary = self.adapter.parse_summary(single(&bodies)?)?;
        debug!(
            queries = summary.dns_queries_today,
            blocked = summary.ads_blocked_today,
            "fetched summary"
        );
        Ok(summary)
    }

    /// The `count` most-queried permitted and blocked domains.
    ///
    /// v5: `GET /{location}/api.php?topItems={count}&auth=...`
    /// v6: `GET /api/stats/top_domains?blocked={false,true}&count={count}`
    pub async fn top_items(&self, count: u32) -> Result<TopItems, Error> {
        let bodies = self.fetch(&Operation::TopItems { count }).await?;
        self.adapter.parse_top_items(&bodies)
    }

    /// The `count` clients sending the most queries.
    ///
    /// v5: `GET /{location}/api.php?topClients={count}&auth=...`
    /// v6: `GET /api/stats/top_clients?count={count}`
    pub async fn top_clients(&self, count: u32) -> Result<Vec<TopClient>, Error> {
        let bodies = self.fetch(&Operation::TopClients { count }).await?;
        self.adapter.parse_top_clients(single(&bodies)?)
    }

    /// How queries were answered: blocklist, cache, or each upstream.
    ///
    /// v5: `GET /{location}/api.php?getForwardDestinations&auth=...`
    /// v6: `GET /api/stats/upstreams`
    pub async fn forward_destinations(&self) -> Result<Vec<ForwardDestination>, Error> {
        let bodies = self.fetch(&Operation::ForwardDestinations).await?;
        self.adapter.parse_forward_destinations(single(&bodies)?)
    }

    /// Installed and latest versions of core, web interface, and FTL.
    ///
    /// v5: `GET /{location}/api.php?versions`
    /// v6: `GET /api/info/version`
    pub async fn versions(&self) -> Result<Versions, Error> {
        let bodies = self.fetch(&Operation::Versions).await?;
        self.adapter.parse_versions(single(&bodies)?)
    }
}
