// Print the daily summary and blocking state of an appliance.
//
//   HOLE_HOST=pi.hole HOLE_VERSION=5 HOLE_TOKEN=... cargo run --example summary
//
// Set RUST_LOG=hole_api=debug to see the requests being made.

use figment::Figment;
use figment::providers::Env;
use tracing_subscriber::EnvFilter;

use hole_api::{ClientConfig, Error, HoleClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = ClientConfig::from_figment(&Figment::new().merge(Env::prefixed("HOLE_")))?;
    let client = HoleClient::new(&config)?;

    let versions = client.versions().await?;
    println!(
        "core {}  web {}  ftl {}",
        versions.core.current.as_deref().unwrap_or("?"),
        versions.web.current.as_deref().unwrap_or("?"),
        versions.ftl.current.as_deref().unwrap_or("?"),
    );

    let summary = client.summary().await?;
    println!(
        "{} of {} queries blocked ({:.1}%), {} domains on the blocklist",
        summary.ads_blocked_today,
        summary.dns_queries_today,
        summary.ads_percentage_today,
        summary.domains_being_blocked,
    );

    let status = client.status().await?;
    match status.reenable_at {
        Some(at) => println!("blocking {} until {at}", status.state),
        None => println!("blocking {}", status.state),
    }

    client.logout().await?;
    Ok(())
}
