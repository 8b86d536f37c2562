use anyhow::Result;
use counsel_core::config::Config;
use counsel_scrape::{expertise, records, DirectoryClient, ExpertiseChecker};
use tracing::{info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counsel_scrape=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    info!(
        query = %config.directory_query,
        location = %config.directory_location,
        "starting directory scrape"
    );

    let client = DirectoryClient::new(&config.directory_base_url);
    let listings = client.scrape_listings(
        &config.directory_query,
        &config.directory_location,
        &config.directory_practice_slug,
        &config.directory_location_slug,
        config.scrape_pages,
    );

    if listings.is_empty() {
        warn!("scraping finished with no data");
        return Ok(());
    }

    records::write_listings(&config.listings_csv, &listings)?;

    // Snippet-level preview before the paced profile checks
    let quick = expertise::quick_filter(&listings);
    info!(
        count = quick.len(),
        "listings mention EB-1 terms in their snippet"
    );

    info!(total = listings.len(), "starting detailed EB-1 expertise check");
    let checker = ExpertiseChecker::new();
    let found = expertise::run_filter(
        &checker,
        &listings,
        config.scrape_max_matches,
        &config.expertise_csv,
    )?;

    if found > 0 {
        info!(
            found,
            output = %config.expertise_csv,
            "EB-1 expertise check complete"
        );
    }

    Ok(())
}
