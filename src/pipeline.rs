//! Sequential run orchestration: index, summaries, aggregation, reports.

use tracing::info;

use crate::aggregate;
use crate::archive_index;
use crate::cache::SummaryStore;
use crate::config::Config;
use crate::error::Error;
use crate::fetch::HttpClient;
use crate::model::NetworkLoader;
use crate::report;
use crate::summary::FeedSummary;

/// Builds (or loads) the summary for every feed version in the configured
/// range, one at a time in index order.
pub async fn load_feeds<C: HttpClient, L: NetworkLoader>(
    config: &Config,
    client: &C,
    loader: &L,
) -> Result<Vec<FeedSummary>, Error> {
    let versions =
        archive_index::list_versions(client, &config.archive_url, config.from, config.to).await?;
    let store = SummaryStore::new(&config.data_dir);
    let mut feeds = Vec::with_capacity(versions.len());
    for version in &versions {
        feeds.push(
            store
                .get_or_build(version, client, loader, &config.route_prefix)
                .await?,
        );
    }
    Ok(feeds)
}

/// Full pipeline: resolve feeds, aggregate the date range, emit reports.
pub async fn run_report<C: HttpClient, L: NetworkLoader>(
    config: &Config,
    client: &C,
    loader: &L,
) -> Result<(), Error> {
    info!(
        from = %config.from,
        to = %config.to,
        route_prefix = %config.route_prefix,
        excluded_lines = ?config.excluded_line_ids,
        "Starting report run"
    );
    let feeds = load_feeds(config, client, loader).await?;
    let aggregation = aggregate::aggregate(
        config.from,
        config.to,
        &feeds,
        config.missing_feed_policy,
    )?;
    report::write_reports(&config.output_dir, &aggregation)?;
    Ok(())
}

/// Acquires and summarizes every feed version in range without reporting.
pub async fn run_prefetch<C: HttpClient, L: NetworkLoader>(
    config: &Config,
    client: &C,
    loader: &L,
) -> Result<(), Error> {
    let feeds = load_feeds(config, client, loader).await?;
    info!(feeds = feeds.len(), "Prefetch complete");
    Ok(())
}
