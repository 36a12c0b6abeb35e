//! Persistent per-feed-version summary store.
//!
//! Layout under the store root, one directory per feed version keyed by
//! its start date:
//!
//! ```text
//! <root>/<YYYYMMDD>/data.zip         downloaded archive
//! <root>/<YYYYMMDD>/feed/            extracted dataset
//! <root>/<YYYYMMDD>/summary.json.gz  cached summary
//! ```
//!
//! Every acquisition step is existence-guarded, so repeated runs are
//! idempotent. Cached summaries are never auto-invalidated. There is no
//! locking: run at most one process at a time per store root.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{info, warn};

use crate::archive_index::FeedVersion;
use crate::error::Error;
use crate::fetch::{self, HttpClient};
use crate::model::NetworkLoader;
use crate::summary::FeedSummary;

pub struct SummaryStore {
    root: PathBuf,
}

impl SummaryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn feed_dir(&self, feed: &FeedVersion) -> PathBuf {
        self.root.join(feed.start_date.format("%Y%m%d").to_string())
    }

    pub fn archive_path(&self, feed: &FeedVersion) -> PathBuf {
        self.feed_dir(feed).join("data.zip")
    }

    pub fn extract_dir(&self, feed: &FeedVersion) -> PathBuf {
        self.feed_dir(feed).join("feed")
    }

    pub fn summary_path(&self, feed: &FeedVersion) -> PathBuf {
        self.feed_dir(feed).join("summary.json.gz")
    }

    /// Returns the summary for `feed`, building and persisting it first if
    /// no usable cached copy exists.
    ///
    /// An unreadable cached summary is discarded and rebuilt from source.
    /// A failed extraction is recorded and surfaces as
    /// [`Error::MissingFeedData`] once the dataset is actually needed.
    pub async fn get_or_build<C, L>(
        &self,
        feed: &FeedVersion,
        client: &C,
        loader: &L,
        route_prefix: &str,
    ) -> Result<FeedSummary, Error>
    where
        C: HttpClient,
        L: NetworkLoader + ?Sized,
    {
        let summary_path = self.summary_path(feed);
        if summary_path.exists() {
            match read_summary(&summary_path) {
                Ok(summary) => return Ok(summary),
                Err(e) => warn!(
                    path = %summary_path.display(),
                    error = %e,
                    "Discarding unreadable cached summary"
                ),
            }
        }

        self.ensure_archive(feed, client).await?;
        if let Err(e) = self.ensure_extracted(feed) {
            warn!(version = %feed.version, error = %e, "Archive extraction failed");
        }
        let extract_dir = self.extract_dir(feed);
        if !extract_dir.exists() {
            return Err(Error::MissingFeedData {
                version: feed.version.clone(),
            });
        }

        info!(version = %feed.version, "Building summary from dataset");
        let network = loader.load_network(&extract_dir)?;
        let summary = FeedSummary::from_network(feed, &network, route_prefix)?;
        write_summary(&summary_path, &summary)?;
        info!(version = %feed.version, trips = summary.trips.len(), "Summary cached");
        Ok(summary)
    }

    async fn ensure_archive<C: HttpClient>(
        &self,
        feed: &FeedVersion,
        client: &C,
    ) -> Result<(), Error> {
        let target = self.archive_path(feed);
        if target.exists() {
            return Ok(());
        }
        info!(version = %feed.version, url = %feed.url, "Downloading archive");
        fetch::download_to_file(client, &feed.url, &target).await
    }

    fn ensure_extracted(&self, feed: &FeedVersion) -> Result<(), Error> {
        let target = self.extract_dir(feed);
        if target.exists() {
            return Ok(());
        }
        let archive_path = self.archive_path(feed);
        info!(version = %feed.version, "Extracting archive");
        let file = File::open(&archive_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|source| Error::ArchiveExtraction {
            path: archive_path.clone(),
            source,
        })?;
        archive.extract(&target).map_err(|source| {
            // Drop any partially extracted tree so later runs retry cleanly.
            let _ = fs::remove_dir_all(&target);
            Error::ArchiveExtraction {
                path: archive_path.clone(),
                source,
            }
        })
    }
}

fn read_summary(path: &Path) -> Result<FeedSummary, anyhow::Error> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(GzDecoder::new(file))?)
}

fn write_summary(path: &Path, summary: &FeedSummary) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    serde_json::to_writer(&mut encoder, summary)?;
    encoder.finish()?;
    Ok(())
}
