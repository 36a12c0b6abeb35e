//! Run configuration, passed explicitly into the pipeline entry points.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::aggregate::MissingFeedPolicy;

/// Everything one run needs. Built by the CLI, consumed by
/// [`crate::pipeline`].
#[derive(Debug, Clone)]
pub struct Config {
    /// First date of the requested range, inclusive.
    pub from: NaiveDate,
    /// Last date of the requested range, inclusive. Must be after `from`.
    pub to: NaiveDate,
    /// Location of the delimited feed-version index.
    pub archive_url: String,
    /// Root directory for downloaded archives, extracted datasets, and
    /// cached summaries.
    pub data_dir: PathBuf,
    /// Root directory for emitted reports.
    pub output_dir: PathBuf,
    /// Route-id prefix defining the domain of interest.
    pub route_prefix: String,
    /// Line ids to leave out of analysis. Recorded in run logs; resolution
    /// and aggregation do not consult it.
    pub excluded_line_ids: Vec<String>,
    pub missing_feed_policy: MissingFeedPolicy,
}
