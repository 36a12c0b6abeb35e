//! Typed failures for the schedule census pipeline.

use std::path::PathBuf;

use chrono::NaiveDate;

/// Crate-wide error type.
///
/// Cache deserialization failures do not appear here: the summary store
/// recovers from them locally by discarding the entry and rebuilding.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The feed index or an archive could not be retrieved. Fatal.
    #[error("failed to fetch {url}: {source}")]
    NetworkFetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// A required field of the feed index could not be parsed. Fatal: a
    /// silently skipped row would narrow coverage invisibly.
    #[error("malformed feed index row {row}: {reason}")]
    MalformedIndexRow { row: usize, reason: String },

    /// The downloaded archive could not be extracted.
    #[error("failed to extract archive {path}: {source}")]
    ArchiveExtraction {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A feed version was consulted but has no usable extracted data,
    /// typically after a recorded extraction failure.
    #[error("feed version {version} has no usable extracted data")]
    MissingFeedData { version: String },

    /// The network loader collaborator failed on an extracted dataset.
    #[error("failed to load network from {path}: {source}")]
    NetworkLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A loaded network holds a dangling reference (route, service).
    #[error("feed version {version}: {reason}")]
    InconsistentNetwork { version: String, reason: String },

    /// The requested date lies outside every known feed window. Catchable:
    /// distinct from "feed exists, zero trips".
    #[error("no feed version covers {date}")]
    NoActiveFeed { date: NaiveDate },

    /// Aggregation precondition violated.
    #[error("invalid date range: {from} must be before {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
