//! CLI entry point for the schedule census tool.
//!
//! Provides subcommands for running the full report pipeline over a date
//! range, listing available feed versions, and prefetching feed data into
//! the local cache.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gtfs_census::aggregate::MissingFeedPolicy;
use gtfs_census::archive_index;
use gtfs_census::config::Config;
use gtfs_census::fetch::BasicClient;
use gtfs_census::loader::GtfsNetworkLoader;
use gtfs_census::pipeline;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_ARCHIVE_URL: &str = "https://cdn.mbta.com/archive/archived_feeds.txt";

#[derive(Parser)]
#[command(name = "gtfs_census")]
#[command(about = "Reports which scheduled transit trips ran on each day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build per-route and per-day reports for a date range
    Report {
        /// First date of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last date of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Directory to write reports into
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Directory holding downloaded archives and cached summaries
        #[arg(long, default_value = "archives")]
        data_dir: PathBuf,

        /// Location of the feed-version index
        #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
        archive_url: String,

        /// Route-id prefix to keep when summarizing feeds
        #[arg(long, default_value = "CR-")]
        route_prefix: String,

        /// Line id to leave out of analysis (repeatable)
        #[arg(long = "exclude-line", value_name = "LINE_ID")]
        excluded_line_ids: Vec<String>,

        /// Skip dates no feed covers instead of aborting
        #[arg(long, default_value_t = false)]
        skip_uncovered_dates: bool,
    },
    /// List feed versions available for a date range
    ListVersions {
        /// First start date to include, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last start date to include, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Location of the feed-version index
        #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
        archive_url: String,
    },
    /// Download, extract, and summarize feeds without reporting
    Prefetch {
        /// First start date to include, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last start date to include, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Directory holding downloaded archives and cached summaries
        #[arg(long, default_value = "archives")]
        data_dir: PathBuf,

        /// Location of the feed-version index
        #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
        archive_url: String,

        /// Route-id prefix to keep when summarizing feeds
        #[arg(long, default_value = "CR-")]
        route_prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_census.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_census.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            from,
            to,
            output_dir,
            data_dir,
            archive_url,
            route_prefix,
            excluded_line_ids,
            skip_uncovered_dates,
        } => {
            let config = Config {
                from,
                to,
                archive_url,
                data_dir,
                output_dir,
                route_prefix,
                excluded_line_ids,
                missing_feed_policy: if skip_uncovered_dates {
                    MissingFeedPolicy::Skip
                } else {
                    MissingFeedPolicy::Abort
                },
            };
            pipeline::run_report(&config, &BasicClient::new(), &GtfsNetworkLoader).await?;
        }
        Commands::ListVersions {
            from,
            to,
            archive_url,
        } => {
            let versions =
                archive_index::list_versions(&BasicClient::new(), &archive_url, from, to).await?;
            for version in &versions {
                info!(
                    version = %version.version,
                    start = %version.start_date,
                    end = %version.end_date,
                    url = %version.url,
                    "Feed version"
                );
            }
            info!(total = versions.len(), "Feed versions in range");
        }
        Commands::Prefetch {
            from,
            to,
            data_dir,
            archive_url,
            route_prefix,
        } => {
            let config = Config {
                from,
                to,
                archive_url,
                data_dir,
                output_dir: PathBuf::from("output"),
                route_prefix,
                excluded_line_ids: Vec::new(),
                missing_feed_policy: MissingFeedPolicy::Abort,
            };
            pipeline::run_prefetch(&config, &BasicClient::new(), &GtfsNetworkLoader).await?;
        }
    }

    Ok(())
}
