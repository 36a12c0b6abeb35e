//! Resolves which feed governs a date and which trips run on it.

use chrono::NaiveDate;

use crate::error::Error;
use crate::summary::{FeedSummary, TripSummary};

/// A trip paired with a concrete date on which it runs. Ephemeral: produced
/// and consumed within one aggregation run, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct TripOnDate<'a> {
    pub trip: &'a TripSummary,
    pub date: NaiveDate,
}

/// Selects the feed governing `date`.
///
/// `feeds` must be ordered ascending by start date. Windows may overlap;
/// the feed with the most recent start date whose window contains the date
/// wins. A date outside every window is a [`Error::NoActiveFeed`], never an
/// empty result.
pub fn feed_for_date(date: NaiveDate, feeds: &[FeedSummary]) -> Result<&FeedSummary, Error> {
    feeds
        .iter()
        .rev()
        .find(|feed| feed.covers(date))
        .ok_or(Error::NoActiveFeed { date })
}

/// All trips of the governing feed whose service runs on `date`.
pub fn trips_on_date(date: NaiveDate, feeds: &[FeedSummary]) -> Result<Vec<TripOnDate<'_>>, Error> {
    let feed = feed_for_date(date, feeds)?;
    Ok(feed
        .trips
        .iter()
        .filter(|trip| trip.service.runs_on(date))
        .map(|trip| TripOnDate { trip, date })
        .collect())
}
