//! Drives the date loop and folds resolved trips into report-ready shapes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::calendar::{self, TripOnDate};
use crate::error::Error;
use crate::summary::{FeedSummary, TripSummary};

/// What to do when a date inside the range is covered by no feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingFeedPolicy {
    /// Abort the whole aggregation, naming the offending date.
    #[default]
    Abort,
    /// Log the date and continue. Opt-in: skipped dates leave gaps in the
    /// output.
    Skip,
}

/// Trip counts per day-part bucket for one route on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayPartCounts {
    pub all: usize,
    pub early_am: usize,
    pub peak_am: usize,
    pub midday: usize,
    pub evening_pm: usize,
    pub late_pm: usize,
}

impl DayPartCounts {
    /// Early and peak AM classify on the last stop, midday on either end
    /// (counting each trip at most once), evening and late PM on the first
    /// stop only.
    fn from_trips(trips: &[&TripSummary]) -> Self {
        let mut counts = DayPartCounts {
            all: trips.len(),
            ..DayPartCounts::default()
        };
        for trip in trips {
            let first = trip.first_stop().time;
            let last = trip.last_stop().time;
            if last.is_early_am() {
                counts.early_am += 1;
            }
            if last.is_peak_am() {
                counts.peak_am += 1;
            }
            if first.is_midday() || last.is_midday() {
                counts.midday += 1;
            }
            if first.is_evening_pm() {
                counts.evening_pm += 1;
            }
            if first.is_late_pm() {
                counts.late_pm += 1;
            }
        }
        counts
    }
}

/// All trips one route ran on one day, with derived bucket counts.
#[derive(Debug, Clone)]
pub struct DaySummary<'a> {
    pub line_id: &'a str,
    pub route_id: &'a str,
    pub date: NaiveDate,
    /// Ordered ascending by first-stop time.
    pub trips: Vec<&'a TripSummary>,
    pub counts: DayPartCounts,
}

impl<'a> DaySummary<'a> {
    /// `trips` must be non-empty and ordered ascending by first-stop time.
    fn new(date: NaiveDate, route_id: &'a str, trips: Vec<&'a TripSummary>) -> Self {
        let line_id = trips[0].line_id.as_str();
        let counts = DayPartCounts::from_trips(&trips);
        DaySummary {
            line_id,
            route_id,
            date,
            trips,
            counts,
        }
    }
}

/// Output of [`aggregate`].
#[derive(Debug, Default)]
pub struct Aggregation<'a> {
    /// Route id to every occurrence across the whole range, date-major and
    /// time-ordered within each date.
    pub trips_by_route: BTreeMap<String, Vec<TripOnDate<'a>>>,
    /// Date to the summaries of the routes active that day.
    pub days: BTreeMap<NaiveDate, Vec<DaySummary<'a>>>,
}

fn date_range(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(from), |d| d.succ_opt()).take_while(move |d| *d <= to)
}

/// Resolves every date in `[from, to]` inclusive and groups the results.
///
/// Requires `from < to`. With [`MissingFeedPolicy::Abort`] an uncovered
/// date fails the whole aggregation; [`MissingFeedPolicy::Skip`] must be
/// chosen explicitly.
pub fn aggregate<'a>(
    from: NaiveDate,
    to: NaiveDate,
    feeds: &'a [FeedSummary],
    policy: MissingFeedPolicy,
) -> Result<Aggregation<'a>, Error> {
    if from >= to {
        return Err(Error::InvalidDateRange { from, to });
    }

    let mut aggregation = Aggregation::default();
    for date in date_range(from, to) {
        let mut on_date = match calendar::trips_on_date(date, feeds) {
            Ok(trips) => trips,
            Err(Error::NoActiveFeed { date }) if policy == MissingFeedPolicy::Skip => {
                warn!(%date, "No feed covers date, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        on_date.sort_by_key(|t| t.trip.first_stop().time);

        let mut by_route: BTreeMap<&str, Vec<TripOnDate<'a>>> = BTreeMap::new();
        for occurrence in on_date {
            by_route
                .entry(occurrence.trip.route_id.as_str())
                .or_default()
                .push(occurrence);
        }
        if by_route.is_empty() {
            continue;
        }

        let day_summaries = aggregation.days.entry(date).or_default();
        for (route_id, occurrences) in by_route {
            aggregation
                .trips_by_route
                .entry(route_id.to_string())
                .or_default()
                .extend(occurrences.iter().copied());
            let trips = occurrences.iter().map(|o| o.trip).collect();
            day_summaries.push(DaySummary::new(date, route_id, trips));
        }
    }
    Ok(aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daytime::DayTime;
    use crate::model::{Service, Weekdays};
    use crate::summary::StopTime;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn every_day() -> Weekdays {
        Weekdays {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: true,
            sunday: true,
        }
    }

    fn stop(hour: u32, minute: u32) -> StopTime {
        StopTime {
            stop_id: "s".to_string(),
            station_id: "place-s".to_string(),
            station_name: "S".to_string(),
            time: DayTime::from_hms(hour, minute, 0),
        }
    }

    fn trip(id: &str, route_id: &str, stops: Vec<StopTime>) -> TripSummary {
        let service = Service {
            id: "DAILY".to_string(),
            start_date: date(2020, 1, 1),
            end_date: date(2020, 12, 31),
            days: every_day(),
            exceptions: Vec::new(),
            schedule_typicality: 1,
        };
        TripSummary {
            id: id.to_string(),
            route_id: route_id.to_string(),
            route_name: route_id.to_string(),
            route_pattern_id: format!("{route_id}-1"),
            route_pattern_name: route_id.to_string(),
            direction: 0,
            line_id: format!("line-{route_id}"),
            service: Arc::new(service),
            stop_times: stops,
        }
    }

    fn feed(trips: Vec<TripSummary>) -> FeedSummary {
        FeedSummary {
            version: "v1".to_string(),
            start_date: date(2020, 1, 1),
            end_date: date(2020, 12, 31),
            trips,
        }
    }

    #[test]
    fn test_rejects_inverted_range() {
        let feeds = [feed(Vec::new())];
        assert!(matches!(
            aggregate(date(2020, 2, 1), date(2020, 2, 1), &feeds, MissingFeedPolicy::Abort),
            Err(Error::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_orders_trips_within_date() {
        let feeds = [feed(vec![
            trip("later", "CR-A", vec![stop(8, 0), stop(9, 0)]),
            trip("earlier", "CR-A", vec![stop(7, 30), stop(8, 30)]),
        ])];
        let aggregation =
            aggregate(date(2020, 2, 1), date(2020, 2, 2), &feeds, MissingFeedPolicy::Abort).unwrap();
        let occurrences = &aggregation.trips_by_route["CR-A"];
        // Two dates, two trips each, earlier trip first within each date.
        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences[0].trip.id, "earlier");
        assert_eq!(occurrences[1].trip.id, "later");
        assert_eq!(occurrences[0].date, date(2020, 2, 1));
        assert_eq!(occurrences[2].date, date(2020, 2, 2));
        assert_eq!(occurrences[2].trip.id, "earlier");
    }

    #[test]
    fn test_groups_by_route_and_summarizes_days() {
        let feeds = [feed(vec![
            trip("a1", "CR-A", vec![stop(7, 30), stop(8, 30)]),
            trip("b1", "CR-B", vec![stop(11, 0), stop(11, 30)]),
        ])];
        let aggregation =
            aggregate(date(2020, 2, 1), date(2020, 2, 2), &feeds, MissingFeedPolicy::Abort).unwrap();
        assert_eq!(aggregation.trips_by_route.len(), 2);
        let day = &aggregation.days[&date(2020, 2, 1)];
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].route_id, "CR-A");
        assert_eq!(day[0].line_id, "line-CR-A");
        assert_eq!(day[0].counts.all, 1);
        assert_eq!(day[1].route_id, "CR-B");
    }

    #[test]
    fn test_midday_trip_counted_once() {
        // Both ends of the trip fall inside the midday window.
        let feeds = [feed(vec![trip(
            "mid",
            "CR-A",
            vec![stop(11, 0), stop(11, 30)],
        )])];
        let aggregation =
            aggregate(date(2020, 2, 1), date(2020, 2, 2), &feeds, MissingFeedPolicy::Abort).unwrap();
        let day = &aggregation.days[&date(2020, 2, 1)];
        assert_eq!(day[0].counts.midday, 1);
    }

    #[test]
    fn test_bucket_asymmetry() {
        let feeds = [feed(vec![
            // Ends at 09:30: peak AM by last stop, not early AM.
            trip("am", "CR-A", vec![stop(6, 30), stop(9, 30)]),
            // Starts at 19:30: evening PM by first stop.
            trip("pm", "CR-A", vec![stop(19, 30), stop(20, 30)]),
            // Starts at 22:10: late PM by first stop.
            trip("late", "CR-A", vec![stop(22, 10), stop(23, 10)]),
        ])];
        let aggregation =
            aggregate(date(2020, 2, 1), date(2020, 2, 2), &feeds, MissingFeedPolicy::Abort).unwrap();
        let counts = aggregation.days[&date(2020, 2, 1)][0].counts;
        assert_eq!(counts.all, 3);
        assert_eq!(counts.early_am, 0);
        assert_eq!(counts.peak_am, 1);
        assert_eq!(counts.evening_pm, 1);
        assert_eq!(counts.late_pm, 1);
    }

    #[test]
    fn test_abort_policy_surfaces_uncovered_date() {
        let mut covering = feed(vec![trip("a1", "CR-A", vec![stop(8, 0), stop(9, 0)])]);
        covering.end_date = date(2020, 2, 1);
        let feeds = [covering];
        match aggregate(date(2020, 2, 1), date(2020, 2, 3), &feeds, MissingFeedPolicy::Abort) {
            Err(Error::NoActiveFeed { date: d }) => assert_eq!(d, date(2020, 2, 2)),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_skip_policy_keeps_covered_dates() {
        let mut covering = feed(vec![trip("a1", "CR-A", vec![stop(8, 0), stop(9, 0)])]);
        covering.end_date = date(2020, 2, 1);
        let feeds = [covering];
        let aggregation =
            aggregate(date(2020, 2, 1), date(2020, 2, 3), &feeds, MissingFeedPolicy::Skip).unwrap();
        assert_eq!(aggregation.days.len(), 1);
        assert!(aggregation.days.contains_key(&date(2020, 2, 1)));
        assert_eq!(aggregation.trips_by_route["CR-A"].len(), 1);
    }
}
