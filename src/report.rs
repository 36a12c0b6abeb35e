//! CSV report emission. Formatting only; ordering and grouping happen
//! upstream in the aggregation engine.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::aggregate::Aggregation;
use crate::calendar::TripOnDate;
use crate::error::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize)]
struct TripRow<'a> {
    date: String,
    time: String,
    trip_id: &'a str,
    line_id: &'a str,
    route_id: &'a str,
    route_pattern_id: &'a str,
    route_name: &'a str,
    route_pattern_name: &'a str,
    service_id: &'a str,
    service_typicality: u8,
    direction: u8,
    from_station: &'a str,
    to_station: &'a str,
}

impl<'a> TripRow<'a> {
    fn new(occurrence: TripOnDate<'a>) -> Self {
        let trip = occurrence.trip;
        TripRow {
            date: occurrence.date.format(DATE_FORMAT).to_string(),
            time: trip.first_stop().time.to_string(),
            trip_id: &trip.id,
            line_id: &trip.line_id,
            route_id: &trip.route_id,
            route_pattern_id: &trip.route_pattern_id,
            route_name: &trip.route_name,
            route_pattern_name: &trip.route_pattern_name,
            service_id: &trip.service.id,
            service_typicality: trip.service.schedule_typicality,
            direction: trip.direction,
            from_station: &trip.first_stop().station_name,
            to_station: &trip.last_stop().station_name,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    date: String,
    route_id: &'a str,
    trip_count: usize,
}

/// Writes `lines/<route_id>.csv`. Rows arrive ordered by (date, first-stop
/// time) and are written as-is.
pub fn write_route_csv(
    output_root: &Path,
    route_id: &str,
    occurrences: &[TripOnDate<'_>],
) -> Result<(), Error> {
    let dir = output_root.join("lines");
    fs::create_dir_all(&dir)?;
    let mut writer = csv::Writer::from_path(dir.join(format!("{route_id}.csv")))?;
    for occurrence in occurrences {
        writer.serialize(TripRow::new(*occurrence))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `summary.csv`: one row per active route per day.
pub fn write_summary_csv(output_root: &Path, aggregation: &Aggregation<'_>) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(output_root.join("summary.csv"))?;
    for (date, day_summaries) in &aggregation.days {
        let date = date.format(DATE_FORMAT).to_string();
        for day in day_summaries {
            writer.serialize(SummaryRow {
                date: date.clone(),
                route_id: day.route_id,
                trip_count: day.counts.all,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Emits the full report set for one aggregation.
pub fn write_reports(output_root: &Path, aggregation: &Aggregation<'_>) -> Result<(), Error> {
    fs::create_dir_all(output_root)?;
    write_summary_csv(output_root, aggregation)?;
    for (route_id, occurrences) in &aggregation.trips_by_route {
        write_route_csv(output_root, route_id, occurrences)?;
    }
    info!(
        routes = aggregation.trips_by_route.len(),
        days = aggregation.days.len(),
        output = %output_root.display(),
        "Reports written"
    );
    Ok(())
}
