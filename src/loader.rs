//! Dataset-backed network loader.
//!
//! Standard tables come from `gtfs-structures`. The pattern, line, and
//! schedule-typicality columns are dataset extensions that library does not
//! expose, so they are read directly from the table files; all of them are
//! optional, and a dataset without them still loads with route-level
//! fallbacks.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use gtfs_structures::{DirectionType, Exception, Gtfs};
use serde::Deserialize;
use tracing::info;

use crate::daytime::DayTime;
use crate::error::Error;
use crate::model::{
    ExceptionType, Network, NetworkLoader, NetworkStopTime, NetworkTrip, Route, RoutePattern,
    Service, ServiceException, Weekdays,
};

pub struct GtfsNetworkLoader;

#[derive(Debug, Deserialize)]
struct TripPatternRow {
    trip_id: String,
    #[serde(default)]
    route_pattern_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteLineRow {
    route_id: String,
    #[serde(default)]
    line_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatternRow {
    route_pattern_id: String,
    #[serde(default)]
    route_pattern_name: String,
    #[serde(default)]
    direction_id: u8,
}

#[derive(Debug, Deserialize)]
struct CalendarAttributeRow {
    service_id: String,
    #[serde(default)]
    service_schedule_typicality: u8,
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, anyhow::Error> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

impl NetworkLoader for GtfsNetworkLoader {
    fn load_network(&self, dir: &Path) -> Result<Network, Error> {
        let wrap = |source: anyhow::Error| Error::NetworkLoad {
            path: dir.to_path_buf(),
            source,
        };

        let gtfs = Gtfs::new(dir.to_string_lossy().as_ref()).map_err(|e| wrap(e.into()))?;

        let trip_patterns: Vec<TripPatternRow> =
            read_rows(&dir.join("trips.txt")).map_err(wrap)?;
        let route_lines: Vec<RouteLineRow> = read_rows(&dir.join("routes.txt")).map_err(wrap)?;
        let patterns: Vec<PatternRow> =
            read_rows(&dir.join("route_patterns.txt")).map_err(wrap)?;
        let calendar_attributes: Vec<CalendarAttributeRow> =
            read_rows(&dir.join("calendar_attributes.txt")).map_err(wrap)?;

        let pattern_by_trip: HashMap<String, String> = trip_patterns
            .into_iter()
            .filter_map(|row| Some((row.trip_id, row.route_pattern_id?)))
            .collect();
        let line_by_route: HashMap<String, String> = route_lines
            .into_iter()
            .filter_map(|row| Some((row.route_id, row.line_id?)))
            .collect();
        let typicality_by_service: HashMap<String, u8> = calendar_attributes
            .into_iter()
            .map(|row| (row.service_id, row.service_schedule_typicality))
            .collect();

        let mut network = Network::default();

        for row in patterns {
            network.route_patterns.insert(
                row.route_pattern_id.clone(),
                RoutePattern {
                    id: row.route_pattern_id,
                    name: row.route_pattern_name,
                    direction: row.direction_id,
                },
            );
        }

        for (id, route) in &gtfs.routes {
            let long_name = route
                .long_name
                .clone()
                .or_else(|| route.short_name.clone())
                .unwrap_or_else(|| id.clone());
            network.routes.insert(
                id.clone(),
                Route {
                    id: id.clone(),
                    long_name,
                    line_id: line_by_route.get(id).cloned().unwrap_or_default(),
                },
            );
        }

        for (id, calendar) in &gtfs.calendar {
            network.services.insert(
                id.clone(),
                Service {
                    id: id.clone(),
                    start_date: calendar.start_date,
                    end_date: calendar.end_date,
                    days: Weekdays {
                        monday: calendar.monday,
                        tuesday: calendar.tuesday,
                        wednesday: calendar.wednesday,
                        thursday: calendar.thursday,
                        friday: calendar.friday,
                        saturday: calendar.saturday,
                        sunday: calendar.sunday,
                    },
                    exceptions: Vec::new(),
                    schedule_typicality: typicality_by_service.get(id).copied().unwrap_or(0),
                },
            );
        }

        for (service_id, dates) in &gtfs.calendar_dates {
            let service = network
                .services
                .entry(service_id.clone())
                .or_insert_with(|| {
                    exception_only_service(
                        service_id,
                        dates.iter().map(|d| d.date),
                        typicality_by_service.get(service_id).copied().unwrap_or(0),
                    )
                });
            for calendar_date in dates {
                service.exceptions.push(ServiceException {
                    date: calendar_date.date,
                    exception_type: match calendar_date.exception_type {
                        Exception::Added => ExceptionType::Added,
                        Exception::Deleted => ExceptionType::Removed,
                    },
                });
            }
            service.exceptions.sort_by_key(|e| e.date);
        }

        for trip in gtfs.trips.values() {
            let stop_times: Vec<NetworkStopTime> = trip
                .stop_times
                .iter()
                .filter_map(|st| {
                    let seconds = st.departure_time.or(st.arrival_time)?;
                    let parent = st
                        .stop
                        .parent_station
                        .as_deref()
                        .and_then(|id| gtfs.stops.get(id));
                    let (station_id, station_name) = match parent {
                        Some(parent) => (
                            parent.id.clone(),
                            parent.name.clone().unwrap_or_else(|| parent.id.clone()),
                        ),
                        None => (
                            st.stop.id.clone(),
                            st.stop.name.clone().unwrap_or_else(|| st.stop.id.clone()),
                        ),
                    };
                    Some(NetworkStopTime {
                        stop_id: st.stop.id.clone(),
                        station_id,
                        station_name,
                        time: DayTime::from_seconds(seconds),
                    })
                })
                .collect();
            network.trips.push(NetworkTrip {
                id: trip.id.clone(),
                route_id: trip.route_id.clone(),
                route_pattern_id: pattern_by_trip
                    .get(&trip.id)
                    .cloned()
                    .unwrap_or_else(|| trip.route_id.clone()),
                service_id: trip.service_id.clone(),
                direction_id: trip.direction_id.as_ref().map(|d| match d {
                    DirectionType::Outbound => 0,
                    DirectionType::Inbound => 1,
                }),
                stop_times,
            });
        }

        info!(
            trips = network.trips.len(),
            routes = network.routes.len(),
            services = network.services.len(),
            "Network loaded"
        );
        Ok(network)
    }
}

fn exception_only_service(
    id: &str,
    dates: impl Iterator<Item = NaiveDate>,
    schedule_typicality: u8,
) -> Service {
    // No weekdays: only ADDED exceptions can activate such a service.
    let mut start = NaiveDate::MAX;
    let mut end = NaiveDate::MIN;
    for date in dates {
        start = start.min(date);
        end = end.max(date);
    }
    Service {
        id: id.to_string(),
        start_date: start,
        end_date: end,
        days: Weekdays::default(),
        exceptions: Vec::new(),
        schedule_typicality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_only_service_spans_its_dates() {
        let dates = [
            NaiveDate::from_ymd_opt(2020, 2, 15).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
        ];
        let service = exception_only_service("EXTRA", dates.into_iter(), 4);
        assert_eq!(service.start_date, NaiveDate::from_ymd_opt(2020, 1, 10).unwrap());
        assert_eq!(service.end_date, NaiveDate::from_ymd_opt(2020, 2, 15).unwrap());
        assert_eq!(service.schedule_typicality, 4);
        // Nothing runs from the base pattern alone.
        assert!(!service.runs_on(NaiveDate::from_ymd_opt(2020, 1, 10).unwrap()));
    }
}
