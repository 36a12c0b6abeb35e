//! Core schedule entities and the network-loader seam.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::daytime::DayTime;
use crate::error::Error;

/// The days of the week a service's base pattern covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weekdays {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl Weekdays {
    pub fn contains(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionType {
    Added,
    Removed,
}

/// A per-date overlay on a service's weekly pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceException {
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
}

/// A named service calendar: weekly pattern plus per-date exceptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Weekdays,
    /// Ordered ascending by date.
    pub exceptions: Vec<ServiceException>,
    pub schedule_typicality: u8,
}

impl Service {
    /// An ADDED exception activates the service regardless of range and
    /// weekday; a REMOVED exception only suppresses an otherwise scheduled
    /// day.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        let mut removed = false;
        for exception in &self.exceptions {
            if exception.date == date {
                match exception.exception_type {
                    ExceptionType::Added => return true,
                    ExceptionType::Removed => removed = true,
                }
            }
        }
        !removed
            && self.start_date <= date
            && date <= self.end_date
            && self.days.contains(date.weekday())
    }
}

/// One stop visit as produced by the network loader, with the parent
/// station already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStopTime {
    pub stop_id: String,
    pub station_id: String,
    pub station_name: String,
    pub time: DayTime,
}

/// One scheduled vehicle run as produced by the network loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTrip {
    pub id: String,
    pub route_id: String,
    pub route_pattern_id: String,
    pub service_id: String,
    /// Fallback direction when no route pattern is known for the trip.
    pub direction_id: Option<u8>,
    pub stop_times: Vec<NetworkStopTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub long_name: String,
    pub line_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub id: String,
    pub name: String,
    pub direction: u8,
}

/// Typed view of one extracted schedule dataset.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub routes: BTreeMap<String, Route>,
    pub route_patterns: BTreeMap<String, RoutePattern>,
    pub services: BTreeMap<String, Service>,
    pub trips: Vec<NetworkTrip>,
}

/// Parses an extracted dataset directory into a typed [`Network`].
pub trait NetworkLoader: Send + Sync {
    fn load_network(&self, dir: &Path) -> Result<Network, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekdays(monday: bool) -> Weekdays {
        Weekdays {
            monday,
            ..Weekdays::default()
        }
    }

    fn service(days: Weekdays, exceptions: Vec<ServiceException>) -> Service {
        Service {
            id: "TEST".to_string(),
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2022, 1, 31).unwrap(),
            days,
            exceptions,
            schedule_typicality: 1,
        }
    }

    #[test]
    fn test_runs_on_base_pattern() {
        let service = service(weekdays(true), Vec::new());
        // 2022-01-10 is a Monday, 2022-01-11 a Tuesday.
        assert!(service.runs_on(NaiveDate::from_ymd_opt(2022, 1, 10).unwrap()));
        assert!(!service.runs_on(NaiveDate::from_ymd_opt(2022, 1, 11).unwrap()));
        // Mondays outside the service range do not run.
        assert!(!service.runs_on(NaiveDate::from_ymd_opt(2022, 2, 7).unwrap()));
    }

    #[test]
    fn test_added_exception_overrides_everything() {
        // A Tuesday outside the service range, added explicitly.
        let added = NaiveDate::from_ymd_opt(2022, 2, 15).unwrap();
        let service = service(
            weekdays(true),
            vec![ServiceException {
                date: added,
                exception_type: ExceptionType::Added,
            }],
        );
        assert!(service.runs_on(added));
    }

    #[test]
    fn test_removed_exception_suppresses_scheduled_day() {
        let monday = NaiveDate::from_ymd_opt(2022, 1, 10).unwrap();
        let service = service(
            weekdays(true),
            vec![ServiceException {
                date: monday,
                exception_type: ExceptionType::Removed,
            }],
        );
        assert!(!service.runs_on(monday));
        // Other Mondays are unaffected.
        assert!(service.runs_on(NaiveDate::from_ymd_opt(2022, 1, 17).unwrap()));
    }

    #[test]
    fn test_added_wins_over_removed_on_same_date() {
        let monday = NaiveDate::from_ymd_opt(2022, 1, 10).unwrap();
        let service = service(
            weekdays(true),
            vec![
                ServiceException {
                    date: monday,
                    exception_type: ExceptionType::Removed,
                },
                ServiceException {
                    date: monday,
                    exception_type: ExceptionType::Added,
                },
            ],
        );
        assert!(service.runs_on(monday));
    }
}
