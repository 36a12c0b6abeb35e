//! Condensed per-feed-version schedule data.
//!
//! A [`FeedSummary`] is the persisted reduction of a full [`Network`]: just
//! the trips of the domain of interest, with everything the reports need
//! and nothing else.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::archive_index::FeedVersion;
use crate::daytime::DayTime;
use crate::error::Error;
use crate::model::{Network, Service};

/// One stop visit within a summarized trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub stop_id: String,
    pub station_id: String,
    pub station_name: String,
    pub time: DayTime,
}

/// One scheduled vehicle run, with its owning service embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSummary {
    pub id: String,
    pub route_id: String,
    pub route_name: String,
    pub route_pattern_id: String,
    pub route_pattern_name: String,
    pub direction: u8,
    pub line_id: String,
    pub service: Arc<Service>,
    /// Ordered by stop sequence; never empty.
    pub stop_times: Vec<StopTime>,
}

impl TripSummary {
    pub fn first_stop(&self) -> &StopTime {
        &self.stop_times[0]
    }

    pub fn last_stop(&self) -> &StopTime {
        &self.stop_times[self.stop_times.len() - 1]
    }
}

/// The derived, persisted condensate of one feed version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSummary {
    pub version: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Ordered by trip id.
    pub trips: Vec<TripSummary>,
}

impl FeedSummary {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Reduces a full network to the trips whose route id matches
    /// `route_prefix`, carrying the feed version's validity window.
    ///
    /// Trips without any timed stop are dropped. Dangling route or service
    /// references are an error: they mean the loaded dataset is not
    /// self-consistent.
    pub fn from_network(
        feed: &FeedVersion,
        network: &Network,
        route_prefix: &str,
    ) -> Result<FeedSummary, Error> {
        let services: BTreeMap<&str, Arc<Service>> = network
            .services
            .iter()
            .map(|(id, service)| (id.as_str(), Arc::new(service.clone())))
            .collect();

        let mut trips = Vec::new();
        for trip in &network.trips {
            if !trip.route_id.starts_with(route_prefix) || trip.stop_times.is_empty() {
                continue;
            }
            let route =
                network
                    .routes
                    .get(&trip.route_id)
                    .ok_or_else(|| Error::InconsistentNetwork {
                        version: feed.version.clone(),
                        reason: format!("trip {} references unknown route {}", trip.id, trip.route_id),
                    })?;
            let service = services.get(trip.service_id.as_str()).cloned().ok_or_else(|| {
                Error::InconsistentNetwork {
                    version: feed.version.clone(),
                    reason: format!("trip {} references unknown service {}", trip.id, trip.service_id),
                }
            })?;
            let (route_pattern_id, route_pattern_name, direction) =
                match network.route_patterns.get(&trip.route_pattern_id) {
                    Some(pattern) => (pattern.id.clone(), pattern.name.clone(), pattern.direction),
                    None => (
                        trip.route_pattern_id.clone(),
                        route.long_name.clone(),
                        trip.direction_id.unwrap_or(0),
                    ),
                };
            trips.push(TripSummary {
                id: trip.id.clone(),
                route_id: route.id.clone(),
                route_name: route.long_name.clone(),
                route_pattern_id,
                route_pattern_name,
                direction,
                line_id: route.line_id.clone(),
                service,
                stop_times: trip
                    .stop_times
                    .iter()
                    .map(|st| StopTime {
                        stop_id: st.stop_id.clone(),
                        station_id: st.station_id.clone(),
                        station_name: st.station_name.clone(),
                        time: st.time,
                    })
                    .collect(),
            });
        }
        trips.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(FeedSummary {
            version: feed.version.clone(),
            start_date: feed.start_date,
            end_date: feed.end_date,
            trips,
        })
    }
}
