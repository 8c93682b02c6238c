use crate::models::{RideOffer, RideType};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use waypool_core::journey;
use waypool_core::matching::LocationMatcher;

/// Search criteria over the active ride set. Every field is optional;
/// absent fields admit everything. `ride_type: None` means both types,
/// each under its own sub-filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RideQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub passenger_count: Option<u32>,
    pub ride_type: Option<RideType>,
}

/// Composes the independent search predicates into a single admission test
/// and applies it over a candidate list, preserving input order.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    matcher: LocationMatcher,
    cutoff: Duration,
}

impl SearchFilter {
    pub fn new(matcher: LocationMatcher, cutoff_hours: i64) -> Self {
        Self {
            matcher,
            cutoff: Duration::hours(cutoff_hours),
        }
    }

    pub fn apply(
        &self,
        rides: Vec<RideOffer>,
        query: &RideQuery,
        now: DateTime<Utc>,
    ) -> Vec<RideOffer> {
        rides
            .into_iter()
            .filter(|ride| self.admits(ride, query, now))
            .collect()
    }

    /// All predicates AND-ed; the ride-type branch picks which sub-filters
    /// apply. Gender preference is deliberately not a search predicate, it
    /// is enforced at join/accept time.
    pub fn admits(&self, ride: &RideOffer, query: &RideQuery, now: DateTime<Utc>) -> bool {
        if !within_cutoff(ride, now, self.cutoff) {
            return false;
        }

        if let Some(wanted) = query.ride_type {
            if ride.ride_type != wanted {
                return false;
            }
        }

        if let Some(date) = query.travel_date {
            if !departs_on(ride, date) {
                return false;
            }
        }

        match ride.ride_type {
            // A request that already found its driver is no longer open.
            RideType::Requested => {
                if ride.driver_id.is_some() {
                    return false;
                }
            }
            RideType::Offered => {
                if let Some(count) = query.passenger_count {
                    if count > 0 && !has_seats_for(ride, count) {
                        return false;
                    }
                }
            }
        }

        match (trimmed(&query.origin), trimmed(&query.destination)) {
            (Some(origin), Some(destination)) => {
                journey::accommodates(&self.matcher, &ride.route, origin, destination)
            }
            _ => true,
        }
    }
}

fn trimmed(term: &Option<String>) -> Option<&str> {
    term.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// Rides stay searchable through a grace window after departure, so a ride
/// in progress can still pick up late joiners.
pub fn within_cutoff(ride: &RideOffer, now: DateTime<Utc>, window: Duration) -> bool {
    ride.travel_time > now - window
}

pub fn departs_on(ride: &RideOffer, date: NaiveDate) -> bool {
    ride.travel_time.date_naive() == date
}

pub fn has_seats_for(ride: &RideOffer, passenger_count: u32) -> bool {
    ride.remaining_seats() >= passenger_count as i64
}
