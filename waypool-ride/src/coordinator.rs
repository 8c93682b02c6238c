use crate::lifecycle;
use crate::models::{GenderPreference, Participation, RideOffer, RideType};
use crate::store::{RideStore, StoreError, VersionedRide};
use crate::{RideError, RideResult};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use waypool_core::identity::TravelerDirectory;
use waypool_core::journey;
use waypool_core::maps::{DirectionsProvider, Geocoder, TravelInfo};
use waypool_core::matching::LocationMatcher;
use waypool_core::route::{Route, RoutePoint};
use waypool_shared::{Gender, Traveler};

fn default_capacity() -> u32 {
    1
}

fn default_preference() -> GenderPreference {
    GenderPreference::Any
}

/// Caller-supplied shape of a new ride, before route resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct RideDraft {
    pub origin: RoutePoint,
    #[serde(default)]
    pub stops: Vec<RoutePoint>,
    pub destination: RoutePoint,
    pub travel_time: chrono::DateTime<chrono::Utc>,
    pub vehicle_model: Option<String>,
    #[serde(default = "default_capacity")]
    pub vehicle_capacity: u32,
    #[serde(default = "default_preference")]
    pub gender_preference: GenderPreference,
    pub price: Decimal,
    pub driver_note: Option<String>,
}

/// Validates and commits every ride mutation: create, join, accept, delete.
///
/// Join and accept are check-then-commit cycles: the ride is loaded at a
/// version, validated, and the write is committed against that same
/// version. A concurrent writer invalidates the commit, and the whole cycle
/// retries a bounded number of times before surfacing a conflict.
pub struct RideCoordinator {
    store: Arc<dyn RideStore>,
    directory: Arc<dyn TravelerDirectory>,
    directions: Arc<dyn DirectionsProvider>,
    geocoder: Arc<dyn Geocoder>,
    matcher: LocationMatcher,
    fallback_travel_info: TravelInfo,
    max_commit_attempts: u32,
}

impl RideCoordinator {
    pub fn new(
        store: Arc<dyn RideStore>,
        directory: Arc<dyn TravelerDirectory>,
        directions: Arc<dyn DirectionsProvider>,
        geocoder: Arc<dyn Geocoder>,
        matcher: LocationMatcher,
        fallback_travel_info: TravelInfo,
        max_commit_attempts: u32,
    ) -> Self {
        Self {
            store,
            directory,
            directions,
            geocoder,
            matcher,
            fallback_travel_info,
            max_commit_attempts: max_commit_attempts.max(1),
        }
    }

    pub async fn create_offer(&self, requester_id: Uuid, draft: RideDraft) -> RideResult<RideOffer> {
        self.create_ride(requester_id, draft, RideType::Offered).await
    }

    pub async fn create_request(
        &self,
        requester_id: Uuid,
        draft: RideDraft,
    ) -> RideResult<RideOffer> {
        self.create_ride(requester_id, draft, RideType::Requested).await
    }

    async fn create_ride(
        &self,
        requester_id: Uuid,
        draft: RideDraft,
        ride_type: RideType,
    ) -> RideResult<RideOffer> {
        let requester = self.traveler(requester_id).await?;

        if draft.vehicle_capacity < 1 {
            return Err(RideError::InvalidCapacity);
        }

        // Attach coordinates where the geocoder can resolve them; a failed
        // lookup keeps the stop without coordinates.
        let mut stops = draft.stops;
        for stop in &mut stops {
            match self.geocoder.geocode(&stop.label).await {
                Ok(coords) => stop.coords = coords,
                Err(e) => {
                    tracing::warn!(stop = %stop.label, error = %e, "could not geocode stop point");
                }
            }
        }

        let route = Route::build(draft.origin, stops, draft.destination);

        let travel_info = match self
            .directions
            .travel_info(&route.origin().label, &route.destination().label, &route.stop_labels())
            .await
        {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "directions provider unavailable, using fallback travel info");
                self.fallback_travel_info.clone()
            }
        };

        let mut ride = RideOffer::new(
            route,
            draft.travel_time,
            ride_type,
            draft.vehicle_capacity,
            draft.gender_preference,
            draft.price,
            requester.id,
        );
        ride.vehicle_model = draft.vehicle_model;
        ride.driver_note = draft.driver_note;
        ride.duration_minutes = travel_info.duration_minutes;
        ride.distance_km = travel_info.distance_km;
        ride.route_polyline = travel_info.polyline;
        ride.price_per_km = derive_price_per_km(ride.price, ride.distance_km);

        self.store.insert_ride(&ride).await?;

        tracing::info!(ride_id = %ride.id, %ride_type, requester = %requester.name, "ride created");
        Ok(ride)
    }

    /// A rider takes a seat on an offered ride for a sub-segment of its
    /// route. Validation order is fixed; the first failing check wins.
    pub async fn join(
        &self,
        ride_id: Uuid,
        rider_id: Uuid,
        pickup_term: &str,
        dropoff_term: &str,
        price: Decimal,
    ) -> RideResult<Participation> {
        let rider = self.traveler(rider_id).await?;

        for attempt in 0..self.max_commit_attempts {
            let VersionedRide { ride, version } = self.load(ride_id).await?;

            if ride.ride_type != RideType::Offered {
                return Err(RideError::WrongRideType {
                    expected: RideType::Offered,
                });
            }

            let (pickup_index, dropoff_index) =
                journey::resolve_segment(&self.matcher, &ride.route, pickup_term, dropoff_term)
                    .ok_or(RideError::InvalidSegment)?;

            check_gender(&ride, &rider)?;

            if ride.remaining_seats() < 1 {
                return Err(RideError::RideFull);
            }

            if ride.requester_id == rider.id {
                return Err(RideError::OwnRide);
            }

            if ride.participants.iter().any(|p| p.traveler_id == rider.id) {
                return Err(RideError::AlreadyJoined);
            }

            let participation =
                Participation::new(ride.id, rider.id, pickup_index, dropoff_index, price);

            match self
                .store
                .commit_participation(ride_id, version, &participation)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        ride_id = %ride_id,
                        rider = %rider.name,
                        pickup_index,
                        dropoff_index,
                        "seat committed"
                    );
                    return Ok(participation);
                }
                Err(StoreError::VersionConflict(_)) => {
                    tracing::debug!(ride_id = %ride_id, attempt, "join lost the version race, revalidating");
                    continue;
                }
                Err(StoreError::DuplicateParticipant { .. }) => return Err(RideError::AlreadyJoined),
                Err(StoreError::RideNotFound(id)) => return Err(RideError::RideNotFound(id)),
                Err(e) => return Err(e.into()),
            }
        }

        Err(RideError::Contention(self.max_commit_attempts))
    }

    /// A driver takes on a requested ride, confirming it. Exactly one of
    /// any number of concurrent accepts can win.
    pub async fn accept(&self, ride_id: Uuid, driver_id: Uuid) -> RideResult<RideOffer> {
        let driver = self.traveler(driver_id).await?;

        for attempt in 0..self.max_commit_attempts {
            let VersionedRide { mut ride, version } = self.load(ride_id).await?;

            if ride.ride_type != RideType::Requested {
                return Err(RideError::WrongRideType {
                    expected: RideType::Requested,
                });
            }

            if ride.driver_id.is_some() {
                return Err(RideError::AlreadyAccepted);
            }

            check_gender(&ride, &driver)?;

            if ride.requester_id == driver.id {
                return Err(RideError::OwnRide);
            }

            let confirmed = lifecycle::confirm(ride.status).map_err(|e| {
                tracing::debug!(ride_id = %ride_id, error = %e, "accept rejected by lifecycle");
                RideError::AlreadyAccepted
            })?;

            match self
                .store
                .commit_driver(ride_id, version, driver.id, confirmed)
                .await
            {
                Ok(()) => {
                    ride.driver_id = Some(driver.id);
                    ride.status = confirmed;
                    tracing::info!(ride_id = %ride_id, driver = %driver.name, "ride confirmed");
                    return Ok(ride);
                }
                Err(StoreError::VersionConflict(_)) => {
                    tracing::debug!(ride_id = %ride_id, attempt, "accept lost the version race, revalidating");
                    continue;
                }
                Err(StoreError::RideNotFound(id)) => return Err(RideError::RideNotFound(id)),
                Err(e) => return Err(e.into()),
            }
        }

        Err(RideError::Contention(self.max_commit_attempts))
    }

    /// Owner-only removal; cascades to the ride's participations. The
    /// requester may always delete; an assigned driver may too.
    pub async fn delete(&self, ride_id: Uuid, caller_id: Uuid) -> RideResult<()> {
        let VersionedRide { ride, .. } = self.load(ride_id).await?;
        let caller = self.traveler(caller_id).await?;

        let authorized = ride.requester_id == caller.id || ride.driver_id == Some(caller.id);
        if !authorized {
            return Err(RideError::NotOwner);
        }

        match self.store.delete_ride(ride_id).await {
            Ok(()) => {
                tracing::info!(ride_id = %ride_id, caller = %caller.name, "ride deleted");
                Ok(())
            }
            Err(StoreError::RideNotFound(id)) => Err(RideError::RideNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn ride_detail(&self, ride_id: Uuid) -> RideResult<RideOffer> {
        Ok(self.load(ride_id).await?.ride)
    }

    /// Rides the traveler posted, drives, or joined.
    pub async fn rides_for(&self, traveler_id: Uuid) -> RideResult<Vec<RideOffer>> {
        let traveler = self.traveler(traveler_id).await?;
        let rides = self.store.list_rides().await?;
        Ok(rides.into_iter().filter(|r| r.involves(traveler.id)).collect())
    }

    async fn load(&self, ride_id: Uuid) -> RideResult<VersionedRide> {
        self.store
            .fetch_ride(ride_id)
            .await?
            .ok_or(RideError::RideNotFound(ride_id))
    }

    async fn traveler(&self, id: Uuid) -> RideResult<Traveler> {
        self.directory
            .find_by_id(id)
            .await
            .map_err(|e| RideError::Store(StoreError::Backend(e.to_string())))?
            .ok_or(RideError::TravelerNotFound(id))
    }
}

fn check_gender(ride: &RideOffer, traveler: &Traveler) -> RideResult<()> {
    if ride.gender_preference == GenderPreference::FemaleOnly && traveler.gender != Gender::Female {
        return Err(RideError::GenderRestricted);
    }
    Ok(())
}

/// Zero unless both price and distance are positive.
pub fn derive_price_per_km(price: Decimal, distance_km: f64) -> Decimal {
    match Decimal::from_f64(distance_km) {
        Some(distance) if distance > Decimal::ZERO && price > Decimal::ZERO => price / distance,
        _ => Decimal::ZERO,
    }
}
