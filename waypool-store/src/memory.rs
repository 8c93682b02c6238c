use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use waypool_ride::models::{Participation, RideOffer, RideStatus};
use waypool_ride::store::{RideStore, StoreError, VersionedRide};

struct RideRecord {
    ride: RideOffer,
    version: u64,
    participations: Vec<Participation>,
}

impl RideRecord {
    fn hydrated(&self) -> RideOffer {
        let mut ride = self.ride.clone();
        ride.participants = self.participations.clone();
        ride
    }
}

/// Versioned in-memory ride store, the development and test backend.
///
/// All commits run under one write lock and re-check the caller's version
/// before applying, so a commit based on a stale read always fails with
/// `VersionConflict` instead of clobbering newer state.
pub struct InMemoryRideStore {
    rides: RwLock<HashMap<Uuid, RideRecord>>,
}

impl InMemoryRideStore {
    pub fn new() -> Self {
        Self {
            rides: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRideStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideStore for InMemoryRideStore {
    async fn insert_ride(&self, ride: &RideOffer) -> Result<(), StoreError> {
        let mut rides = self.rides.write().await;
        let mut stored = ride.clone();
        let participations = std::mem::take(&mut stored.participants);
        rides.insert(
            ride.id,
            RideRecord {
                ride: stored,
                version: 1,
                participations,
            },
        );
        Ok(())
    }

    async fn fetch_ride(&self, id: Uuid) -> Result<Option<VersionedRide>, StoreError> {
        let rides = self.rides.read().await;
        Ok(rides.get(&id).map(|record| VersionedRide {
            ride: record.hydrated(),
            version: record.version,
        }))
    }

    async fn list_rides(&self) -> Result<Vec<RideOffer>, StoreError> {
        let rides = self.rides.read().await;
        let mut all: Vec<RideOffer> = rides.values().map(RideRecord::hydrated).collect();
        // HashMap iteration order is arbitrary; keep listings stable.
        all.sort_by_key(|r| (r.created_at, r.id));
        Ok(all)
    }

    async fn delete_ride(&self, id: Uuid) -> Result<(), StoreError> {
        let mut rides = self.rides.write().await;
        // Participations live inside the record, so removal cascades.
        rides.remove(&id).ok_or(StoreError::RideNotFound(id))?;
        Ok(())
    }

    async fn commit_participation(
        &self,
        ride_id: Uuid,
        expected_version: u64,
        participation: &Participation,
    ) -> Result<(), StoreError> {
        let mut rides = self.rides.write().await;
        let record = rides
            .get_mut(&ride_id)
            .ok_or(StoreError::RideNotFound(ride_id))?;

        if record.version != expected_version {
            return Err(StoreError::VersionConflict(ride_id));
        }

        if record
            .participations
            .iter()
            .any(|p| p.traveler_id == participation.traveler_id)
        {
            return Err(StoreError::DuplicateParticipant {
                ride_id,
                traveler_id: participation.traveler_id,
            });
        }

        record.participations.push(participation.clone());
        record.version += 1;
        Ok(())
    }

    async fn commit_driver(
        &self,
        ride_id: Uuid,
        expected_version: u64,
        driver_id: Uuid,
        status: RideStatus,
    ) -> Result<(), StoreError> {
        let mut rides = self.rides.write().await;
        let record = rides
            .get_mut(&ride_id)
            .ok_or(StoreError::RideNotFound(ride_id))?;

        if record.version != expected_version {
            return Err(StoreError::VersionConflict(ride_id));
        }

        record.ride.driver_id = Some(driver_id);
        record.ride.status = status;
        record.version += 1;
        Ok(())
    }
}
