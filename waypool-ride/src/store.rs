use crate::models::{Participation, RideOffer, RideStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// A ride as loaded for mutation: the entity plus the version its state was
/// read at. Commits carry the version back so the store can reject writes
/// based on a stale read.
#[derive(Debug, Clone)]
pub struct VersionedRide {
    pub ride: RideOffer,
    pub version: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Ride not found: {0}")]
    RideNotFound(Uuid),

    #[error("Stale version for ride {0}")]
    VersionConflict(Uuid),

    #[error("Traveler {traveler_id} already holds a seat on ride {ride_id}")]
    DuplicateParticipant { ride_id: Uuid, traveler_id: Uuid },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Persistence boundary for rides and participations.
///
/// The two `commit_*` operations are the engine's atomic check-then-write
/// units: each succeeds only if the stored version still equals
/// `expected_version`, and bumps the version on success. A caller that
/// validated against version N can therefore never clobber state another
/// request changed after N; it gets `VersionConflict` and revalidates.
/// Stores additionally enforce (ride, traveler) uniqueness for
/// participations as a defense-in-depth invariant.
#[async_trait]
pub trait RideStore: Send + Sync {
    async fn insert_ride(&self, ride: &RideOffer) -> Result<(), StoreError>;

    /// Fetch with participations hydrated, or `None` when absent.
    async fn fetch_ride(&self, id: Uuid) -> Result<Option<VersionedRide>, StoreError>;

    /// All rides, participations hydrated, in stable creation order.
    async fn list_rides(&self) -> Result<Vec<RideOffer>, StoreError>;

    /// Removes the ride and cascades to its participations.
    async fn delete_ride(&self, id: Uuid) -> Result<(), StoreError>;

    async fn commit_participation(
        &self,
        ride_id: Uuid,
        expected_version: u64,
        participation: &Participation,
    ) -> Result<(), StoreError>;

    async fn commit_driver(
        &self,
        ride_id: Uuid,
        expected_version: u64,
        driver_id: Uuid,
        status: RideStatus,
    ) -> Result<(), StoreError>;
}
