pub mod coordinator;
pub mod filter;
pub mod lifecycle;
pub mod models;
pub mod store;

pub use coordinator::{RideCoordinator, RideDraft};
pub use filter::{RideQuery, SearchFilter};
pub use models::{GenderPreference, Participation, RideOffer, RideStatus, RideType};
pub use store::{RideStore, StoreError, VersionedRide};

use uuid::Uuid;

/// Typed failure surface for every ride operation. Variants group into the
/// four caller-visible kinds: not-found, validation, state conflict, and
/// authorization; `Store` covers backend faults.
#[derive(Debug, thiserror::Error)]
pub enum RideError {
    #[error("Ride not found: {0}")]
    RideNotFound(Uuid),

    #[error("Traveler not found: {0}")]
    TravelerNotFound(Uuid),

    #[error("Only {expected} rides support this operation")]
    WrongRideType { expected: RideType },

    #[error("Pickup and drop-off must lie on the route in travel order")]
    InvalidSegment,

    #[error("Vehicle capacity must be at least one")]
    InvalidCapacity,

    #[error("This ride accepts female travelers only")]
    GenderRestricted,

    #[error("Ride is already full")]
    RideFull,

    #[error("You cannot take a ride that you posted")]
    OwnRide,

    #[error("You have already joined this ride")]
    AlreadyJoined,

    #[error("Ride already has a driver assigned")]
    AlreadyAccepted,

    #[error("Could not commit the assignment after {0} attempts, try again")]
    Contention(u32),

    #[error("You are not authorized to modify this ride")]
    NotOwner,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub type RideResult<T> = Result<T, RideError>;
