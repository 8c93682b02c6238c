use crate::models::RideStatus;

/// Ride status transitions. PENDING is the only entry state; CONFIRMED is
/// terminal and reachable only through driver acceptance of a requested
/// ride. Joining an offered ride never moves ride-level status, and there
/// is no un-accept transition; deletion is an exit from any state.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: RideStatus, to: RideStatus },
}

pub fn confirm(current: RideStatus) -> Result<RideStatus, LifecycleError> {
    match current {
        RideStatus::Pending => Ok(RideStatus::Confirmed),
        other => Err(LifecycleError::InvalidTransition {
            from: other,
            to: RideStatus::Confirmed,
        }),
    }
}
