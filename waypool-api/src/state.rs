use std::sync::Arc;
use waypool_core::rating::RatingProvider;
use waypool_ride::{RideCoordinator, RideStore, SearchFilter};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RideCoordinator>,
    pub filter: Arc<SearchFilter>,
    pub store: Arc<dyn RideStore>,
    pub ratings: Arc<dyn RatingProvider>,
}
