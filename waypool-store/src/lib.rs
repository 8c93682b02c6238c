pub mod app_config;
pub mod directory;
pub mod memory;
pub mod postgres;

pub use directory::{InMemoryRatings, InMemoryTravelerDirectory};
pub use memory::InMemoryRideStore;
pub use postgres::PostgresRideStore;
