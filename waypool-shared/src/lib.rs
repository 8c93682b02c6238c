pub mod pii;
pub mod traveler;

pub use pii::Masked;
pub use traveler::{Gender, Traveler};
