pub mod identity;
pub mod journey;
pub mod maps;
pub mod matching;
pub mod rating;
pub mod route;

pub use matching::{LocationMatcher, MatcherConfig};
pub use route::{Route, RoutePoint};
