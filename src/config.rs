//! Configuration: fixture profiles and value parsing.

mod duration;
mod profile;

pub use duration::parse_duration;
pub use profile::{FixtureProfile, MySqlProfile, StarRocksProfile};
