pub mod collector;
pub mod normalizer;
pub mod odds;
pub mod profiles;
pub mod strength;

pub use collector::Collector;
pub use profiles::ScoringProfile;
