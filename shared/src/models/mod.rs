//! Configuration data models

pub mod station;

pub use station::{Station, StationCreate, StationKind, StationUpdate};
