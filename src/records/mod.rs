//! Persistence layer: finalized trip requests and driver registrations.

pub mod model;
pub mod store;

pub use model::{
    DriverRegistration, DriverStatus, NEGOTIABLE, NOT_PROVIDED, RecordKind, Submission,
    TripRequest, TripStatus,
};
pub use store::{JsonFileStore, RecordStore};
