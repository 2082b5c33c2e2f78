//! Finalized submissions: trip requests and driver registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channels::UserId;

/// Placeholder for a price the client never offered.
pub const NEGOTIABLE: &str = "negotiable";

/// Placeholder for any other answer missing at finalization.
pub const NOT_PROVIDED: &str = "not provided";

/// The two independent collections held by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    TripRequest,
    DriverRegistration,
}

impl RecordKind {
    /// File name of this collection inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::TripRequest => "orders.json",
            Self::DriverRegistration => "drivers.json",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TripRequest => "trip_request",
            Self::DriverRegistration => "driver_registration",
        };
        write!(f, "{s}")
    }
}

/// Status of a trip request. Nothing moves a request out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Pending,
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Status of a driver registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Active,
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
        }
    }
}

/// A client's trip request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    /// 1-based position among stored requests; assigned by the store on save.
    pub sequence_number: u64,
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub phone_number: String,
    pub route_description: String,
    pub passenger_count: String,
    pub price_offer: String,
    pub created_at: DateTime<Utc>,
    pub status: TripStatus,
}

/// A driver's registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRegistration {
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub phone_number: String,
    /// Vehicle and route description, exactly as typed.
    pub free_text_info: String,
    pub created_at: DateTime<Utc>,
    pub status: DriverStatus,
}

/// Either kind of finalized record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Trip(TripRequest),
    Driver(DriverRegistration),
}

impl Submission {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Trip(_) => RecordKind::TripRequest,
            Self::Driver(_) => RecordKind::DriverRegistration,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::Trip(r) => r.user_id,
            Self::Driver(r) => r.user_id,
        }
    }
}
