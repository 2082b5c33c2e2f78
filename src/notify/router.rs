//! Notification router: formats operator and user messages for a record.

use chrono::{DateTime, Utc};

use crate::records::{DriverRegistration, Submission, TripRequest};

use super::actions::{ActionTag, OperatorAction};

/// Display width of a route in confirmations and listings.
pub const ROUTE_PREVIEW_CHARS: usize = 40;

const RULE_WIDTH: usize = 35;

/// Messages produced for one finalized record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub operator_text: String,
    /// Buttons for the operator; empty for driver registrations.
    pub operator_actions: Vec<ActionTag>,
    pub user_text: String,
}

/// Build the notification for a finalized record.
pub fn route(record: &Submission) -> Notification {
    match record {
        Submission::Trip(trip) => trip_notification(trip),
        Submission::Driver(driver) => driver_notification(driver),
    }
}

fn trip_notification(trip: &TripRequest) -> Notification {
    let rule = "=".repeat(RULE_WIDTH);
    let time = format_timestamp(&trip.created_at);

    let operator_text = format!(
        "🆕 NEW TRIP REQUEST!\n{rule}\n\n\
         📝 Request #: {seq}\n\
         👤 Name: {name}\n\
         🆔 Username: @{handle}\n\
         📱 Phone: {phone}\n\n\
         📍 Route:\n{route}\n\n\
         👥 Passengers: {passengers}\n\
         💰 Price offer: {price}\n\n\
         🕐 Time: {time}\n\
         🆔 User ID: {user_id}\n{rule}",
        seq = trip.sequence_number,
        name = trip.display_name,
        handle = trip.handle.as_deref().unwrap_or("none"),
        phone = trip.phone_number,
        route = trip.route_description,
        passengers = trip.passenger_count,
        price = trip.price_offer,
        user_id = trip.user_id,
    );

    let user_text = format!(
        "✅ Your request has been received!\n\n\
         📝 Request number: #{seq}\n\
         📍 Route: {route}\n\
         👥 Passengers: {passengers}\n\
         💰 Price: {price}\n\
         🕐 Time: {time}\n\n\
         An operator will contact you shortly.\n\
         Thank you! 🙏",
        seq = trip.sequence_number,
        route = truncate_chars(&trip.route_description, ROUTE_PREVIEW_CHARS),
        passengers = trip.passenger_count,
        price = trip.price_offer,
    );

    Notification {
        operator_text,
        operator_actions: vec![
            ActionTag::new(OperatorAction::Accept, trip.user_id),
            ActionTag::new(OperatorAction::Reject, trip.user_id),
        ],
        user_text,
    }
}

fn driver_notification(driver: &DriverRegistration) -> Notification {
    let rule = "=".repeat(RULE_WIDTH);
    let time = format_timestamp(&driver.created_at);

    let operator_text = format!(
        "🚗 NEW DRIVER!\n{rule}\n\n\
         👤 Name: {name}\n\
         🆔 Username: @{handle}\n\
         📱 Phone: {phone}\n\n\
         📝 Details:\n{info}\n\n\
         🕐 Time: {time}\n\
         🆔 User ID: {user_id}\n{rule}",
        name = driver.display_name,
        handle = driver.handle.as_deref().unwrap_or("none"),
        phone = driver.phone_number,
        info = driver.free_text_info,
        user_id = driver.user_id,
    );

    let user_text = format!(
        "✅ You are registered as a driver!\n\n\
         📱 Phone: {phone}\n\
         🕐 Time: {time}\n\n\
         We will message you when new requests come in.\n\
         Thank you! 🙏",
        phone = driver.phone_number,
    );

    Notification {
        operator_text,
        operator_actions: vec![],
        user_text,
    }
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Cut `text` to `max_chars` characters, marking the cut with "...".
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => format!("{}...", &text[..byte_offset]),
        None => text.to_string(),
    }
}
