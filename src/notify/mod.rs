//! Operator and user notifications for finalized submissions.

pub mod actions;
pub mod router;

pub use actions::{ActionTag, OperatorAction, acknowledge};
pub use router::{Notification, ROUTE_PREVIEW_CHARS, format_timestamp, route, truncate_chars};
