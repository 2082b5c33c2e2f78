//! Taxi intake bot: collects trip requests and driver registrations over
//! chat and forwards them to an operator.

pub mod bot;
pub mod channels;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod notify;
pub mod records;
