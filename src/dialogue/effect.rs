//! Effects produced by transitions, executed by the bot driver.

use crate::channels::SharedContact;

use super::state::{FormFields, Role};

/// A message the user should see next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Greeting plus main menu.
    Welcome,
    MainMenu,
    RoleSelect,
    Route,
    PassengerCount,
    Price,
    DriverInfo,
    Phone,
    /// The user typed instead of sharing a contact.
    PhoneRetry,
    Help,
    ContactInfo,
    Prices,
    Cancelled,
}

/// Everything needed to assemble a record once the phone number arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeRequest {
    pub role: Option<Role>,
    pub fields: FormFields,
    pub contact: SharedContact,
}

/// Effects to execute after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Prompt(Prompt),
    /// Show the user's recent trip requests.
    ListOwnRequests,
    /// Build, persist and announce the record.
    Finalize(FinalizeRequest),
}
