//! Dialogue states and the per-user session they live in.

use serde::{Deserialize, Serialize};

use crate::channels::UserId;

/// Position in the intake conversation.
///
/// Client branch: RoleSelect → RouteInput → PassengerCountInput →
/// PriceInput → PhoneInput. Driver branch: RoleSelect → DriverInfoInput →
/// PhoneInput. Both end back at MainMenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    MainMenu,
    RoleSelect,
    RouteInput,
    PassengerCountInput,
    PriceInput,
    DriverInfoInput,
    PhoneInput,
}

/// The shape of input a state understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    MenuChoice,
    RoleChoice,
    FreeText,
    Contact,
}

impl DialogueState {
    pub fn expects(&self) -> Expect {
        match self {
            Self::MainMenu => Expect::MenuChoice,
            Self::RoleSelect => Expect::RoleChoice,
            Self::RouteInput
            | Self::PassengerCountInput
            | Self::PriceInput
            | Self::DriverInfoInput => Expect::FreeText,
            Self::PhoneInput => Expect::Contact,
        }
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MainMenu => "main_menu",
            Self::RoleSelect => "role_select",
            Self::RouteInput => "route_input",
            Self::PassengerCountInput => "passenger_count_input",
            Self::PriceInput => "price_input",
            Self::DriverInfoInput => "driver_info_input",
            Self::PhoneInput => "phone_input",
        };
        write!(f, "{s}")
    }
}

/// Which form the user is filling in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Driver,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Driver => write!(f, "driver"),
        }
    }
}

/// Raw answers collected so far. Only the current role's fields are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub route: Option<String>,
    pub passengers: Option<String>,
    pub price: Option<String>,
    pub driver_info: Option<String>,
}

impl FormFields {
    pub fn is_empty(&self) -> bool {
        self.route.is_none()
            && self.passengers.is_none()
            && self.price.is_none()
            && self.driver_info.is_none()
    }
}

/// One user's in-flight conversation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub state: DialogueState,
    pub role: Option<Role>,
    pub fields: FormFields,
}

impl Session {
    /// A fresh session resting at the main menu.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: DialogueState::MainMenu,
            role: None,
            fields: FormFields::default(),
        }
    }

    /// A fresh session (no role, no answers) placed at `state`.
    pub fn reset_to(&self, state: DialogueState) -> Self {
        Self {
            state,
            ..Self::new(self.user_id)
        }
    }

    /// At the main menu with nothing collected, indistinguishable from
    /// `Session::new`.
    pub fn is_fresh(&self) -> bool {
        self.state == DialogueState::MainMenu && self.role.is_none() && self.fields.is_empty()
    }

    /// Same role and answers, different state.
    pub fn with_state(&self, state: DialogueState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}
