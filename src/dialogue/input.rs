//! Semantic inputs consumed by the state machine.
//!
//! The transport adapter turns button labels and commands into these;
//! the transition table never sees display text except as form answers.

use crate::channels::SharedContact;

use super::state::Role;

/// Main menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    NewRequest,
    MyRequests,
    Help,
    Contact,
    Prices,
}

/// One user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Start over from the main menu.
    Restart,
    /// Leave the flow without re-showing the menu.
    Cancel,
    Back,
    Menu(MenuChoice),
    ChooseRole(Role),
    /// Anything else the user typed.
    Text(String),
    Contact(SharedContact),
}
