//! Button labels and the adapter from typed text to dialogue inputs.
//!
//! Labels live only here. The state machine receives semantic [`Input`]s,
//! so relabeling or translating the buttons never touches transitions.

use crate::dialogue::{Expect, Input, MenuChoice, Role};

pub const NEW_REQUEST: &str = "📝 New request";
pub const MY_REQUESTS: &str = "📊 My requests";
pub const HELP: &str = "ℹ️ Help";
pub const CONTACT: &str = "📞 Contact";
pub const PRICES: &str = "⭐ Prices";
pub const CLIENT: &str = "👤 Client";
pub const DRIVER: &str = "🚗 Driver";
pub const BACK: &str = "🔙 Back";
pub const SHARE_PHONE: &str = "📱 Share phone number";
pub const ACCEPT: &str = "✅ Accept";
pub const REJECT: &str = "❌ Reject";

/// Quick picks offered for the passenger count. Any text is accepted.
pub const PASSENGER_PICKS: [&str; 5] =
    ["1 person", "2 people", "3 people", "4 people", "5+ people"];

const MENU: [(&str, MenuChoice); 5] = [
    (NEW_REQUEST, MenuChoice::NewRequest),
    (MY_REQUESTS, MenuChoice::MyRequests),
    (HELP, MenuChoice::Help),
    (CONTACT, MenuChoice::Contact),
    (PRICES, MenuChoice::Prices),
];

const ROLES: [(&str, Role); 2] = [(CLIENT, Role::Client), (DRIVER, Role::Driver)];

/// Parse typed text into an input for a state expecting `expect`.
pub fn parse(expect: Expect, text: &str) -> Input {
    if let Some(command) = parse_command(text) {
        return command;
    }

    if expect != Expect::MenuChoice && matches_label(text, BACK) {
        return Input::Back;
    }

    match expect {
        Expect::MenuChoice => MENU
            .iter()
            .find(|(label, _)| matches_label(text, label))
            .map(|(_, choice)| Input::Menu(*choice))
            .unwrap_or_else(|| Input::Text(text.to_string())),
        Expect::RoleChoice => ROLES
            .iter()
            .find(|(label, _)| matches_label(text, label))
            .map(|(_, role)| Input::ChooseRole(*role))
            .unwrap_or_else(|| Input::Text(text.to_string())),
        Expect::FreeText | Expect::Contact => Input::Text(text.to_string()),
    }
}

/// `/start` and `/cancel`, also in the `/start@botname` form.
fn parse_command(text: &str) -> Option<Input> {
    let trimmed = text.trim();
    let command = trimmed.strip_prefix('/')?;
    let name = command.split(['@', ' ']).next().unwrap_or_default();
    match name.to_lowercase().as_str() {
        "start" => Some(Input::Restart),
        "cancel" => Some(Input::Cancel),
        _ => None,
    }
}

/// Exact label, or the label's words without the leading emoji, ignoring case.
fn matches_label(text: &str, label: &str) -> bool {
    let text = text.trim();
    if text == label {
        return true;
    }
    match label.split_once(' ') {
        Some((_, words)) => text.eq_ignore_ascii_case(words),
        None => false,
    }
}
