//! Operator accept/reject actions carried as callback tags.

use std::sync::LazyLock;

use regex::Regex;

use crate::channels::UserId;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(accept|reject)_(-?\d+)$").expect("tag pattern is valid"));

/// What the operator decided about a trip request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorAction {
    Accept,
    Reject,
}

impl OperatorAction {
    /// Fixed suffix appended to the operator's copy of the notification.
    pub fn status_suffix(&self) -> &'static str {
        match self {
            Self::Accept => "✅ ACCEPTED",
            Self::Reject => "❌ REJECTED",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

/// An action bound to the user whose request it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTag {
    pub action: OperatorAction,
    pub user_id: UserId,
}

impl ActionTag {
    pub fn new(action: OperatorAction, user_id: UserId) -> Self {
        Self { action, user_id }
    }

    /// Callback payload, e.g. `accept_6723737087`.
    pub fn encode(&self) -> String {
        format!("{}_{}", self.action.as_str(), self.user_id)
    }

    pub fn parse(data: &str) -> Option<Self> {
        let caps = TAG_PATTERN.captures(data)?;
        let action = match &caps[1] {
            "accept" => OperatorAction::Accept,
            _ => OperatorAction::Reject,
        };
        let user_id = caps[2].parse().ok().map(UserId)?;
        Some(Self { action, user_id })
    }
}

/// Operator message text after an action was taken.
///
/// Presentation only: the stored request keeps its status and the client
/// is not told.
pub fn acknowledge(original_text: &str, action: OperatorAction) -> String {
    format!("{original_text}\n\n{}", action.status_suffix())
}
