//! Intake dialogue: the per-user conversation state machine.
//!
//! A user walks from the main menu through role selection into either the
//! client form (route, passengers, price) or the driver form (free-text
//! info), and both end with a shared phone contact. Transitions are pure;
//! the bot driver executes the resulting effects.

pub mod effect;
pub mod finalize;
pub mod input;
pub mod sessions;
pub mod state;
pub mod transition;

pub use effect::{Effect, FinalizeRequest, Prompt};
pub use input::{Input, MenuChoice};
pub use sessions::SessionManager;
pub use state::{DialogueState, Expect, FormFields, Role, Session};
pub use transition::{Transition, transition};
