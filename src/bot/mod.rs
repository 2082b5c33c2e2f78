//! The intake bot: label parsing, prompt rendering, and the event loop.

pub mod driver;
pub mod labels;
pub mod prompts;

pub use driver::IntakeBot;
