//! # Features
//!
//! - `session`: per-user dialogue state and turn locks
//! - `dialogue`: the conversation state machine
//! - `reminders`: spaced-repetition schedule and the daily reminder cycle

pub mod dialogue;
pub mod reminders;
pub mod session;

pub use dialogue::DialogueEngine;
pub use reminders::{CycleTrigger, Notifier, Ticker};
pub use session::{DialogueState, SessionStore};
