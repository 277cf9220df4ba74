// Core layer - shared types, configuration and calendar
pub mod core;

// Features layer - dialogue, sessions and reminders
pub mod features;

// Messaging contract and its Discord binding
pub mod message_components;
pub mod transport;

// Persistence
pub mod database;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core config for the binary
pub use crate::core::Config;

pub use features::{DialogueEngine, Ticker};
