//! # Feature: Reminders
//!
//! Spaced-repetition scheduling and the daily reminder cycle.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Group study items with spaced intervals and a single daily cycle
//! - 1.0.0: Initial release

pub mod notifier;
pub mod schedule;
pub mod scheduler;

pub use notifier::{Notifier, NotifyReport};
pub use schedule::Confirmation;
pub use scheduler::{CycleReport, CycleTrigger, Ticker};
