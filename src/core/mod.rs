//! # Core Module
//!
//! Domain types, configuration, calendar, validation rules and outgoing-text
//! helpers shared by every feature.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod clock;
pub mod config;
pub mod models;
pub mod response;
pub mod validation;

// Re-export commonly used items
pub use clock::{next_daily_instant, Calendar, Clock, FixedClock, SystemClock};
pub use config::Config;
pub use models::{
    format_date, hash_password, ChannelId, Group, GroupId, Item, ItemId, Memberships, UserId,
};
pub use response::{chunk_for_message, chunk_text, escape_markdown, MESSAGE_LIMIT};
pub use validation::{
    is_valid_item_name, is_valid_password, is_valid_url, parse_group_id, parse_module_sentence,
    ModuleSubmission,
};
