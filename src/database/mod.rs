//! # Persistence
//!
//! The [`Store`] contract the dialogue engine and the scheduler depend on,
//! and its SQLite implementation.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod sqlite_store;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::core::models::{ChannelId, Group, GroupId, Item, ItemId, UserId};

pub use self::sqlite_store::Database;

/// Persistence operations with their consistency contracts.
///
/// Implementations must be safe to share between concurrent event tasks.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_group(&self, password_hash: &str) -> Result<Group>;

    /// `None` when no group has this id
    async fn get_group(&self, group_id: GroupId) -> Result<Option<Group>>;

    /// Adding an existing membership is a no-op
    async fn add_user_to_group(&self, user_id: UserId, group_id: GroupId) -> Result<()>;

    async fn remove_user_from_group(&self, user_id: UserId, group_id: GroupId) -> Result<()>;

    /// Groups the user belongs to, ordered by id
    async fn get_user_groups(&self, user_id: UserId) -> Result<Vec<Group>>;

    /// Items of a group, earliest due first
    async fn get_items_by_group(&self, group_id: GroupId) -> Result<Vec<Item>>;

    /// Items whose due date is exactly `date`
    async fn get_items_due_on(&self, date: NaiveDate) -> Result<Vec<Item>>;

    /// Store a new item with counter 0
    async fn create_item(
        &self,
        group_id: GroupId,
        url: &str,
        name: &str,
        next_due: NaiveDate,
    ) -> Result<Item>;

    /// Move every item due before `today` to `today`; returns rows moved
    async fn advance_overdue(&self, today: NaiveDate) -> Result<usize>;

    /// Atomically push the item's due date to at least `new_due` and increment
    /// its counter, only if the stored counter equals `expected_counter`.
    ///
    /// Returns whether the row matched.
    async fn advance_if_counter(
        &self,
        item_id: ItemId,
        expected_counter: i64,
        new_due: NaiveDate,
    ) -> Result<bool>;

    /// Remember that the user can be reached in `channel_id`; idempotent
    async fn bind_channel(&self, user_id: UserId, channel_id: ChannelId) -> Result<()>;

    async fn get_channels_by_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, Vec<ChannelId>>>;

    /// Channels of every member of each item's group, without duplicates
    async fn get_channels_by_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, Vec<ChannelId>>>;

    /// The storage engine's own idea of the current date (diagnostics)
    async fn database_date(&self) -> Result<String>;
}
