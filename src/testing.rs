//! Test doubles shared by the unit tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::core::models::{ChannelId, Group, GroupId, Item, ItemId, UserId};
use crate::database::{Database, Store};
use crate::transport::{CallbackRef, MessageRef, Messenger, OutboundMessage};

/// Messenger that records everything instead of talking to a chat service
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<OutboundMessage>>,
    edits: Mutex<Vec<(MessageRef, String)>>,
    answers: Mutex<Vec<(CallbackRef, String)>>,
    next_id: AtomicU64,
    failing: HashSet<ChannelId>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `channel` fails
    pub fn failing_for(mut self, channel: ChannelId) -> Self {
        self.failing.insert(channel);
        self
    }

    /// Each send takes at least `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_to(&self, channel: ChannelId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.channel == channel)
            .map(|m| m.text)
            .collect()
    }

    pub fn last_to(&self, channel: ChannelId) -> Option<OutboundMessage> {
        self.sent().into_iter().rev().find(|m| m.channel == channel)
    }

    pub fn edits(&self) -> Vec<(MessageRef, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn answers(&self) -> Vec<(CallbackRef, String)> {
        self.answers.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: OutboundMessage) -> Result<MessageRef> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&message.channel) {
            bail!("channel {} is unreachable", message.channel);
        }

        let reference = MessageRef {
            channel: message.channel,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.sent.lock().unwrap().push(message);
        Ok(reference)
    }

    async fn edit(&self, target: &MessageRef, text: &str) -> Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push((target.clone(), text.to_string()));
        Ok(())
    }

    async fn answer_callback(&self, callback: &CallbackRef, text: &str) -> Result<()> {
        self.answers
            .lock()
            .unwrap()
            .push((callback.clone(), text.to_string()));
        Ok(())
    }
}

/// Real in-memory database whose reads or writes can be switched to fail
pub struct FlakyStore {
    inner: Database,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_channel_lookups: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_channel_lookups: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Only the channel lookups fail, other reads go through
    pub fn fail_channel_lookups(&self, fail: bool) {
        self.fail_channel_lookups.store(fail, Ordering::SeqCst);
    }

    fn channel_lookup(&self) -> Result<()> {
        if self.fail_channel_lookups.load(Ordering::SeqCst) {
            bail!("channel lookup failed");
        }
        self.read()
    }

    fn read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("database read failed");
        }
        Ok(())
    }

    fn write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("database write failed");
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn create_group(&self, password_hash: &str) -> Result<Group> {
        self.write()?;
        self.inner.create_group(password_hash).await
    }

    async fn get_group(&self, group_id: GroupId) -> Result<Option<Group>> {
        self.read()?;
        self.inner.get_group(group_id).await
    }

    async fn add_user_to_group(&self, user_id: UserId, group_id: GroupId) -> Result<()> {
        self.write()?;
        self.inner.add_user_to_group(user_id, group_id).await
    }

    async fn remove_user_from_group(&self, user_id: UserId, group_id: GroupId) -> Result<()> {
        self.write()?;
        self.inner.remove_user_from_group(user_id, group_id).await
    }

    async fn get_user_groups(&self, user_id: UserId) -> Result<Vec<Group>> {
        self.read()?;
        self.inner.get_user_groups(user_id).await
    }

    async fn get_items_by_group(&self, group_id: GroupId) -> Result<Vec<Item>> {
        self.read()?;
        self.inner.get_items_by_group(group_id).await
    }

    async fn get_items_due_on(&self, date: NaiveDate) -> Result<Vec<Item>> {
        self.read()?;
        self.inner.get_items_due_on(date).await
    }

    async fn create_item(
        &self,
        group_id: GroupId,
        url: &str,
        name: &str,
        next_due: NaiveDate,
    ) -> Result<Item> {
        self.write()?;
        self.inner.create_item(group_id, url, name, next_due).await
    }

    async fn advance_overdue(&self, today: NaiveDate) -> Result<usize> {
        self.write()?;
        self.inner.advance_overdue(today).await
    }

    async fn advance_if_counter(
        &self,
        item_id: ItemId,
        expected_counter: i64,
        new_due: NaiveDate,
    ) -> Result<bool> {
        self.write()?;
        self.inner
            .advance_if_counter(item_id, expected_counter, new_due)
            .await
    }

    async fn bind_channel(&self, user_id: UserId, channel_id: ChannelId) -> Result<()> {
        self.write()?;
        self.inner.bind_channel(user_id, channel_id).await
    }

    async fn get_channels_by_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, Vec<ChannelId>>> {
        self.channel_lookup()?;
        self.inner.get_channels_by_users(user_ids).await
    }

    async fn get_channels_by_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, Vec<ChannelId>>> {
        self.channel_lookup()?;
        self.inner.get_channels_by_items(item_ids).await
    }

    async fn database_date(&self) -> Result<String> {
        self.read()?;
        self.inner.database_date().await
    }
}
