//! # Feature: Conversation Sessions
//!
//! Per-user conversation state: the dialogue state tag plus a scratch map of
//! partial input collected across a multi-step flow. Backed by DashMap, so
//! users on different shards never contend. Nothing is persisted; a restart
//! puts every user back in [`DialogueState::Idle`].
//!
//! Also hands out a per-user turn lock so one user's events are handled one
//! at a time, in arrival order of lock acquisition. A user's lock is dropped
//! once the last turn holding or awaiting it ends.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Release idle turn locks instead of keeping one per user ever seen
//! - 1.1.0: Per-user turn lock to serialize a user's own events
//! - 1.0.0: Initial release with state tags and scratch values

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::models::UserId;

/// Where a user is inside a multi-step flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingGroupPassword,
    AwaitingGroupIdToJoin,
    AwaitingJoinPassword,
    AwaitingItemUrl,
    AwaitingItemName,
    AwaitingGroupChoiceForItem,
    AwaitingGroupChoiceForFullSubmission,
    AwaitingGroupChoiceToLeave,
}

impl DialogueState {
    pub const ALL: [DialogueState; 9] = [
        DialogueState::Idle,
        DialogueState::AwaitingGroupPassword,
        DialogueState::AwaitingGroupIdToJoin,
        DialogueState::AwaitingJoinPassword,
        DialogueState::AwaitingItemUrl,
        DialogueState::AwaitingItemName,
        DialogueState::AwaitingGroupChoiceForItem,
        DialogueState::AwaitingGroupChoiceForFullSubmission,
        DialogueState::AwaitingGroupChoiceToLeave,
    ];

    pub fn is_idle(self) -> bool {
        self == DialogueState::Idle
    }
}

/// Scratch keys used by the dialogue flows
pub mod scratch {
    /// Group chosen in the join flow, awaiting its password
    pub const JOIN_GROUP_ID: &str = "join.group_id";
    /// Group chosen for a guided item submission
    pub const ITEM_GROUP_ID: &str = "item.group_id";
    pub const ITEM_URL: &str = "item.url";
    /// Raw one-message submission waiting for a group choice
    pub const FULL_SUBMISSION: &str = "full.submission";
}

#[derive(Debug, Default)]
struct UserSession {
    state: DialogueState,
    scratch: HashMap<String, String>,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, UserSession>,
    turns: Arc<TurnLocks>,
}

type TurnLocks = DashMap<UserId, Arc<Mutex<()>>>;

/// Exclusive hold on one user's turn. Releases the lock entry on drop when
/// no other turn is waiting for it.
pub struct TurnGuard {
    user: UserId,
    guard: Option<OwnedMutexGuard<()>>,
    turns: Arc<TurnLocks>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.turns
            .remove_if(&self.user, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state; users never seen are [`DialogueState::Idle`]
    pub fn state(&self, user: UserId) -> DialogueState {
        self.sessions
            .get(&user)
            .map(|session| session.state)
            .unwrap_or_default()
    }

    pub fn set_state(&self, user: UserId, state: DialogueState) {
        self.sessions.entry(user).or_default().state = state;
    }

    pub fn scratch(&self, user: UserId, key: &str) -> Option<String> {
        self.sessions
            .get(&user)
            .and_then(|session| session.scratch.get(key).cloned())
    }

    pub fn set_scratch(&self, user: UserId, key: &str, value: impl Into<String>) {
        self.sessions
            .entry(user)
            .or_default()
            .scratch
            .insert(key.to_string(), value.into());
    }

    /// Back to idle with every scratch value dropped
    pub fn reset(&self, user: UserId) {
        self.sessions.remove(&user);
    }

    /// Wait for exclusive handling of this user's next event
    pub async fn begin_turn(&self, user: UserId) -> TurnGuard {
        let lock = self
            .turns
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        TurnGuard {
            user,
            guard: Some(lock.lock_owned().await),
            turns: self.turns.clone(),
        }
    }

    #[cfg(test)]
    fn tracked_turns(&self) -> usize {
        self.turns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unknown_user_is_idle() {
        let store = SessionStore::new();
        assert_eq!(store.state(42), DialogueState::Idle);
        assert_eq!(store.scratch(42, scratch::ITEM_URL), None);
    }

    #[test]
    fn test_state_and_scratch_roundtrip() {
        let store = SessionStore::new();
        store.set_state(1, DialogueState::AwaitingItemName);
        store.set_scratch(1, scratch::ITEM_URL, "http://x.com/a");

        assert_eq!(store.state(1), DialogueState::AwaitingItemName);
        assert_eq!(store.scratch(1, scratch::ITEM_URL).as_deref(), Some("http://x.com/a"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = SessionStore::new();
        store.set_state(1, DialogueState::AwaitingJoinPassword);
        store.set_scratch(1, scratch::JOIN_GROUP_ID, "5");

        store.reset(1);
        assert_eq!(store.state(1), DialogueState::Idle);
        assert_eq!(store.scratch(1, scratch::JOIN_GROUP_ID), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_users_are_isolated() {
        let store = Arc::new(SessionStore::new());
        let mut tasks = Vec::new();

        for user in 0..32u64 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for round in 0..200 {
                    let value = format!("{user}:{round}");
                    store.set_scratch(user, scratch::ITEM_URL, value.clone());
                    store.set_state(user, DialogueState::AwaitingItemName);
                    assert_eq!(store.scratch(user, scratch::ITEM_URL), Some(value));
                    if round % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for user in 0..32u64 {
            assert_eq!(store.state(user), DialogueState::AwaitingItemName);
            assert_eq!(
                store.scratch(user, scratch::ITEM_URL),
                Some(format!("{user}:199"))
            );
        }
    }

    #[tokio::test]
    async fn test_turns_serialize_one_user() {
        let store = Arc::new(SessionStore::new());
        let first = store.begin_turn(7).await;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let _turn = store.begin_turn(7).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // Another user is not blocked
        let other = tokio::time::timeout(Duration::from_millis(100), store.begin_turn(8)).await;
        assert!(other.is_ok());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_finished_turns_release_their_locks() {
        let store = Arc::new(SessionStore::new());
        let first = store.begin_turn(7).await;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let _turn = store.begin_turn(7).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.tracked_turns(), 1);

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.tracked_turns(), 0);

        for user in 0..100u64 {
            let _turn = store.begin_turn(user).await;
        }
        assert_eq!(store.tracked_turns(), 0);
    }
}
