//! Fan-out of the daily reminders.
//!
//! Every reachable channel first gets one greeting, then one message per due
//! item with a "repeated!" button. A channel reachable through several
//! members or several items still gets a single greeting per cycle.

use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::schedule::Confirmation;
use crate::core::models::{ChannelId, Item, ItemId};
use crate::core::response::escape_markdown;
use crate::transport::{Button, Keyboard, Messenger, OutboundMessage};

pub const DIGEST_TEXT: &str =
    "Доброе утро! Соскучились по модулям? А они-то как по вас?)\nВ общем, пора учиться :)";
pub const CONFIRM_BUTTON_LABEL: &str = "Повторили!";

/// What one notification pass delivered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub digests_sent: usize,
    pub reminders_sent: usize,
    pub failed_sends: usize,
}

#[derive(Clone)]
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Reminder for one item, carrying the counter it was composed at
    pub fn reminder_message(item: &Item, channel: ChannelId) -> OutboundMessage {
        let payload = Confirmation {
            item_id: item.id,
            counter: item.counter,
        }
        .encode();

        OutboundMessage::text(
            channel,
            format!("{}\n[Тыц по ссылке](<{}>)", escape_markdown(&item.name), item.url),
        )
        .markdown()
        .with_keyboard(Keyboard::new(vec![vec![Button::callback(
            CONFIRM_BUTTON_LABEL,
            payload,
        )]]))
    }

    /// Send the greeting and the reminders. Individual send failures are
    /// logged and counted; they never stop the rest of the pass.
    pub async fn notify(
        &self,
        cycle_id: Uuid,
        items: &[Item],
        channels: &HashMap<ItemId, Vec<ChannelId>>,
    ) -> NotifyReport {
        let mut report = NotifyReport::default();

        let mut greeted = HashSet::new();
        let digest_targets: Vec<ChannelId> = items
            .iter()
            .filter_map(|item| channels.get(&item.id))
            .flatten()
            .copied()
            .filter(|channel| greeted.insert(*channel))
            .collect();

        debug!(
            "[{cycle_id}] Greeting {} channels about {} items",
            digest_targets.len(),
            items.len()
        );

        for channel in digest_targets {
            match self
                .messenger
                .send(OutboundMessage::text(channel, DIGEST_TEXT))
                .await
            {
                Ok(_) => report.digests_sent += 1,
                Err(e) => {
                    warn!("[{cycle_id}] Failed to send greeting to channel {channel}: {e}");
                    report.failed_sends += 1;
                }
            }
        }

        for item in items {
            let Some(item_channels) = channels.get(&item.id) else {
                debug!("[{cycle_id}] Item {} has no reachable members", item.id);
                continue;
            };

            let mut seen = HashSet::new();
            for channel in item_channels.iter().copied().filter(|c| seen.insert(*c)) {
                match self
                    .messenger
                    .send(Self::reminder_message(item, channel))
                    .await
                {
                    Ok(_) => report.reminders_sent += 1,
                    Err(e) => {
                        warn!(
                            "[{cycle_id}] Failed to send reminder for item {} to channel {channel}: {e}",
                            item.id
                        );
                        report.failed_sends += 1;
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMessenger;
    use crate::transport::ButtonAction;
    use chrono::NaiveDate;

    fn item(id: ItemId, counter: i64) -> Item {
        Item {
            id,
            group_id: 1,
            url: format!("https://quizlet.com/{id}"),
            name: format!("Module {id}"),
            next_due: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            counter,
        }
    }

    #[test]
    fn test_reminder_message_shape() {
        let message = Notifier::reminder_message(&item(42, 3), 500);
        assert_eq!(message.channel, 500);
        assert!(message.markdown);
        assert!(message.text.starts_with("Module 42\n"));
        assert!(message.text.contains("(<https://quizlet.com/42>)"));

        let keyboard = message.keyboard.unwrap();
        assert_eq!(keyboard.labels(), vec![CONFIRM_BUTTON_LABEL]);
        assert_eq!(
            keyboard.rows[0][0].action,
            ButtonAction::Callback("SETOK:42.3".to_string())
        );
    }

    #[test]
    fn test_reminder_escapes_name() {
        let mut it = item(1, 0);
        it.name = "Part (1)".to_string();
        let message = Notifier::reminder_message(&it, 1);
        assert!(message.text.starts_with("Part \\(1\\)\n"));
    }

    #[tokio::test]
    async fn test_digest_once_per_channel() {
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone());

        let items = vec![item(1, 0), item(2, 1)];
        let channels = HashMap::from([(1, vec![100, 200]), (2, vec![200, 300])]);

        let report = notifier.notify(Uuid::new_v4(), &items, &channels).await;

        assert_eq!(report.digests_sent, 3);
        assert_eq!(report.reminders_sent, 4);
        assert_eq!(report.failed_sends, 0);
        for channel in [100, 200, 300] {
            assert_eq!(messenger.texts_to(channel).iter().filter(|t| *t == DIGEST_TEXT).count(), 1);
        }
        assert_eq!(messenger.texts_to(200).len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_channels_within_item_are_collapsed() {
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone());

        let channels = HashMap::from([(1, vec![100, 100])]);
        let report = notifier.notify(Uuid::new_v4(), &[item(1, 0)], &channels).await;

        assert_eq!(report.digests_sent, 1);
        assert_eq!(report.reminders_sent, 1);
    }

    #[tokio::test]
    async fn test_send_failures_do_not_abort() {
        let messenger = Arc::new(RecordingMessenger::new().failing_for(100));
        let notifier = Notifier::new(messenger.clone());

        let channels = HashMap::from([(1, vec![100, 200])]);
        let report = notifier.notify(Uuid::new_v4(), &[item(1, 0)], &channels).await;

        assert_eq!(report.digests_sent, 1);
        assert_eq!(report.reminders_sent, 1);
        assert_eq!(report.failed_sends, 2);
        assert_eq!(messenger.texts_to(200).len(), 2);
    }

    #[tokio::test]
    async fn test_items_without_channels_are_skipped() {
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone());

        let report = notifier
            .notify(Uuid::new_v4(), &[item(1, 0)], &HashMap::new())
            .await;
        assert_eq!(report, NotifyReport::default());
        assert!(messenger.sent().is_empty());
    }
}
