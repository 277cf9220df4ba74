//! Daily reminder cycle.
//!
//! Once a day, at a configured UTC hour, overdue items are rolled forward to
//! today and everything due today is announced to the owning groups. The same
//! cycle can be triggered by hand; both paths share one lock so two cycles
//! never overlap.

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::notifier::{Notifier, NotifyReport};
use crate::core::clock::{next_daily_instant, Calendar};
use crate::core::models::ItemId;
use crate::database::Store;
use crate::transport::Messenger;

/// What started a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    Timer,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub overdue_advanced: usize,
    pub items_due: usize,
    pub notify: NotifyReport,
}

pub struct Ticker {
    store: Arc<dyn Store>,
    notifier: Notifier,
    calendar: Calendar,
    tick_hour_utc: u32,
    cycle_lock: Mutex<()>,
}

impl Ticker {
    pub fn new(
        store: Arc<dyn Store>,
        messenger: Arc<dyn Messenger>,
        calendar: Calendar,
        tick_hour_utc: u32,
    ) -> Self {
        Self {
            store,
            notifier: Notifier::new(messenger),
            calendar,
            tick_hour_utc,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Sleep until the next tick hour, run a cycle, repeat forever
    pub async fn run(self: Arc<Self>) {
        info!(
            "⏰ Reminder ticker started, daily cycle at {:02}:00 UTC",
            self.tick_hour_utc
        );

        loop {
            let now = self.calendar.now_utc();
            let next = next_daily_instant(now, self.tick_hour_utc);
            let wait = (next - now).to_std().unwrap_or(Duration::from_secs(1));
            info!("💤 Next reminder cycle at {next}");

            tokio::time::sleep(wait).await;

            if let Err(e) = self.run_cycle(CycleTrigger::Timer).await {
                error!("❌ Reminder cycle failed: {e:#}");
            }
        }
    }

    /// One full cycle. Fails when today's items or their channels cannot be
    /// loaded; an overdue-roll failure is only logged.
    pub async fn run_cycle(&self, trigger: CycleTrigger) -> Result<CycleReport> {
        let _cycle = self.cycle_lock.lock().await;

        let cycle_id = Uuid::new_v4();
        let today = self.calendar.today();
        info!("[{cycle_id}] 🔔 Reminder cycle ({trigger:?}) for {today}");

        let overdue_advanced = match self.store.advance_overdue(today).await {
            Ok(moved) => moved,
            Err(e) => {
                warn!("[{cycle_id}] Failed to roll overdue items forward: {e}");
                0
            }
        };
        if overdue_advanced > 0 {
            info!("[{cycle_id}] Rolled {overdue_advanced} overdue items to {today}");
        }

        let items = self
            .store
            .get_items_due_on(today)
            .await
            .context("Failed to load items due today")?;

        let item_ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();
        let channels = self
            .store
            .get_channels_by_items(&item_ids)
            .await
            .context("Failed to resolve reminder channels")?;

        let notify = self.notifier.notify(cycle_id, &items, &channels).await;

        info!(
            "[{cycle_id}] ✅ Cycle done: {} items due, {} greetings, {} reminders, {} failed sends",
            items.len(),
            notify.digests_sent,
            notify.reminders_sent,
            notify.failed_sends
        );

        Ok(CycleReport {
            overdue_advanced,
            items_due: items.len(),
            notify,
        })
    }
}
