//! Wall clock and the bot's calendar.
//!
//! "Today" is the calendar date at a fixed UTC offset chosen at startup, so
//! the daily cycle, due dates and confirmations all agree on one date.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use std::sync::Arc;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Reads the system clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone)]
pub struct Calendar {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl Calendar {
    pub fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { offset, clock }
    }

    /// Calendar on the system clock at `offset_hours` east of UTC
    pub fn system(offset_hours: i32) -> anyhow::Result<Self> {
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| anyhow::anyhow!("Invalid timezone offset: {offset_hours}h"))?;
        Ok(Self::new(offset, Arc::new(SystemClock)))
    }

    /// Calendar frozen at noon UTC of `date`
    pub fn fixed(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self::new(Utc.fix(), Arc::new(FixedClock(noon)))
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.now_utc().with_timezone(&self.offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// First instant at `hour`:00 UTC strictly after `now`
pub fn next_daily_instant(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let today_at = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|dt| dt.and_utc());

    match today_at {
        Some(at) if at > now => at,
        Some(at) => at + Duration::days(1),
        None => now + Duration::days(1),
    }
}
