//! Spaced-repetition intervals and the confirmation payload format.

use chrono::{Duration, NaiveDate};

use crate::core::models::ItemId;

/// Days until the next repetition, indexed by the counter being confirmed.
/// Counters past the end reuse the last interval.
pub const REPEAT_INTERVALS_DAYS: [i64; 6] = [1, 3, 7, 14, 30, 60];

/// Callback payload prefix for "repeated!" buttons
pub const CONFIRM_PREFIX: &str = "SETOK:";

pub fn interval_for(counter: i64) -> Duration {
    let index = usize::try_from(counter.max(0))
        .unwrap_or(usize::MAX)
        .min(REPEAT_INTERVALS_DAYS.len() - 1);
    Duration::days(REPEAT_INTERVALS_DAYS[index])
}

/// Due date of a freshly registered item
pub fn initial_due_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(1)
}

/// Due date after confirming a repetition at `counter`
pub fn next_due_date(today: NaiveDate, counter: i64) -> NaiveDate {
    today + interval_for(counter)
}

/// A confirmation button's payload: which item, at which counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub item_id: ItemId,
    pub counter: i64,
}

impl Confirmation {
    /// `SETOK:<item>.<counter>`
    pub fn encode(&self) -> String {
        format!("{CONFIRM_PREFIX}{}.{}", self.item_id, self.counter)
    }

    pub fn parse(data: &str) -> Option<Self> {
        let body = data.strip_prefix(CONFIRM_PREFIX)?;
        let (item, counter) = body.split_once('.')?;
        let item_id = item.parse::<ItemId>().ok()?;
        let counter = counter.parse::<i64>().ok()?;
        (item_id > 0 && counter >= 0).then_some(Self { item_id, counter })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_intervals_grow_then_plateau() {
        assert_eq!(interval_for(0), Duration::days(1));
        assert_eq!(interval_for(2), Duration::days(7));
        assert_eq!(interval_for(5), Duration::days(60));
        assert_eq!(interval_for(40), Duration::days(60));
        assert_eq!(interval_for(-1), Duration::days(1));
    }

    #[test]
    fn test_due_dates() {
        assert_eq!(initial_due_date(date(1, 31)), date(2, 1));
        assert_eq!(next_due_date(date(3, 1), 1), date(3, 4));
        assert_eq!(next_due_date(date(3, 1), 4), date(3, 31));
    }

    #[test]
    fn test_confirmation_payload() {
        let parsed = Confirmation::parse("SETOK:42.0").unwrap();
        assert_eq!(parsed, Confirmation { item_id: 42, counter: 0 });
        assert_eq!(parsed.encode(), "SETOK:42.0");
    }

    #[test]
    fn test_malformed_payloads() {
        for data in ["42.0", "SETOK:42", "SETOK:x.0", "SETOK:42.y", "SETOK:", "SETOK:0.1", "SETOK:5.-1"] {
            assert!(Confirmation::parse(data).is_none(), "{data} should not parse");
        }
    }
}
