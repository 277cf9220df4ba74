//! Runtime configuration loaded from the environment (and `.env` via dotenvy)
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Context as _, Result};

use super::models::UserId;

pub const DEFAULT_DATABASE_PATH: &str = "quizlet_reminder.db";
pub const DEFAULT_TICK_HOUR_UTC: u32 = 3;
pub const DEFAULT_TIMEZONE_OFFSET_HOURS: i32 = 7;
pub const DEFAULT_PASSWORD_SALT: &str = "quizlet-reminder";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_path: String,
    pub log_level: String,
    /// Hour (UTC) at which the daily cycle runs
    pub tick_hour_utc: u32,
    /// Offset east of UTC that defines the calendar "today"
    pub timezone_offset_hours: i32,
    /// Users allowed to trigger a cycle by hand; empty means everyone
    pub operator_user_ids: Vec<UserId>,
    pub password_salt: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token =
            get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let tick_hour_utc = match get("TICK_HOUR_UTC") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|h| *h < 24)
                .ok_or_else(|| anyhow!("TICK_HOUR_UTC must be an hour between 0 and 23, got '{raw}'"))?,
            None => DEFAULT_TICK_HOUR_UTC,
        };

        let timezone_offset_hours = match get("TIMEZONE_OFFSET_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|h| (-12..=14).contains(h))
                .ok_or_else(|| {
                    anyhow!("TIMEZONE_OFFSET_HOURS must be between -12 and 14, got '{raw}'")
                })?,
            None => DEFAULT_TIMEZONE_OFFSET_HOURS,
        };

        let operator_user_ids = match get("OPERATOR_USER_IDS") {
            Some(raw) => parse_user_ids(&raw).context("Invalid OPERATOR_USER_IDS")?,
            None => Vec::new(),
        };

        Ok(Config {
            discord_token,
            database_path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            tick_hour_utc,
            timezone_offset_hours,
            operator_user_ids,
            password_salt: get("PASSWORD_SALT")
                .unwrap_or_else(|| DEFAULT_PASSWORD_SALT.to_string()),
        })
    }
}

fn parse_user_ids(raw: &str) -> Result<Vec<UserId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<UserId>()
                .with_context(|| format!("'{part}' is not a user id"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DISCORD_TOKEN", "token")]).unwrap();
        assert_eq!(config.discord_token, "token");
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.tick_hour_utc, 3);
        assert_eq!(config.timezone_offset_hours, 7);
        assert!(config.operator_user_ids.is_empty());
        assert_eq!(config.password_salt, DEFAULT_PASSWORD_SALT);
    }

    #[test]
    fn test_token_required() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "token"),
            ("DATABASE_PATH", "/data/bot.db"),
            ("TICK_HOUR_UTC", "5"),
            ("TIMEZONE_OFFSET_HOURS", "-3"),
            ("OPERATOR_USER_IDS", "111, 222,"),
            ("PASSWORD_SALT", "pepper"),
        ])
        .unwrap();

        assert_eq!(config.database_path, "/data/bot.db");
        assert_eq!(config.tick_hour_utc, 5);
        assert_eq!(config.timezone_offset_hours, -3);
        assert_eq!(config.operator_user_ids, vec![111, 222]);
        assert_eq!(config.password_salt, "pepper");
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("TICK_HOUR_UTC", "24")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("TICK_HOUR_UTC", "three")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("TIMEZONE_OFFSET_HOURS", "15")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("OPERATOR_USER_IDS", "12,abc")]).is_err());
    }
}
