//! SQLite-backed [`Store`]
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! One connection guarded by an async mutex. Dates are ISO `YYYY-MM-DD`
//! text so they compare correctly as strings inside SQL.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use sqlite::{Connection, State, Statement};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::Store;
use crate::core::models::{ChannelId, Group, GroupId, Item, ItemId, UserId};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite caps bound parameters per statement; stay well below it
const MAX_IN_LIST: usize = 500;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        password_hash TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS group_members (
        user_id INTEGER NOT NULL,
        group_id INTEGER NOT NULL REFERENCES groups(id),
        PRIMARY KEY (user_id, group_id)
    );

    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL REFERENCES groups(id),
        url TEXT NOT NULL,
        name TEXT NOT NULL,
        next_due TEXT NOT NULL,
        counter INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_items_group ON items(group_id);
    CREATE INDEX IF NOT EXISTS idx_items_next_due ON items(next_due);

    CREATE TABLE IF NOT EXISTS user_channels (
        user_id INTEGER NOT NULL,
        channel_id INTEGER NOT NULL,
        PRIMARY KEY (user_id, channel_id)
    );
";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema
    pub async fn new(path: &str) -> Result<Self> {
        let connection =
            sqlite::open(path).with_context(|| format!("Failed to open database at {path}"))?;
        let database = Self::with_connection(connection)?;
        info!("Database ready at {path}");
        Ok(database)
    }

    /// Fresh private database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(sqlite::open(":memory:")?)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection
            .execute(SCHEMA)
            .context("Failed to apply database schema")?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

fn to_sql_id(id: u64) -> i64 {
    id as i64
}

fn from_sql_id(id: i64) -> u64 {
    id as u64
}

fn to_sql_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn read_date(statement: &Statement<'_>, column: &str) -> Result<NaiveDate> {
    let raw: String = statement.read(column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .with_context(|| format!("Malformed date '{raw}' in column {column}"))
}

fn read_item(statement: &Statement<'_>) -> Result<Item> {
    Ok(Item {
        id: statement.read("id")?,
        group_id: statement.read("group_id")?,
        url: statement.read("url")?,
        name: statement.read("name")?,
        next_due: read_date(statement, "next_due")?,
        counter: statement.read("counter")?,
    })
}

fn read_group(statement: &Statement<'_>) -> Result<Group> {
    Ok(Group {
        id: statement.read("id")?,
        password_hash: statement.read("password_hash")?,
    })
}

fn collect_items(statement: &mut Statement<'_>) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    while let State::Row = statement.next()? {
        items.push(read_item(statement)?);
    }
    Ok(items)
}

fn last_insert_id(connection: &Connection) -> Result<i64> {
    let mut statement = connection.prepare("SELECT last_insert_rowid() AS id")?;
    match statement.next()? {
        State::Row => Ok(statement.read("id")?),
        State::Done => anyhow::bail!("last_insert_rowid returned no row"),
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Run `query` (which must contain `{in}`) once per chunk of `ids`, binding
/// each chunk to the IN list, and fold `(owner_id, channel_id)` rows into a map.
fn channel_map(connection: &Connection, query: &str, ids: &[i64]) -> Result<HashMap<u64, Vec<u64>>> {
    let mut map: HashMap<u64, Vec<u64>> = HashMap::new();

    for chunk in ids.chunks(MAX_IN_LIST) {
        let sql = query.replace("{in}", &placeholders(chunk.len()));
        let mut statement = connection.prepare(&sql)?;
        for (index, id) in chunk.iter().enumerate() {
            statement.bind((index + 1, *id))?;
        }

        while let State::Row = statement.next()? {
            let key: i64 = statement.read("owner_id")?;
            let channel: i64 = statement.read("channel_id")?;
            let channels = map.entry(from_sql_id(key)).or_default();
            let channel = from_sql_id(channel);
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
    }

    Ok(map)
}

#[async_trait]
impl Store for Database {
    async fn create_group(&self, password_hash: &str) -> Result<Group> {
        let connection = self.connection.lock().await;

        let mut statement = connection.prepare("INSERT INTO groups (password_hash) VALUES (?)")?;
        statement.bind((1, password_hash))?;
        statement.next()?;

        let id = last_insert_id(&connection)?;
        debug!("Created group {id}");

        Ok(Group {
            id,
            password_hash: password_hash.to_string(),
        })
    }

    async fn get_group(&self, group_id: GroupId) -> Result<Option<Group>> {
        let connection = self.connection.lock().await;

        let mut statement =
            connection.prepare("SELECT id, password_hash FROM groups WHERE id = ?")?;
        statement.bind((1, group_id))?;

        match statement.next()? {
            State::Row => Ok(Some(read_group(&statement)?)),
            State::Done => Ok(None),
        }
    }

    async fn add_user_to_group(&self, user_id: UserId, group_id: GroupId) -> Result<()> {
        let connection = self.connection.lock().await;

        let mut statement = connection
            .prepare("INSERT OR IGNORE INTO group_members (user_id, group_id) VALUES (?, ?)")?;
        statement.bind((1, to_sql_id(user_id)))?;
        statement.bind((2, group_id))?;
        statement.next()?;

        Ok(())
    }

    async fn remove_user_from_group(&self, user_id: UserId, group_id: GroupId) -> Result<()> {
        let connection = self.connection.lock().await;

        let mut statement =
            connection.prepare("DELETE FROM group_members WHERE user_id = ? AND group_id = ?")?;
        statement.bind((1, to_sql_id(user_id)))?;
        statement.bind((2, group_id))?;
        statement.next()?;

        Ok(())
    }

    async fn get_user_groups(&self, user_id: UserId) -> Result<Vec<Group>> {
        let connection = self.connection.lock().await;

        let mut statement = connection.prepare(
            "SELECT g.id, g.password_hash FROM group_members m
             INNER JOIN groups g ON g.id = m.group_id
             WHERE m.user_id = ?
             ORDER BY g.id",
        )?;
        statement.bind((1, to_sql_id(user_id)))?;

        let mut groups = Vec::new();
        while let State::Row = statement.next()? {
            groups.push(read_group(&statement)?);
        }
        Ok(groups)
    }

    async fn get_items_by_group(&self, group_id: GroupId) -> Result<Vec<Item>> {
        let connection = self.connection.lock().await;

        let mut statement = connection.prepare(
            "SELECT id, group_id, url, name, next_due, counter FROM items
             WHERE group_id = ?
             ORDER BY next_due, id",
        )?;
        statement.bind((1, group_id))?;

        collect_items(&mut statement)
    }

    async fn get_items_due_on(&self, date: NaiveDate) -> Result<Vec<Item>> {
        let connection = self.connection.lock().await;

        let mut statement = connection.prepare(
            "SELECT id, group_id, url, name, next_due, counter FROM items
             WHERE next_due = ?
             ORDER BY group_id, id",
        )?;
        statement.bind((1, to_sql_date(date).as_str()))?;

        collect_items(&mut statement)
    }

    async fn create_item(
        &self,
        group_id: GroupId,
        url: &str,
        name: &str,
        next_due: NaiveDate,
    ) -> Result<Item> {
        let connection = self.connection.lock().await;

        let mut statement = connection.prepare(
            "INSERT INTO items (group_id, url, name, next_due, counter) VALUES (?, ?, ?, ?, 0)",
        )?;
        statement.bind((1, group_id))?;
        statement.bind((2, url))?;
        statement.bind((3, name))?;
        statement.bind((4, to_sql_date(next_due).as_str()))?;
        statement.next()?;

        let id = last_insert_id(&connection)?;
        debug!("Created item {id} in group {group_id}, due {next_due}");

        Ok(Item {
            id,
            group_id,
            url: url.to_string(),
            name: name.to_string(),
            next_due,
            counter: 0,
        })
    }

    async fn advance_overdue(&self, today: NaiveDate) -> Result<usize> {
        let connection = self.connection.lock().await;
        let today = to_sql_date(today);

        let mut statement =
            connection.prepare("UPDATE items SET next_due = ? WHERE next_due < ?")?;
        statement.bind((1, today.as_str()))?;
        statement.bind((2, today.as_str()))?;
        statement.next()?;

        Ok(connection.change_count())
    }

    async fn advance_if_counter(
        &self,
        item_id: ItemId,
        expected_counter: i64,
        new_due: NaiveDate,
    ) -> Result<bool> {
        let connection = self.connection.lock().await;

        let mut statement = connection.prepare(
            "UPDATE items SET next_due = MAX(next_due, ?), counter = counter + 1
             WHERE id = ? AND counter = ?",
        )?;
        statement.bind((1, to_sql_date(new_due).as_str()))?;
        statement.bind((2, item_id))?;
        statement.bind((3, expected_counter))?;
        statement.next()?;

        Ok(connection.change_count() > 0)
    }

    async fn bind_channel(&self, user_id: UserId, channel_id: ChannelId) -> Result<()> {
        let connection = self.connection.lock().await;

        let mut statement = connection
            .prepare("INSERT OR IGNORE INTO user_channels (user_id, channel_id) VALUES (?, ?)")?;
        statement.bind((1, to_sql_id(user_id)))?;
        statement.bind((2, to_sql_id(channel_id)))?;
        statement.next()?;

        Ok(())
    }

    async fn get_channels_by_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, Vec<ChannelId>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<i64> = user_ids.iter().copied().map(to_sql_id).collect();
        let connection = self.connection.lock().await;

        channel_map(
            &connection,
            "SELECT user_id AS owner_id, channel_id FROM user_channels
             WHERE user_id IN ({in})
             ORDER BY user_id, channel_id",
            &ids,
        )
    }

    async fn get_channels_by_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, Vec<ChannelId>>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let connection = self.connection.lock().await;

        let by_item = channel_map(
            &connection,
            "SELECT DISTINCT i.id AS owner_id, c.channel_id FROM items i
             INNER JOIN group_members m ON m.group_id = i.group_id
             INNER JOIN user_channels c ON c.user_id = m.user_id
             WHERE i.id IN ({in})
             ORDER BY i.id, c.channel_id",
            item_ids,
        )?;

        Ok(by_item
            .into_iter()
            .map(|(item, channels)| (item as ItemId, channels))
            .collect())
    }

    async fn database_date(&self) -> Result<String> {
        let connection = self.connection.lock().await;

        let mut statement = connection.prepare("SELECT date('now') AS today")?;
        match statement.next()? {
            State::Row => Ok(statement.read("today")?),
            State::Done => anyhow::bail!("date('now') returned no row"),
        }
    }
}
