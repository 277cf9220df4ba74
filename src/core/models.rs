//! Domain types shared by the dialogue engine, the scheduler and persistence
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Discord user snowflake
pub type UserId = u64;
/// Discord channel snowflake a user can be reached in
pub type ChannelId = u64;
pub type GroupId = i64;
pub type ItemId = i64;

/// A password-protected collection of shared study items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub password_hash: String,
}

impl Group {
    /// Compare a candidate password against the stored digest
    pub fn verify_password(&self, password: &str, salt: &str) -> bool {
        self.password_hash == hash_password(password, salt)
    }
}

/// A study module with its spaced-repetition position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub group_id: GroupId,
    pub url: String,
    pub name: String,
    pub next_due: NaiveDate,
    pub counter: i64,
}

/// Hex-encoded SHA-256 of `password` followed by `salt`
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Format a date the way users see it (dd.mm.yyyy)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// The groups a user belongs to, resolved once per inbound event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memberships(Vec<Group>);

impl Memberships {
    pub fn new(groups: Vec<Group>) -> Self {
        Self(groups)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn groups(&self) -> &[Group] {
        &self.0
    }

    /// The only group, when the user belongs to exactly one
    pub fn sole(&self) -> Option<&Group> {
        match self.0.as_slice() {
            [group] => Some(group),
            _ => None,
        }
    }

    pub fn contains(&self, group_id: GroupId) -> bool {
        self.0.iter().any(|g| g.id == group_id)
    }

    /// Comma-separated ids, e.g. `3, 7, 12`
    pub fn id_list(&self) -> String {
        self.0
            .iter()
            .map(|g| g.id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: GroupId) -> Group {
        Group {
            id,
            password_hash: hash_password("secret", "salt"),
        }
    }

    #[test]
    fn test_hash_is_fixed_length_hex() {
        let hash = hash_password("abc", "salt");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, "abc");
    }

    #[test]
    fn test_hash_depends_on_salt() {
        assert_ne!(hash_password("abc", "one"), hash_password("abc", "two"));
        assert_eq!(hash_password("abc", "one"), hash_password("abc", "one"));
    }

    #[test]
    fn test_verify_password() {
        let g = group(1);
        assert!(g.verify_password("secret", "salt"));
        assert!(!g.verify_password("Secret", "salt"));
        assert!(!g.verify_password("secret", "pepper"));
    }

    #[test]
    fn test_memberships() {
        let none = Memberships::default();
        assert!(none.is_empty());
        assert!(none.sole().is_none());

        let one = Memberships::new(vec![group(4)]);
        assert_eq!(one.sole().map(|g| g.id), Some(4));

        let many = Memberships::new(vec![group(3), group(7), group(12)]);
        assert!(many.sole().is_none());
        assert!(many.contains(7));
        assert!(!many.contains(8));
        assert_eq!(many.id_list(), "3, 7, 12");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_date(date), "07.03.2025");
    }
}
