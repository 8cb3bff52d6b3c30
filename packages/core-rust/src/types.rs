use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `strftime` pattern for the `Item-Timestamp` header: `2024-01-02 15:04:05+0000`.
pub const TIMESTAMP_HEADER_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Identifier of a stored item, unique within its store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of the user owning an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Envelope returned by a [`Store`](crate::Store) for every item version.
///
/// `id` together with `rev` identifies one version of an item. Stores start
/// `rev` at a baseline of their choosing and must strictly increase it on
/// every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    /// Item identifier.
    pub id: ItemId,
    /// Owning user.
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// Revision counter of this version.
    pub rev: u64,
    /// Creation time of this version.
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
}

impl ItemInfo {
    /// Renders the timestamp for the `Item-Timestamp` response header.
    #[must_use]
    pub fn header_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_HEADER_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    fn info_at(secs: i64) -> ItemInfo {
        ItemInfo {
            id: ItemId::from("a1"),
            user_id: UserId::from("u1"),
            rev: 1,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn header_timestamp_uses_numeric_offset() {
        let info = ItemInfo {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap(),
            ..info_at(0)
        };
        assert_eq!(info.header_timestamp(), "2024-01-02 15:04:05+0000");
    }

    #[test]
    fn envelope_json_keys() {
        let json = serde_json::to_value(info_at(0)).unwrap();
        assert_eq!(json["id"], "a1");
        assert_eq!(json["user"], "u1");
        assert_eq!(json["rev"], 1);
        assert!(json["ts"].is_string());
    }

    #[test]
    fn ids_display_as_plain_strings() {
        assert_eq!(ItemId::from("x-9").to_string(), "x-9");
        assert_eq!(UserId::from(String::from("bob")).as_str(), "bob");
    }

    proptest! {
        #[test]
        fn header_timestamp_is_fixed_width(secs in 0i64..4_102_444_800) {
            let rendered = info_at(secs).header_timestamp();
            prop_assert_eq!(rendered.len(), 24);
            prop_assert!(rendered.ends_with("+0000"));
        }
    }
}
