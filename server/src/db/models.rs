use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Resolved,
    Deleted,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Open, Status::Resolved, Status::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Resolved => "resolved",
            Status::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Status::Open),
            "resolved" => Ok(Status::Resolved),
            "deleted" => Ok(Status::Deleted),
            other => Err(format!(
                "Invalid status '{}' (expected one of: open, resolved, deleted)",
                other
            )),
        }
    }
}

/// Snapshot of a message sender's display attributes at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub nickname: String,
    /// Hex color, e.g. `#ff00aa`.
    pub color: String,
    pub discriminator: String,
    pub avatar_url: String,
    pub is_bot: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp_insert: DateTime<Utc>,
}

/// An immutable chat record with its author embedded inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub parent_channel_id: Option<String>,
    #[serde(default)]
    pub community_server_id: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub has_attachment: bool,
    #[serde(default)]
    pub reference_msg_id: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp_insert: DateTime<Utc>,
    #[serde(default)]
    pub discussion_id: Option<String>,
    pub author_id: String,
    pub content: String,
    pub msg_url: String,
    pub author: Author,
}

/// A moderation case pointing at one primary message plus its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub msg_id: String,
    pub status: Status,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub ts_last_status_change: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Ids of the surrounding messages, in the order they were recorded.
    pub context_messages: Vec<String>,
}

/// Ticket with its primary message joined in, as served by `GET /tickets`.
#[derive(Debug, Clone, Serialize)]
pub struct TicketWithMessage {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub message: Message,
}

/// The whole persisted document: both collections in storage order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub tickets: Vec<Ticket>,
    pub messages: Vec<Message>,
}

/// Ticket totals per status. All three keys are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub open: usize,
    pub resolved: usize,
    pub deleted: usize,
}

impl StatusCounts {
    pub fn increment(&mut self, status: Status) {
        match status {
            Status::Open => self.open += 1,
            Status::Resolved => self.resolved += 1,
            Status::Deleted => self.deleted += 1,
        }
    }

    #[cfg(test)]
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Open => self.open,
            Status::Resolved => self.resolved,
            Status::Deleted => self.deleted,
        }
    }

    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.open + self.resolved + self.deleted
    }
}

/// Timestamp parsing for the data file.
///
/// Stored timestamps are ISO-8601. Values carrying an offset are normalized
/// to UTC; values without one are taken to already be UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {}", raw))
        })
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {}", raw))
            }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn author_json() -> serde_json::Value {
        serde_json::json!({
            "id": "42",
            "name": "alice",
            "nickname": "Alice",
            "color": "#ff00aa",
            "discriminator": "0001",
            "avatar_url": "https://cdn.example.com/a.png",
            "is_bot": false,
            "timestamp_insert": "2023-11-01T10:00:00"
        })
    }

    fn message_json() -> serde_json::Value {
        serde_json::json!({
            "id": "1169572771630678056",
            "channel_id": "c1",
            "timestamp": "2023-11-01T10:00:00.123+00:00",
            "has_attachment": false,
            "timestamp_insert": "2023-11-01T10:00:01",
            "discussion_id": null,
            "author_id": "42",
            "content": "hello",
            "msg_url": "https://chat.example.com/m/1",
            "author": author_json()
        })
    }

    #[test]
    fn test_status_lowercase_wire_format() {
        assert_eq!(serde_json::to_string(&Status::Open).unwrap(), r#""open""#);
        assert_eq!(
            serde_json::from_str::<Status>(r#""deleted""#).unwrap(),
            Status::Deleted
        );
        assert!(serde_json::from_str::<Status>(r#""archived""#).is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("resolved".parse::<Status>(), Ok(Status::Resolved));
        assert!("Resolved".parse::<Status>().is_err());
        assert!("not-a-status".parse::<Status>().is_err());
    }

    #[test]
    fn test_message_optional_fields_default_to_none() {
        let msg: Message = serde_json::from_value(message_json()).unwrap();
        assert!(msg.parent_channel_id.is_none());
        assert!(msg.community_server_id.is_none());
        assert!(msg.reference_msg_id.is_none());
        assert!(msg.discussion_id.is_none());
        assert_eq!(msg.author.nickname, "Alice");
        assert_eq!(msg.timestamp.nanosecond(), 123_000_000);
    }

    #[test]
    fn test_naive_timestamp_read_as_utc() {
        let author: Author = serde_json::from_value(author_json()).unwrap();
        assert_eq!(
            author.timestamp_insert,
            Utc.with_ymd_and_hms(2023, 11, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_offset_timestamp_normalized_to_utc() {
        let mut json = message_json();
        json["timestamp"] = "2023-11-01T12:00:00+02:00".into();
        let msg: Message = serde_json::from_value(json).unwrap();
        assert_eq!(
            msg.timestamp,
            Utc.with_ymd_and_hms(2023, 11, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_message_missing_author_fails() {
        let mut json = message_json();
        json.as_object_mut().unwrap().remove("author");
        assert!(serde_json::from_value::<Message>(json).is_err());
    }

    #[test]
    fn test_ticket_invalid_timestamp_fails() {
        let json = serde_json::json!({
            "id": "t1",
            "msg_id": "m1",
            "status": "open",
            "timestamp": "yesterday",
            "context_messages": []
        });
        assert!(serde_json::from_value::<Ticket>(json).is_err());
    }

    #[test]
    fn test_ticket_with_message_flattens_ticket_fields() {
        let ticket = Ticket {
            id: "t1".into(),
            msg_id: "1169572771630678056".into(),
            status: Status::Open,
            resolved_by: None,
            ts_last_status_change: None,
            timestamp: Utc.with_ymd_and_hms(2023, 11, 1, 10, 0, 0).unwrap(),
            context_messages: vec![],
        };
        let message: Message = serde_json::from_value(message_json()).unwrap();
        let value = serde_json::to_value(TicketWithMessage { ticket, message }).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["status"], "open");
        assert!(value["resolved_by"].is_null());
        assert!(value["ts_last_status_change"].is_null());
        assert_eq!(value["message"]["id"], "1169572771630678056");
    }

    #[test]
    fn test_status_counts() {
        let mut counts = StatusCounts::default();
        counts.increment(Status::Open);
        counts.increment(Status::Open);
        counts.increment(Status::Deleted);
        assert_eq!(counts.get(Status::Open), 2);
        assert_eq!(counts.get(Status::Resolved), 0);
        assert_eq!(counts.total(), 3);

        let value = serde_json::to_value(counts).unwrap();
        assert_eq!(value, serde_json::json!({"open": 2, "resolved": 0, "deleted": 1}));
    }
}
