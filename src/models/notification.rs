//! Warning and inbox models

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Text alerted for a warning that arrives without a message
pub const DEFAULT_WARNING_MESSAGE: &str = "You have received a warning from the moderators";

/// Moderation warning issued to a user.
///
/// Decoding is lenient: one malformed entry must not hide the rest of the
/// list, so every field falls back to a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        deserialize_with = "loose_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub seen: bool,
    /// When the warning was issued
    #[serde(
        default,
        deserialize_with = "loose_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub at: Option<DateTime<Utc>>,
}

impl Warning {
    /// Key used to remember that this warning was already alerted.
    ///
    /// Older records carry no `_id`; their timestamp identifies them, and
    /// failing that the message text.
    pub fn alert_key(&self) -> String {
        match (&self.id, &self.at) {
            (Some(id), _) => id.clone(),
            (None, Some(at)) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
            (None, None) => format!("message:{}", self.message),
        }
    }

    /// Text to show when alerting this warning
    pub fn display_message(&self) -> &str {
        if self.message.trim().is_empty() {
            DEFAULT_WARNING_MESSAGE
        } else {
            &self.message
        }
    }
}

/// Accept string or numeric ids
fn loose_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Unparseable timestamps decode as `None`
fn loose_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        _ => None,
    })
}

/// `GET /auth/warnings`
#[derive(Debug, Clone, Deserialize)]
pub struct WarningsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

impl WarningsResponse {
    pub fn unseen(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(|w| !w.seen)
    }
}

/// Direct or broadcast message in the user's inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub read: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /messages/inbox`
#[derive(Debug, Clone, Deserialize)]
pub struct InboxResponse {
    #[serde(default)]
    pub messages: Vec<InboxMessage>,
}

impl InboxResponse {
    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.read).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alert_key_prefers_id() {
        let w: Warning = serde_json::from_value(json!({
            "_id": "w1", "message": "Spam", "seen": false, "at": "2024-03-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(w.alert_key(), "w1");

        let w: Warning = serde_json::from_value(json!({
            "message": "Spam", "at": "2024-03-01T10:00:00.000Z"
        }))
        .unwrap();
        assert!(!w.seen);
        assert_eq!(w.alert_key(), "2024-03-01T10:00:00.000Z");
    }

    #[test]
    fn test_sparse_warnings_still_decode() {
        let res: WarningsResponse = serde_json::from_value(json!({
            "success": true,
            "warnings": [
                { "id": 1, "seen": false },
                { "id": 2, "seen": false },
                { "_id": "w3", "message": "Late", "at": "not a date" },
                { "message": "Spam" }
            ]
        }))
        .unwrap();
        assert_eq!(res.warnings.len(), 4);
        assert_eq!(res.warnings[0].alert_key(), "1");
        assert_eq!(res.warnings[1].alert_key(), "2");
        assert_eq!(res.warnings[0].display_message(), DEFAULT_WARNING_MESSAGE);
        assert_eq!(res.warnings[2].at, None);
        assert_eq!(res.warnings[2].alert_key(), "w3");
        assert_eq!(res.warnings[3].alert_key(), "message:Spam");
        assert_eq!(res.unseen().count(), 4);
    }

    #[test]
    fn test_unseen_filters() {
        let res: WarningsResponse = serde_json::from_value(json!({
            "success": true,
            "warnings": [
                { "message": "a", "seen": true, "at": "2024-03-01T10:00:00Z" },
                { "message": "b", "seen": false, "at": "2024-03-02T10:00:00Z" }
            ]
        }))
        .unwrap();
        assert_eq!(res.unseen().count(), 1);

        let inbox: InboxResponse = serde_json::from_value(json!({
            "messages": [
                { "_id": "m1", "read": false, "subject": "Hi" },
                { "_id": "m2", "read": true },
                { "_id": "m3" }
            ]
        }))
        .unwrap();
        assert_eq!(inbox.unread_count(), 2);
        assert_eq!(inbox.messages[0].extra["subject"], "Hi");
    }
}
