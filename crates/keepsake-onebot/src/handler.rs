// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OneBot event filtering and normalization.
//!
//! Decides whether a host payload is a chat message worth archiving and
//! converts it into a channel-agnostic [`Event`].

use chrono::{DateTime, Local, NaiveDateTime};
use keepsake_core::{ConversationKind, Event, KeepsakeError};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::segments::{self, RawMessage};

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    post_type: String,
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    message_id: Option<i64>,
    #[serde(default)]
    group_id: Option<i64>,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    message: RawMessage,
}

/// Maps a OneBot `message_type` onto a conversation kind.
///
/// Anything other than group and private chats returns `None`.
pub fn conversation_kind(message_type: &str) -> Option<ConversationKind> {
    match message_type {
        "group" => Some(ConversationKind::Group),
        "private" => Some(ConversationKind::Direct),
        _ => None,
    }
}

/// Converts a raw OneBot payload into an [`Event`].
///
/// Returns `Ok(None)` for payloads that are not group or private chat
/// messages (heartbeats, notices, requests, guild messages). Message events
/// missing their ids are an error.
pub fn to_event(raw: Value) -> Result<Option<Event>, KeepsakeError> {
    let parsed = RawEvent::deserialize(&raw).map_err(|e| KeepsakeError::Channel {
        message: format!("malformed OneBot event: {e}"),
        source: Some(Box::new(e)),
    })?;

    if parsed.post_type != "message" {
        debug!(post_type = %parsed.post_type, "ignoring non-message event");
        return Ok(None);
    }

    let message_type = parsed.message_type.as_deref().unwrap_or_default();
    let Some(kind) = conversation_kind(message_type) else {
        debug!(message_type, "ignoring unsupported message type");
        return Ok(None);
    };

    let id = parsed.message_id.ok_or_else(|| missing("message_id"))?;
    let conversation_id = match kind {
        ConversationKind::Group => parsed.group_id.ok_or_else(|| missing("group_id"))?,
        ConversationKind::Direct => parsed.user_id.ok_or_else(|| missing("user_id"))?,
    };

    Ok(Some(Event {
        id,
        conversation_id,
        conversation_kind: kind,
        timestamp: local_time(parsed.time),
        attachments: segments::attachments(&parsed.message),
        raw,
    }))
}

fn missing(field: &str) -> KeepsakeError {
    KeepsakeError::Channel {
        message: format!("OneBot message event without `{field}`"),
        source: None,
    }
}

/// Local wall-clock time of a unix timestamp, or now when absent.
fn local_time(unix: Option<i64>) -> NaiveDateTime {
    unix.and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .unwrap_or_else(|| Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_core::{Attachment, AttachmentKind};
    use serde_json::json;

    fn group_event() -> Value {
        json!({
            "post_type": "message",
            "message_type": "group",
            "sub_type": "normal",
            "message_id": 1001,
            "group_id": 500,
            "user_id": 42,
            "time": 1_704_103_200,
            "message": [
                {"type": "image", "data": {"file": "a.jpg", "url": "http://h/a.jpg"}}
            ]
        })
    }

    #[test]
    fn group_message_uses_group_id() {
        let event = to_event(group_event()).unwrap().unwrap();
        assert_eq!(event.id, 1001);
        assert_eq!(event.conversation_id, 500);
        assert_eq!(event.conversation_kind, ConversationKind::Group);
        assert_eq!(event.first_kind(), Some(AttachmentKind::Image));
        assert_eq!(event.raw["sub_type"], "normal");
    }

    #[test]
    fn private_message_uses_user_id() {
        let mut raw = group_event();
        raw["message_type"] = json!("private");
        let event = to_event(raw).unwrap().unwrap();
        assert_eq!(event.conversation_id, 42);
        assert_eq!(event.conversation_kind, ConversationKind::Direct);
    }

    #[test]
    fn timestamp_is_local_wall_clock() {
        let event = to_event(group_event()).unwrap().unwrap();
        let expected = DateTime::from_timestamp(1_704_103_200, 0)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(event.timestamp, expected);
    }

    #[test]
    fn meta_events_are_ignored() {
        let heartbeat = json!({"post_type": "meta_event", "meta_event_type": "heartbeat"});
        assert!(to_event(heartbeat).unwrap().is_none());
    }

    #[test]
    fn guild_messages_are_ignored() {
        let mut raw = group_event();
        raw["message_type"] = json!("guild");
        assert!(to_event(raw).unwrap().is_none());
    }

    #[test]
    fn group_message_without_group_id_is_error() {
        let mut raw = group_event();
        raw.as_object_mut().unwrap().remove("group_id");
        let err = to_event(raw).unwrap_err();
        assert!(err.to_string().contains("group_id"));
    }

    #[test]
    fn empty_message_has_no_attachments() {
        let mut raw = group_event();
        raw.as_object_mut().unwrap().remove("message");
        let event = to_event(raw).unwrap().unwrap();
        assert!(event.attachments.is_empty());
        assert_eq!(event.first_kind(), None);
    }

    #[test]
    fn text_only_message_is_other() {
        let mut raw = group_event();
        raw["message"] = json!([{"type": "text", "data": {"text": "hi"}}]);
        let event = to_event(raw).unwrap().unwrap();
        assert_eq!(event.attachments, vec![Attachment::Other { kind: "text".into() }]);
    }
}
