// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for normalized events and attachments.
//!
//! Each builder keeps the raw host JSON in step with the normalized data,
//! shaped like a OneBot v11 message event.

use chrono::NaiveDateTime;
use keepsake_core::types::TIMESTAMP_FORMAT;
use keepsake_core::{
    Attachment, Bundle, BundleId, ConversationKind, Event, ForwardedMessage, Media,
};
use serde_json::{Value, json};

/// Base URL of media produced by the attachment helpers.
pub const MEDIA_BASE_URL: &str = "http://cdn.test";

fn media(file: &str) -> Media {
    Media {
        url: Some(format!("{MEDIA_BASE_URL}/{file}")),
        file: file.to_string(),
    }
}

pub fn image(file: &str) -> Attachment {
    Attachment::Image(media(file))
}

pub fn video(file: &str) -> Attachment {
    Attachment::Video(media(file))
}

pub fn audio(file: &str) -> Attachment {
    Attachment::Audio(media(file))
}

pub fn file(name: &str) -> Attachment {
    Attachment::File(media(name))
}

/// A forward bundle whose entries carry the given attachment lists.
pub fn forward(id: &str, messages: Vec<Vec<Attachment>>) -> Attachment {
    let content: Vec<Value> = messages
        .iter()
        .map(|attachments| json!({ "message": attachments.iter().map(segment).collect::<Vec<_>>() }))
        .collect();

    Attachment::Forward(Bundle {
        id: BundleId::from(id),
        raw: json!({ "id": id, "content": content }),
        messages: messages
            .into_iter()
            .map(|attachments| ForwardedMessage { attachments })
            .collect(),
    })
}

/// The OneBot segment corresponding to an attachment.
pub fn segment(attachment: &Attachment) -> Value {
    let kind = attachment.kind().to_string();
    match attachment {
        Attachment::Image(m) | Attachment::Video(m) | Attachment::Audio(m) | Attachment::File(m) => {
            let kind = if kind == "audio" { "record".to_string() } else { kind };
            json!({ "type": kind, "data": { "file": m.file, "url": m.url } })
        }
        Attachment::Forward(bundle) => json!({ "type": "forward", "data": bundle.raw }),
        Attachment::Other { kind } => json!({ "type": kind, "data": {} }),
    }
}

/// Builds an [`Event`] together with its raw JSON.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    id: i64,
    conversation_id: i64,
    kind: ConversationKind,
    timestamp: NaiveDateTime,
    attachments: Vec<Attachment>,
    segments: Vec<Value>,
}

impl EventBuilder {
    pub fn group(group_id: i64, id: i64) -> Self {
        Self::new(ConversationKind::Group, group_id, id)
    }

    pub fn direct(user_id: i64, id: i64) -> Self {
        Self::new(ConversationKind::Direct, user_id, id)
    }

    fn new(kind: ConversationKind, conversation_id: i64, id: i64) -> Self {
        Self {
            id,
            conversation_id,
            kind,
            timestamp: NaiveDateTime::default(),
            attachments: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Sets the timestamp from `%Y-%m-%d %H-%M-%S`.
    ///
    /// # Panics
    ///
    /// Panics on a malformed timestamp; builders are only used in tests.
    pub fn at(mut self, timestamp: &str) -> Self {
        self.timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .unwrap_or_else(|e| panic!("bad test timestamp `{timestamp}`: {e}"));
        self
    }

    pub fn at_time(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.attachments.push(Attachment::Other {
            kind: "text".into(),
        });
        self.segments
            .push(json!({ "type": "text", "data": { "text": text } }));
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.segments.push(segment(&attachment));
        self.attachments.push(attachment);
        self
    }

    pub fn build(self) -> Event {
        let (message_type, id_key) = match self.kind {
            ConversationKind::Group => ("group", "group_id"),
            ConversationKind::Direct => ("private", "user_id"),
        };
        let mut raw = json!({
            "post_type": "message",
            "message_type": message_type,
            "message_id": self.id,
            "time": self.timestamp.and_utc().timestamp(),
            "message": self.segments,
        });
        raw[id_key] = json!(self.conversation_id);

        Event {
            id: self.id,
            conversation_id: self.conversation_id,
            conversation_kind: self.kind,
            timestamp: self.timestamp,
            attachments: self.attachments,
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_json_mirrors_attachments() {
        let event = EventBuilder::group(9, 3)
            .at("2024-01-01 00-00-01")
            .attach(image("a.jpg"))
            .text("hi")
            .build();

        assert_eq!(event.raw["group_id"], 9);
        assert_eq!(event.raw["message"][0]["type"], "image");
        assert_eq!(event.raw["message"][0]["data"]["url"], "http://cdn.test/a.jpg");
        assert_eq!(event.raw["message"][1]["data"]["text"], "hi");
        assert_eq!(event.attachments.len(), 2);
    }

    #[test]
    fn at_time_sets_timestamp_and_raw_time() {
        let when = chrono::NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let event = EventBuilder::direct(4, 1).at_time(when).attach(file("a.pdf")).build();

        assert_eq!(event.timestamp, when);
        assert_eq!(event.raw["time"], when.and_utc().timestamp());
        assert_eq!(event.raw["user_id"], 4);
        assert_eq!(event.raw["message"][0]["type"], "file");
    }

    #[test]
    fn forward_raw_nests_content() {
        let Attachment::Forward(bundle) = forward("f1", vec![vec![video("v.mp4")]]) else {
            panic!("expected forward");
        };
        assert_eq!(bundle.raw["content"][0]["message"][0]["type"], "video");
        assert_eq!(bundle.messages.len(), 1);
    }
}
