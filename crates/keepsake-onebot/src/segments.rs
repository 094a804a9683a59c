// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of OneBot message segments into [`Attachment`]s.

use keepsake_core::{Attachment, Bundle, BundleId, ForwardedMessage, Media};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// A message body: either a segment array or a CQ-coded string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawMessage {
    Segments(Vec<RawSegment>),
    Text(String),
}

impl Default for RawMessage {
    fn default() -> Self {
        RawMessage::Segments(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSegment {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RawForward {
    id: BundleId,
    #[serde(default)]
    content: Vec<RawForwardedMessage>,
}

#[derive(Debug, Deserialize)]
struct RawForwardedMessage {
    #[serde(default)]
    message: RawMessage,
}

/// Converts a message body into attachments, in order.
pub(crate) fn attachments(message: &RawMessage) -> Vec<Attachment> {
    match message {
        RawMessage::Segments(segments) => segments.iter().map(attachment).collect(),
        // String bodies carry no structured media.
        RawMessage::Text(_) => vec![Attachment::Other {
            kind: "text".into(),
        }],
    }
}

fn attachment(segment: &RawSegment) -> Attachment {
    match segment.kind.as_str() {
        "image" => Attachment::Image(media(&segment.data, "image")),
        "video" => Attachment::Video(media(&segment.data, "video")),
        "record" | "audio" => Attachment::Audio(media(&segment.data, "audio")),
        "file" => Attachment::File(media(&segment.data, "file")),
        "forward" => match bundle(&segment.data) {
            Some(bundle) => Attachment::Forward(bundle),
            None => {
                debug!(data = %segment.data, "forward segment without id");
                Attachment::Other {
                    kind: "forward".into(),
                }
            }
        },
        other => Attachment::Other {
            kind: other.to_string(),
        },
    }
}

fn bundle(data: &Value) -> Option<Bundle> {
    let forward = RawForward::deserialize(data).ok()?;
    Some(Bundle {
        id: forward.id,
        messages: forward
            .content
            .iter()
            .map(|entry| ForwardedMessage {
                attachments: attachments(&entry.message),
            })
            .collect(),
        raw: data.clone(),
    })
}

fn media(data: &Value, fallback: &str) -> Media {
    let url = data
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    let file = data
        .get("file")
        .and_then(Value::as_str)
        .and_then(safe_file_name)
        .or_else(|| url.as_deref().and_then(safe_file_name))
        .unwrap_or_else(|| fallback.to_string());
    Media { url, file }
}

/// Last path component of `name`, with query strings removed.
///
/// Hosts sometimes put a URL or an absolute path in the `file` field; only
/// the final component may be used inside an output directory.
pub(crate) fn safe_file_name(name: &str) -> Option<String> {
    let name = name.split(['?', '#']).next().unwrap_or_default();
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}
