// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized event and attachment types shared across the archiver.
//!
//! Host payloads are converted into these types exactly once, at the
//! ingestion boundary. Everything downstream matches on [`Attachment`]
//! instead of inspecting loosely-typed JSON.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// `strftime` format used for archive file names and grouper input.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// `strftime` format of the day label used for bucket directories.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Whether an event came from a group conversation or a direct one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Group,
    Direct,
}

/// Attachment kind tag, used for classification and logging.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    File,
    Forward,
    Other,
}

impl AttachmentKind {
    /// Kinds that put an event into a session bucket.
    pub fn is_archivable(self) -> bool {
        !matches!(self, AttachmentKind::Other)
    }
}

/// Identifier of a forwarded-message bundle.
///
/// Hosts emit these both as JSON numbers and as strings, so the id is kept
/// in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BundleId(pub String);

impl BundleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BundleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for BundleId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for BundleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(n) => BundleId(n.to_string()),
            Repr::Text(s) => BundleId(s),
        })
    }
}

/// A downloadable media payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    /// Remote location of the payload. `None` when the host omitted it.
    pub url: Option<String>,
    /// File name to use inside the output directory.
    pub file: String,
}

/// One message carried inside a forward bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardedMessage {
    pub attachments: Vec<Attachment>,
}

/// A forwarded-message container, possibly nesting further bundles.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub id: BundleId,
    pub messages: Vec<ForwardedMessage>,
    /// The host's forward payload as received, written as the bundle snapshot.
    pub raw: serde_json::Value,
}

/// A single attachment on an event or forwarded message.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Image(Media),
    Video(Media),
    Audio(Media),
    File(Media),
    Forward(Bundle),
    /// Anything else the host sends (text, faces, replies, ...).
    Other { kind: String },
}

impl Attachment {
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Attachment::Image(_) => AttachmentKind::Image,
            Attachment::Video(_) => AttachmentKind::Video,
            Attachment::Audio(_) => AttachmentKind::Audio,
            Attachment::File(_) => AttachmentKind::File,
            Attachment::Forward(_) => AttachmentKind::Forward,
            Attachment::Other { .. } => AttachmentKind::Other,
        }
    }
}

/// A chat event received from the host runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    /// Group id for group events, peer user id for direct events.
    pub conversation_id: i64,
    pub conversation_kind: ConversationKind,
    /// Local wall-clock time of the event, second resolution.
    pub timestamp: NaiveDateTime,
    pub attachments: Vec<Attachment>,
    /// The host payload as received.
    pub raw: serde_json::Value,
}

impl Event {
    /// Kind of the first attachment, which decides how the event is archived.
    pub fn first_kind(&self) -> Option<AttachmentKind> {
        self.attachments.first().map(Attachment::kind)
    }

    /// Timestamp rendered with [`TIMESTAMP_FORMAT`].
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role of an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Fetcher,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_event(attachments: Vec<Attachment>) -> Event {
        Event {
            id: 7,
            conversation_id: 42,
            conversation_kind: ConversationKind::Group,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 5, 3)
                .unwrap(),
            attachments,
            raw: serde_json::json!({}),
        }
    }

    #[test]
    fn bundle_id_accepts_numbers_and_strings() {
        let from_number: BundleId = serde_json::from_str("7301").unwrap();
        let from_text: BundleId = serde_json::from_str("\"7301\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(from_number.as_str(), "7301");
    }

    #[test]
    fn only_other_is_not_archivable() {
        assert!(AttachmentKind::Image.is_archivable());
        assert!(AttachmentKind::Audio.is_archivable());
        assert!(AttachmentKind::Forward.is_archivable());
        assert!(!AttachmentKind::Other.is_archivable());
    }

    #[test]
    fn first_kind_looks_at_first_attachment_only() {
        let event = sample_event(vec![
            Attachment::Other { kind: "text".into() },
            Attachment::Image(Media {
                url: Some("http://x/a.jpg".into()),
                file: "a.jpg".into(),
            }),
        ]);
        assert_eq!(event.first_kind(), Some(AttachmentKind::Other));
        assert_eq!(sample_event(vec![]).first_kind(), None);
    }

    #[test]
    fn formatted_timestamp_uses_dashes_for_time() {
        assert_eq!(sample_event(vec![]).formatted_timestamp(), "2024-01-01 09-05-03");
    }

    #[test]
    fn kind_names_are_lowercase() {
        use std::str::FromStr;
        assert_eq!(AttachmentKind::Forward.to_string(), "forward");
        assert_eq!(ConversationKind::from_str("direct").unwrap(), ConversationKind::Direct);
    }
}
