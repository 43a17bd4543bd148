use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a harvested email record. The harvest itself only
/// ever emits `Pending`; downstream consumers transition records further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Processed,
    Failed,
}

/// A saved copy of one message attachment. The `path` is guaranteed to
/// exist on disk at the moment the record is handed out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub path: PathBuf,
    /// Filename as declared on the message.
    pub name: String,
    /// Fresh identifier generated at save time, never derived from content.
    pub id: Uuid,
}

/// Structured result for one scanned message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    pub name: String,
    pub subject: String,
    pub conversation_id: String,
    #[serde(rename = "from")]
    pub from_address: String,
    #[serde(rename = "sender")]
    pub sender_name: String,
    pub body: String,
    pub files: Vec<AttachmentRecord>,
    pub status: RecordStatus,
}

/// Criteria narrowing a mailbox scan.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    /// Matched anywhere in the subject via the store's LIKE semantics.
    /// `%` and `_` are passed through unescaped and act as wildcards.
    pub subject_substring: String,
    /// Only messages received at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// When true, read and unread messages alike are admitted.
    pub include_read: bool,
}

/// An outbound message draft, consumed by `MailSender::send`.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub attachments: Vec<PathBuf>,
    pub embedded_images: Vec<PathBuf>,
}

impl OutboundMessage {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }
}
