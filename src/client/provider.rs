use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Narrow interface over the desktop mail client's object model. The rest
/// of the crate depends only on this capability set, never on a concrete
/// automation binding.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Liveness check against the client binding.
    async fn health_check(&self) -> Result<()>;

    /// Names of the immediate child folders of the store's top-level inbox.
    async fn list_folders(&self) -> Result<Vec<String>>;

    /// Messages of `folder` matching `query`, sorted by received time,
    /// most recent first. Filtering uses the store's native LIKE
    /// semantics: `%` matches any run of characters and `_` exactly one.
    async fn query_messages(
        &self,
        folder: &str,
        query: &MessageQuery,
    ) -> Result<Vec<MessageHandle>>;

    /// Attachments declared on a message.
    async fn list_attachments(&self, message: &MessageHandle) -> Result<Vec<AttachmentHandle>>;

    /// Persist an attachment's bytes to `destination`, overwriting any
    /// existing file.
    async fn save_attachment(
        &self,
        attachment: &AttachmentHandle,
        destination: &Path,
    ) -> Result<()>;

    /// SMTP address of the message sender, resolved through the store's
    /// directory. Fails when the directory entry is unavailable.
    async fn resolve_sender(&self, message: &MessageHandle) -> Result<String>;

    /// Hand one message to the client's send queue.
    async fn submit(&self, submission: &Submission) -> Result<()>;
}

/// Store-side message filter.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    /// Raw LIKE pattern matched against the subject.
    pub subject_like: String,
    /// Lower bound on received time, inclusive.
    pub since: Option<DateTime<Utc>>,
}

/// Reference to one message, carrying the metadata the harvest needs.
#[derive(Debug, Clone)]
pub struct MessageHandle {
    pub id: String,
    pub subject: String,
    pub conversation_id: String,
    pub sender_name: String,
    pub body: String,
    pub unread: bool,
    pub received_at: DateTime<Utc>,
}

/// Reference to one attachment on a message.
#[derive(Debug, Clone)]
pub struct AttachmentHandle {
    pub id: String,
    pub file_name: String,
}

/// Fully prepared outbound message as handed to the client.
#[derive(Debug, Clone)]
pub struct Submission {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    /// Existence-checked paths, attached as regular files.
    pub attachments: Vec<PathBuf>,
    pub inline_images: Vec<InlinePart>,
}

/// An attachment tagged for inline rendering inside the message body.
#[derive(Debug, Clone)]
pub struct InlinePart {
    pub path: PathBuf,
    /// Content identifier the body can reference; the rendering client
    /// shows the part inline instead of listing it as an attachment.
    pub content_id: String,
}
