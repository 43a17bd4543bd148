use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mail_builder::headers::address::Address;
use mail_builder::MessageBuilder;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::provider::{AttachmentHandle, MailClient, MessageHandle, MessageQuery, Submission};

/// In-memory mail store implementing [`MailClient`]. Backs the crate's own
/// tests and lets downstream consumers exercise harvest and send flows
/// without a desktop client. Submitted messages are rendered to MIME the
/// way a real client would queue them.
#[derive(Default)]
pub struct MemoryMailClient {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    offline: bool,
    folders: Vec<MemoryFolder>,
    sent: Vec<SentMail>,
}

struct MemoryFolder {
    name: String,
    messages: Vec<MemoryMessage>,
}

/// One stored message, seedable field by field.
pub struct MemoryMessage {
    pub id: String,
    pub subject: String,
    pub conversation_id: String,
    pub sender_name: String,
    pub body: String,
    pub unread: bool,
    pub received_at: DateTime<Utc>,
    /// Directory-resolved SMTP address; `None` makes sender resolution fail.
    pub smtp_address: Option<String>,
    pub attachments: Vec<MemoryAttachment>,
}

impl MemoryMessage {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        let id = id.into();
        Self {
            conversation_id: format!("conv-{id}"),
            id,
            subject: subject.into(),
            sender_name: "Sender".to_string(),
            body: String::new(),
            unread: true,
            received_at,
            smtp_address: Some("sender@example.com".to_string()),
            attachments: Vec::new(),
        }
    }

    fn handle(&self) -> MessageHandle {
        MessageHandle {
            id: self.id.clone(),
            subject: self.subject.clone(),
            conversation_id: self.conversation_id.clone(),
            sender_name: self.sender_name.clone(),
            body: self.body.clone(),
            unread: self.unread,
            received_at: self.received_at,
        }
    }
}

/// One stored attachment.
pub struct MemoryAttachment {
    id: String,
    pub file_name: String,
    pub content: Vec<u8>,
    /// When set, saving this attachment fails with an I/O-style error.
    pub fail_save: bool,
}

impl MemoryAttachment {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            content: content.into(),
            fail_save: false,
        }
    }
}

/// A message accepted into the send queue, kept both in structured form
/// and as the rendered MIME bytes.
#[derive(Clone)]
pub struct SentMail {
    pub submission: Submission,
    pub mime: Vec<u8>,
}

impl MemoryMailClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    pub async fn add_folder(&self, name: &str) {
        self.state.lock().await.folder_mut(name);
    }

    /// Seed a message, creating the folder if needed.
    pub async fn add_message(&self, folder: &str, message: MemoryMessage) {
        self.state.lock().await.folder_mut(folder).messages.push(message);
    }

    /// Messages accepted into the send queue so far.
    pub async fn sent(&self) -> Vec<SentMail> {
        self.state.lock().await.sent.clone()
    }
}

impl MemoryState {
    fn folder_mut(&mut self, name: &str) -> &mut MemoryFolder {
        let index = match self.folders.iter().position(|folder| folder.name == name) {
            Some(index) => index,
            None => {
                self.folders.push(MemoryFolder {
                    name: name.to_string(),
                    messages: Vec::new(),
                });
                self.folders.len() - 1
            }
        };
        &mut self.folders[index]
    }

    fn message(&self, id: &str) -> Result<&MemoryMessage> {
        self.folders
            .iter()
            .flat_map(|folder| folder.messages.iter())
            .find(|message| message.id == id)
            .with_context(|| format!("Unknown message id {id}"))
    }

    fn attachment(&self, id: &str) -> Result<&MemoryAttachment> {
        self.folders
            .iter()
            .flat_map(|folder| folder.messages.iter())
            .flat_map(|message| message.attachments.iter())
            .find(|attachment| attachment.id == id)
            .with_context(|| format!("Unknown attachment id {id}"))
    }
}

#[async_trait]
impl MailClient for MemoryMailClient {
    async fn health_check(&self) -> Result<()> {
        if self.state.lock().await.offline {
            bail!("Mail transport is offline");
        }
        Ok(())
    }

    async fn list_folders(&self) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state.folders.iter().map(|folder| folder.name.clone()).collect())
    }

    async fn query_messages(
        &self,
        folder: &str,
        query: &MessageQuery,
    ) -> Result<Vec<MessageHandle>> {
        let state = self.state.lock().await;
        let folder = state
            .folders
            .iter()
            .find(|candidate| candidate.name == folder)
            .with_context(|| format!("Unknown folder {folder}"))?;

        let mut matches: Vec<&MemoryMessage> = folder
            .messages
            .iter()
            .filter(|message| like_match(&query.subject_like, &message.subject))
            .filter(|message| query.since.map_or(true, |since| message.received_at >= since))
            .collect();
        matches.sort_by(|a, b| b.received_at.cmp(&a.received_at));

        Ok(matches.into_iter().map(MemoryMessage::handle).collect())
    }

    async fn list_attachments(&self, message: &MessageHandle) -> Result<Vec<AttachmentHandle>> {
        let state = self.state.lock().await;
        let message = state.message(&message.id)?;
        Ok(message
            .attachments
            .iter()
            .map(|attachment| AttachmentHandle {
                id: attachment.id.clone(),
                file_name: attachment.file_name.clone(),
            })
            .collect())
    }

    async fn save_attachment(
        &self,
        attachment: &AttachmentHandle,
        destination: &Path,
    ) -> Result<()> {
        let content = {
            let state = self.state.lock().await;
            let stored = state.attachment(&attachment.id)?;
            if stored.fail_save {
                bail!("Simulated write failure for {}", stored.file_name);
            }
            stored.content.clone()
        };

        tokio::fs::write(destination, content)
            .await
            .with_context(|| format!("Failed to write {}", destination.display()))
    }

    async fn resolve_sender(&self, message: &MessageHandle) -> Result<String> {
        let state = self.state.lock().await;
        let message = state.message(&message.id)?;
        message
            .smtp_address
            .clone()
            .context("Sender has no directory entry")
    }

    async fn submit(&self, submission: &Submission) -> Result<()> {
        let mime = render_mime(submission).await?;
        let mut state = self.state.lock().await;
        state.sent.push(SentMail {
            submission: submission.clone(),
            mime,
        });
        Ok(())
    }
}

/// Render a submission to RFC 2822 bytes. Inline parts carry their content
/// identifier so a rendering client shows them inside the body.
async fn render_mime(submission: &Submission) -> Result<Vec<u8>> {
    let mut builder = MessageBuilder::new()
        .from("harvester@example.com")
        .to(submission.to.as_str())
        .subject(submission.subject.as_str());

    builder = if submission.is_html {
        builder.html_body(submission.body.as_str())
    } else {
        builder.text_body(submission.body.as_str())
    };

    if !submission.cc.is_empty() {
        builder = builder.cc(address_list(&submission.cc));
    }
    if !submission.bcc.is_empty() {
        builder = builder.bcc(address_list(&submission.bcc));
    }

    for part in &submission.inline_images {
        let content = tokio::fs::read(&part.path)
            .await
            .with_context(|| format!("Failed to read embedded image {}", part.path.display()))?;
        builder = builder.inline(
            content_type_for(&part.content_id),
            part.content_id.as_str(),
            content,
        );
    }

    for path in &submission.attachments {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read attachment {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        builder = builder.attachment(content_type_for(&name), name, content);
    }

    builder
        .write_to_vec()
        .context("Failed to render the outbound message")
}

fn address_list(addresses: &[String]) -> Address<'_> {
    Address::new_list(
        addresses
            .iter()
            .map(|address| Address::from(address.as_str()))
            .collect(),
    )
}

fn content_type_for(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Subject matching with the store's LIKE semantics: `%` spans any run of
/// characters, `_` exactly one, comparison is case-insensitive.
fn like_match(pattern: &str, text: &str) -> bool {
    fn matches(pattern: &[char], text: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some((head, rest)) => match *head {
                '%' => (0..=text.len()).any(|skip| matches(rest, &text[skip..])),
                '_' => !text.is_empty() && matches(rest, &text[1..]),
                other => text.first() == Some(&other) && matches(rest, &text[1..]),
            },
        }
    }

    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();
    matches(&pattern, &text)
}
