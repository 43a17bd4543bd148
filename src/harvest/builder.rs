use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::client::provider::{MailClient, MessageHandle};
use crate::harvest::fetcher;
use crate::model::{EmailRecord, RecordStatus};

/// Upper bound on simultaneous attachment transfers within one message.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Assembles one [`EmailRecord`] per message, fanning attachment downloads
/// out across a bounded worker pool.
pub struct RecordBuilder {
    client: Arc<dyn MailClient>,
    permits: Arc<Semaphore>,
}

impl RecordBuilder {
    pub fn new(client: Arc<dyn MailClient>, concurrency: usize) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Fetch every attachment of `message` concurrently and assemble the
    /// record. All workers are drained before this returns, so `files` is
    /// complete; it is ordered by completion, not by attachment order.
    pub async fn build(
        &self,
        message: &MessageHandle,
        destination: &Path,
        allowed: &HashSet<String>,
    ) -> Result<EmailRecord> {
        let attachments = self
            .client
            .list_attachments(message)
            .await
            .context("Failed to enumerate attachments")?;

        let mut workers: FuturesUnordered<_> = attachments
            .into_iter()
            .map(|attachment| {
                let client = Arc::clone(&self.client);
                let permits = Arc::clone(&self.permits);
                let destination = destination.to_path_buf();
                let allowed = allowed.clone();
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok()?;
                    fetcher::fetch_attachment(client.as_ref(), &attachment, &destination, &allowed)
                        .await
                })
            })
            .collect();

        let mut files = Vec::new();
        while let Some(outcome) = workers.next().await {
            match outcome {
                Ok(Some(record)) => files.push(record),
                Ok(None) => {}
                Err(e) => tracing::error!("Error saving attachment: {e}"),
            }
        }

        let from_address = self
            .client
            .resolve_sender(message)
            .await
            .context("Failed to resolve the sender address")?;

        Ok(EmailRecord {
            name: message.subject.clone(),
            subject: message.subject.clone(),
            conversation_id: message.conversation_id.clone(),
            from_address,
            sender_name: message.sender_name.clone(),
            body: message.body.clone(),
            files,
            status: RecordStatus::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::client::memory::{MemoryAttachment, MemoryMailClient, MemoryMessage};
    use crate::client::provider::MessageQuery;

    async fn first_handle(client: &MemoryMailClient) -> MessageHandle {
        let query = MessageQuery {
            subject_like: "%%".to_string(),
            since: None,
        };
        client
            .query_messages("Inbox", &query)
            .await
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn one_failing_attachment_does_not_abort_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryMailClient::new());
        let mut message = MemoryMessage::new("m1", "Quarterly", Utc::now());
        message.attachments.push(MemoryAttachment::new("a.pdf", b"a".to_vec()));
        let mut broken = MemoryAttachment::new("b.pdf", b"b".to_vec());
        broken.fail_save = true;
        message.attachments.push(broken);
        message.attachments.push(MemoryAttachment::new("c.pdf", b"c".to_vec()));
        client.add_message("Inbox", message).await;

        let builder = RecordBuilder::new(Arc::clone(&client) as Arc<dyn MailClient>, 4);
        let handle = first_handle(&client).await;
        let record = builder
            .build(&handle, dir.path(), &HashSet::new())
            .await
            .unwrap();

        assert_eq!(record.files.len(), 2);
        assert!(record.files.iter().all(|file| file.path.exists()));
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[tokio::test]
    async fn bounded_pool_still_fetches_every_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryMailClient::new());
        let mut message = MemoryMessage::new("m1", "Bulk", Utc::now());
        for i in 0..6 {
            message
                .attachments
                .push(MemoryAttachment::new(format!("file{i}.txt"), b"x".to_vec()));
        }
        client.add_message("Inbox", message).await;

        let builder = RecordBuilder::new(Arc::clone(&client) as Arc<dyn MailClient>, 2);
        let handle = first_handle(&client).await;
        let record = builder
            .build(&handle, dir.path(), &HashSet::new())
            .await
            .unwrap();

        assert_eq!(record.files.len(), 6);
    }

    #[tokio::test]
    async fn unresolvable_sender_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryMailClient::new());
        let mut message = MemoryMessage::new("m1", "No directory entry", Utc::now());
        message.smtp_address = None;
        client.add_message("Inbox", message).await;

        let builder = RecordBuilder::new(Arc::clone(&client) as Arc<dyn MailClient>, 2);
        let handle = first_handle(&client).await;
        assert!(builder.build(&handle, dir.path(), &HashSet::new()).await.is_err());
    }

    #[tokio::test]
    async fn record_carries_message_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryMailClient::new());
        let mut message = MemoryMessage::new("m1", "Subject line", Utc::now());
        message.sender_name = "Alice".to_string();
        message.smtp_address = Some("alice@corp.example".to_string());
        message.body = "Hello".to_string();
        client.add_message("Inbox", message).await;

        let builder = RecordBuilder::new(Arc::clone(&client) as Arc<dyn MailClient>, 2);
        let handle = first_handle(&client).await;
        let record = builder
            .build(&handle, dir.path(), &HashSet::new())
            .await
            .unwrap();

        assert_eq!(record.name, "Subject line");
        assert_eq!(record.subject, "Subject line");
        assert_eq!(record.conversation_id, "conv-m1");
        assert_eq!(record.from_address, "alice@corp.example");
        assert_eq!(record.sender_name, "Alice");
        assert_eq!(record.body, "Hello");
    }
}
