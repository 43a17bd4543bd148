use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::address;
use crate::client::handle::ClientHandle;
use crate::client::provider::MessageQuery;
use crate::config::HarvestConfig;
use crate::harvest::builder::{RecordBuilder, DEFAULT_FETCH_CONCURRENCY};
use crate::model::{EmailRecord, ScanFilter};

/// Walks one mailbox folder and turns matching messages into
/// [`EmailRecord`]s, saving their attachments under a destination
/// directory. Messages are visited most recent first; one message's
/// attachment fan-out is fully drained before the next message starts.
pub struct MailboxScanner {
    handle: Arc<ClientHandle>,
    fetch_concurrency: usize,
}

impl MailboxScanner {
    pub fn new(handle: Arc<ClientHandle>) -> Self {
        Self {
            handle,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_config(handle: Arc<ClientHandle>, config: &HarvestConfig) -> Self {
        Self {
            handle,
            fetch_concurrency: config.fetch_concurrency,
        }
    }

    /// Scan `folder_name` for messages matching `filter`. Caller-input
    /// problems (bad address, unknown folder) and capability failures all
    /// surface as a shorter or empty result, never as an error value;
    /// records accumulated before a mid-scan failure are still returned.
    pub async fn scan(
        &self,
        account: &str,
        folder_name: &str,
        destination: &Path,
        allowed: &HashSet<String>,
        filter: &ScanFilter,
    ) -> Vec<EmailRecord> {
        let mut records = Vec::new();

        if !address::is_valid(account) {
            tracing::error!("Invalid email address provided: {account}");
            return records;
        }

        if !destination.is_dir() {
            if let Err(e) = tokio::fs::create_dir_all(destination).await {
                tracing::error!("Failed to create directory {}: {e}", destination.display());
                return records;
            }
            tracing::info!("Created directory {}", destination.display());
        }

        if let Err(e) = self
            .scan_folder(folder_name, destination, allowed, filter, &mut records)
            .await
        {
            tracing::error!("Error while processing email messages: {e:#}");
        }

        tracing::info!("Processed {} emails", records.len());
        records
    }

    async fn scan_folder(
        &self,
        folder_name: &str,
        destination: &Path,
        allowed: &HashSet<String>,
        filter: &ScanFilter,
        records: &mut Vec<EmailRecord>,
    ) -> Result<()> {
        let client = self.handle.bind().await?;

        let folders = client.list_folders().await?;
        if !folders.iter().any(|name| name == folder_name) {
            tracing::error!("Folder '{folder_name}' not found");
            return Ok(());
        }

        // The substring is spliced into the pattern verbatim, so `%` or
        // `_` inside it widen the match.
        let query = MessageQuery {
            subject_like: format!("%{}%", filter.subject_substring),
            since: filter.since,
        };
        let messages = client.query_messages(folder_name, &query).await?;

        let builder = RecordBuilder::new(Arc::clone(&client), self.fetch_concurrency);
        for message in &messages {
            if filter.include_read || message.unread {
                match builder.build(message, destination, allowed).await {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::error!(
                        "Error processing individual email '{}': {e:#}",
                        message.subject
                    ),
                }
            }
        }

        Ok(())
    }
}
