use std::fmt;
use std::sync::Arc;

use crate::address;
use crate::client::handle::ClientHandle;
use crate::client::provider::{InlinePart, Submission};
use crate::model::OutboundMessage;

/// Outcome of one send attempt. Failures carry a human-readable reason and
/// are reported as values, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    ClientUnavailable(String),
    InvalidRecipient(String),
    Failed(String),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Sent => write!(f, "Email sent successfully."),
            SendOutcome::ClientUnavailable(reason) => {
                write!(f, "Mail client is not reachable: {reason}")
            }
            SendOutcome::InvalidRecipient(address) => {
                write!(f, "Invalid email addresses provided: {address}")
            }
            SendOutcome::Failed(reason) => write!(f, "Error sending email: {reason}"),
        }
    }
}

/// Composes outbound messages and hands them to the mail client's send
/// queue. Exactly one message is submitted per successful call; no retry.
pub struct MailSender {
    handle: Arc<ClientHandle>,
}

impl MailSender {
    pub fn new(handle: Arc<ClientHandle>) -> Self {
        Self { handle }
    }

    pub async fn send(&self, message: OutboundMessage) -> SendOutcome {
        // Probe through a fresh binding so a stale cached client never
        // passes the liveness check.
        let client = match self.handle.probe().await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Mail client probe failed: {e:#}");
                return SendOutcome::ClientUnavailable(format!("{e:#}"));
            }
        };

        if !address::is_valid(&message.to) {
            tracing::error!("Invalid email addresses provided: {}", message.to);
            return SendOutcome::InvalidRecipient(message.to);
        }

        let submission = prepare(message).await;
        match client.submit(&submission).await {
            Ok(()) => {
                tracing::info!("Email sent successfully");
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::error!("Error sending email: {e:#}");
                SendOutcome::Failed(format!("{e:#}"))
            }
        }
    }
}

/// Resolve attachment paths and tag embedded images for inline rendering.
/// Missing attachment paths are skipped with a warning rather than failing
/// the send.
async fn prepare(message: OutboundMessage) -> Submission {
    let mut attachments = Vec::new();
    for path in message.attachments {
        match tokio::fs::canonicalize(&path).await {
            Ok(absolute) => attachments.push(absolute),
            Err(_) => tracing::warn!("Attachment not found: {}", path.display()),
        }
    }

    // The part's own filename doubles as its content identifier, so the
    // rendering client shows it inside the body.
    let inline_images = message
        .embedded_images
        .into_iter()
        .map(|path| {
            let content_id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            InlinePart { path, content_id }
        })
        .collect();

    Submission {
        to: message.to,
        subject: message.subject,
        body: message.body,
        is_html: message.is_html,
        cc: message.cc,
        bcc: message.bcc,
        attachments,
        inline_images,
    }
}
