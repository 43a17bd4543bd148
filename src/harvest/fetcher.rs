use std::collections::HashSet;
use std::path::Path;

use uuid::Uuid;

use crate::client::provider::{AttachmentHandle, MailClient};
use crate::model::AttachmentRecord;

/// Download one attachment into `destination` if its extension passes the
/// allow-list (an empty set allows everything). Returns `None` when the
/// attachment is filtered out or the save fails; save failures are logged,
/// never propagated, so one bad attachment cannot abort a batch.
pub async fn fetch_attachment(
    client: &dyn MailClient,
    attachment: &AttachmentHandle,
    destination: &Path,
    allowed: &HashSet<String>,
) -> Option<AttachmentRecord> {
    if !allowed.is_empty() {
        match file_extension(&attachment.file_name) {
            Some(extension) if allowed.contains(&extension) => {}
            _ => return None,
        }
    }

    // Collisions are not deduplicated: a same-named attachment overwrites.
    let path = destination.join(&attachment.file_name);
    match client.save_attachment(attachment, &path).await {
        Ok(()) => {
            tracing::info!("Attachment {} saved", attachment.file_name);
            Some(AttachmentRecord {
                path,
                name: attachment.file_name.clone(),
                id: Uuid::new_v4(),
            })
        }
        Err(e) => {
            tracing::error!("Error saving attachment {}: {e:#}", attachment.file_name);
            None
        }
    }
}

/// Extension of a declared filename including the leading dot, `None` when
/// the name has no extension.
fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
}
