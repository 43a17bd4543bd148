//! Automation core for an already-authenticated desktop mail client:
//! harvest attachments from mailbox folders into structured records and
//! submit outbound messages, all through the narrow [`MailClient`]
//! capability interface.

pub mod address;
pub mod client;
pub mod config;
pub mod harvest;
pub mod model;
pub mod send;

pub use client::handle::{ClientConnector, ClientHandle};
pub use client::provider::MailClient;
pub use config::HarvestConfig;
pub use harvest::builder::RecordBuilder;
pub use harvest::scanner::MailboxScanner;
pub use model::{AttachmentRecord, EmailRecord, OutboundMessage, RecordStatus, ScanFilter};
pub use send::{MailSender, SendOutcome};
