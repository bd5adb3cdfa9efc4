//! IMAP session capability contract and its concrete implementation.

mod client;
mod codec;
mod session;

pub use client::ImapClient;
pub use session::{MailSession, Message};
