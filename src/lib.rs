#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Resumable IMAP-to-IMAP mailbox transfer.
//!
//! Moves every message in one or all folders from a source mailbox to
//! a destination mailbox over IMAP, tracking what's already been
//! copied in a local cache so an interrupted run can resume without
//! re-sending messages the destination already has.

mod auto;
mod cache;
mod config;
mod engine;
mod error;
mod flag;
mod folder;
mod imap;
mod orchestrator;
mod progress;
mod retry;

pub use auto::{AutoTransferDriver, AutoTransferSummary, FolderOutcome};
pub use cache::{Cache, CacheStats};
pub use config::{Args, Config, Endpoint, Mode, NamespaceRewriteArg};
pub use engine::{TransferEngine, TransferResult, ensure_destination};
pub use error::{Disposition, Error, ErrorKind, Result};
pub use folder::{NamespaceRewrite, is_skipped};
pub use imap::{ImapClient, MailSession, Message};
pub use orchestrator::{init_logging, ExitCode, Orchestrator};
pub use progress::{NullProgress, ProgressReporter, TerminalProgress};
pub use retry::RetryPolicy;
