//! The capability contract shared by source and destination sessions.
//!
//! Source and destination are otherwise symmetric: both connect, list and
//! create folders, select a folder, search UIDs, fetch, and append. The
//! transfer engine and auto-transfer driver depend only on this trait,
//! never on the concrete client, so a session double can stand in for
//! tests.

use crate::error::Result;

/// A complete message as carried between source and destination: the raw
/// RFC-822 payload plus the metadata `APPEND` needs to reproduce it.
#[derive(Debug, Clone)]
pub struct Message {
    pub payload: Vec<u8>,
    /// The server's `INTERNALDATE` string, transmitted back verbatim on
    /// `APPEND` so the destination's arrival timestamp matches the source.
    pub internal_date: String,
    /// IMAP atoms only (e.g. `\Seen`, `\Answered`); see the flag-set
    /// preservation contract on [`MailSession::append`].
    pub flags: Vec<String>,
}

/// One authenticated IMAP session's capability set.
///
/// State machine: `Disconnected -> Connected -> Authenticated ->
/// {Selected(folder) | Authenticated} -> Closed`. `uid_search_all` and
/// `fetch` require a prior `select_folder`; every other operation is
/// legal as soon as the session is authenticated.
///
/// Consumed generically (`<S: MailSession>`) by the engine and driver
/// rather than as a trait object, so these are plain `async fn`s.
pub trait MailSession: Send {
    /// Open the TLS connection and log in. Fails with `Connect` (network)
    /// or `Auth` (bad credentials).
    async fn connect(&mut self) -> Result<()>;

    /// Log out and close the connection. Never fails; logs and swallows
    /// any protocol-level error since there is nothing more to do after.
    async fn disconnect(&mut self);

    /// `LIST "" *`, decoded and in server order.
    async fn list_folders(&mut self) -> Result<Vec<String>>;

    /// `LIST "" name`; true iff the server returned a matching entry.
    async fn folder_exists(&mut self, name: &str) -> Result<bool>;

    /// `CREATE name`. A server response that case-insensitively contains
    /// "already exists" (or the `ALREADYEXISTS` response code) is treated
    /// as success, not failure.
    async fn create_folder(&mut self, name: &str) -> Result<()>;

    /// `SELECT name`; returns the `EXISTS` count and changes the
    /// session's selected folder.
    async fn select_folder(&mut self, name: &str) -> Result<u32>;

    /// `UID SEARCH ALL` against the currently selected folder, in
    /// server-returned order.
    async fn uid_search_all(&mut self) -> Result<Vec<u32>>;

    /// `UID FETCH uid (RFC822 INTERNALDATE FLAGS)`. An empty payload is
    /// itself a `Fetch` error.
    async fn fetch(&mut self, uid: u32) -> Result<Message>;

    /// `APPEND folder (flags) "internaldate" {literal}`. Returns the new
    /// UID when the server's `APPENDUID` response code is present, or an
    /// empty string otherwise (still a success per the open question on
    /// empty `APPENDUID`).
    async fn append(&mut self, folder: &str, message: &Message) -> Result<String>;
}
