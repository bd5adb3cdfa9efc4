//! Test data model for the fake IMAP server
//!
//! Provides a builder-style API for constructing mailbox state:
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .folder("INBOX")
//!         .email(1, false, raw_rfc2822_bytes)
//!         .email(2, true, raw_rfc2822_bytes)
//!     .folder("Sent")
//!         .email(10, true, raw_rfc2822_bytes)
//!     .build();
//! ```
//!
//! The `Mailbox` is shared with the fake IMAP server via `Arc` so the
//! server knows which folders exist, what emails they contain, and
//! whether each email has been read (the `\Seen` flag). `CREATE` and
//! `APPEND` mutate a locked `Mailbox` in place, so a transfer run
//! against the fake server observes folders and messages that did not
//! exist when the test built the initial state.

/// A complete mailbox: a collection of named folders, each holding
/// zero or more test emails.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Look up a folder by name (case-sensitive, matching real IMAP).
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// Mutable lookup, used by `CREATE`/`APPEND` to mutate folder state.
    pub fn get_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }
}

/// A single IMAP folder (e.g. "INBOX", "Sent", "Trash").
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub emails: Vec<TestEmail>,
}

impl Folder {
    /// The UID `APPEND` should assign to the next message in this
    /// folder: one past the highest UID currently present.
    pub fn next_uid(&self) -> u32 {
        self.emails.iter().map(|e| e.uid).max().map_or(1, |max| max + 1)
    }
}

/// A test email stored in a folder.
///
/// - `uid`: IMAP UID -- a unique-per-folder number that never changes
///   (unlike sequence numbers which shift on delete).
/// - `seen`: whether the `\Seen` flag is set. IMAP uses this to track
///   read/unread state. The UNSEEN search returns emails without it.
/// - `raw`: the complete RFC 2822 message (headers + body) as bytes.
///   This is what gets returned in a FETCH BODY[] response.
/// - `internal_date`: the server's `INTERNALDATE`, returned verbatim
///   on `FETCH` so a transfer run can assert it round-trips into the
///   destination's `APPEND`.
/// - `flags`: the full IMAP atom set for this message (`seen` is a
///   convenience bit derived from `\Seen`'s presence here for the
///   handlers that only care about read state).
#[derive(Debug, Clone)]
pub struct TestEmail {
    pub uid: u32,
    pub seen: bool,
    pub raw: Vec<u8>,
    pub internal_date: String,
    pub flags: Vec<String>,
}

/// Builder for constructing a `Mailbox` step by step.
///
/// Call `.folder(name)` to start a new folder, then chain
/// `.email(uid, seen, raw)` calls to add messages to it.
/// Finish with `.build()` to get the final `Mailbox`.
pub struct MailboxBuilder {
    folders: Vec<Folder>,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            folders: Vec::new(),
        }
    }

    /// Add a new folder. Subsequent `.email()` calls add to this folder.
    pub fn folder(mut self, name: &str) -> Self {
        self.folders.push(Folder {
            name: name.to_string(),
            emails: Vec::new(),
        });
        self
    }

    /// Add an email to the most recently added folder, with a default
    /// `INTERNALDATE` and a flag set derived from `seen`.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    pub fn email(self, uid: u32, seen: bool, raw: &[u8]) -> Self {
        let flags = if seen { vec!["\\Seen".to_string()] } else { Vec::new() };
        self.email_with(uid, raw, "01-Jan-2024 00:00:00 +0000", &flags)
    }

    /// Add an email with an explicit `INTERNALDATE` and flag set, for
    /// tests that assert on metadata preservation.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    pub fn email_with(mut self, uid: u32, raw: &[u8], internal_date: &str, flags: &[String]) -> Self {
        let seen = flags.iter().any(|f| f == "\\Seen");
        self.folders
            .last_mut()
            .expect("call .folder() before .email()")
            .emails
            .push(TestEmail {
                uid,
                seen,
                raw: raw.to_vec(),
                internal_date: internal_date.to_string(),
                flags: flags.to_vec(),
            });
        self
    }

    /// Consume the builder and return the finished `Mailbox`.
    pub fn build(self) -> Mailbox {
        Mailbox {
            folders: self.folders,
        }
    }
}
