//! APPEND command handler.
//!
//! Unlike the other handlers, the protocol framing for `APPEND` (the
//! `{N}` literal continuation) is handled by the connection loop in
//! `server.rs`, since that's the layer that owns the raw stream. This
//! handler receives the already-parsed folder name, flag list, date,
//! and message bytes and only has to apply them to the mailbox.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::{Mailbox, TestEmail};
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle an `APPEND` once its literal body has been read. Returns a
/// `NO [TRYCREATE]` response, matching real servers, if the target
/// folder doesn't exist.
pub async fn handle_append<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    flags: Vec<String>,
    internal_date: &str,
    payload: Vec<u8>,
    mailbox: &Mutex<Mailbox>,
    stream: &mut BufReader<S>,
) {
    let assigned = {
        let mut mb = mailbox.lock().unwrap();
        match mb.get_folder_mut(folder_name) {
            Some(folder) => {
                let uid = folder.next_uid();
                let seen = flags.iter().any(|f| f == "\\Seen");
                folder.emails.push(TestEmail {
                    uid,
                    seen,
                    raw: payload,
                    internal_date: internal_date.to_string(),
                    flags,
                });
                Some(uid)
            }
            None => None,
        }
    };

    let resp = match assigned {
        Some(uid) => format!("{tag} OK [APPENDUID 1 {uid}] APPEND completed\r\n"),
        None => format!("{tag} NO [TRYCREATE] No such mailbox\r\n"),
    };
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(
        tag: &str,
        folder: &str,
        flags: Vec<String>,
        date: &str,
        payload: Vec<u8>,
        mailbox: &Mutex<Mailbox>,
    ) -> String {
        let (client, server) = tokio::io::duplex(8192);
        let mut stream = BufReader::new(server);

        handle_append(tag, folder, flags, date, payload, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn appends_and_assigns_next_uid() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("INBOX").email(5, true, b"x").build());
        let output = run(
            "A1",
            "INBOX",
            vec!["\\Seen".to_string()],
            "01-Jan-2024 00:00:00 +0000",
            b"From: a@b.com\r\n\r\nhi".to_vec(),
            &mailbox,
        )
        .await;

        assert!(output.contains("A1 OK [APPENDUID 1 6] APPEND completed"));
        let mb = mailbox.lock().unwrap();
        let folder = mb.get_folder("INBOX").unwrap();
        assert_eq!(folder.emails.len(), 2);
        assert_eq!(folder.emails[1].uid, 6);
        assert_eq!(folder.emails[1].internal_date, "01-Jan-2024 00:00:00 +0000");
        assert_eq!(folder.emails[1].flags, vec!["\\Seen".to_string()]);
    }

    #[tokio::test]
    async fn missing_folder_reports_trycreate() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("INBOX").build());
        let output = run("A1", "Archive", vec![], "01-Jan-2024 00:00:00 +0000", b"x".to_vec(), &mailbox).await;

        assert!(output.contains("A1 NO [TRYCREATE]"));
    }

    #[tokio::test]
    async fn first_message_in_empty_folder_gets_uid_1() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("INBOX").build());
        let _ = run("A1", "INBOX", vec![], "01-Jan-2024 00:00:00 +0000", b"x".to_vec(), &mailbox).await;

        assert_eq!(mailbox.lock().unwrap().get_folder("INBOX").unwrap().emails[0].uid, 1);
    }
}
