//! CREATE command handler.
//!
//! Creates a new folder. A folder that already exists is not an
//! error: the server reports `NO [ALREADYEXISTS]`, which the client's
//! folder-ensure step treats as success, matching real servers.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::{Folder, Mailbox};
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the CREATE command. `name` has already been unquoted by the
/// caller's line parser.
pub async fn handle_create<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    name: &str,
    mailbox: &Mutex<Mailbox>,
    stream: &mut BufReader<S>,
) {
    let created = {
        let mut mb = mailbox.lock().unwrap();
        if mb.get_folder(name).is_some() {
            false
        } else {
            mb.folders.push(Folder { name: name.to_string(), emails: Vec::new() });
            true
        }
    };

    let resp = if created {
        format!("{tag} OK CREATE completed\r\n")
    } else {
        format!("{tag} NO [ALREADYEXISTS] Mailbox already exists\r\n")
    };
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, name: &str, mailbox: &Mutex<Mailbox>) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_create(tag, name, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn creates_new_folder() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("INBOX").build());
        let output = run("A1", "INBOX.Archive", &mailbox).await;

        assert!(output.contains("A1 OK CREATE completed"));
        assert!(mailbox.lock().unwrap().get_folder("INBOX.Archive").is_some());
    }

    #[tokio::test]
    async fn already_existing_folder_reports_alreadyexists() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("INBOX.Archive").build());
        let output = run("A1", "INBOX.Archive", &mailbox).await;

        assert!(output.contains("A1 NO [ALREADYEXISTS]"));
        assert_eq!(mailbox.lock().unwrap().folders.len(), 1);
    }
}
