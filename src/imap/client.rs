//! The concrete `async-imap`-backed [`MailSession`].

use super::codec::{decode_utf7, encode_utf7, is_already_exists, quote_folder_name};
use super::session::{MailSession, Message};
use crate::config::Endpoint;
use crate::error::{Error, ErrorKind, Result};
use crate::flag::is_atom;
use async_imap::Session;
use async_imap::types::Flag;
use futures::StreamExt;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

type ImapSession = Session<Compat<tokio_rustls::client::TlsStream<TcpStream>>>;

/// One authenticated `async-imap` connection to `endpoint`.
pub struct ImapClient {
    endpoint: Endpoint,
    session: Option<ImapSession>,
    /// PEM-encoded certificate(s) trusted in addition to the platform
    /// store, e.g. an internal CA fronting a self-hosted mail server.
    extra_ca_pem: Option<Vec<u8>>,
}

impl ImapClient {
    #[must_use]
    pub const fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, session: None, extra_ca_pem: None }
    }

    /// Trust `pem` (one or more PEM-encoded certificates) in addition to
    /// the platform trust store for this session's TLS handshake.
    #[must_use]
    pub fn with_extra_ca_cert(mut self, pem: Vec<u8>) -> Self {
        self.extra_ca_pem = Some(pem);
        self
    }

    fn session_mut(&mut self) -> Result<&mut ImapSession> {
        self.session.as_mut().ok_or_else(|| {
            Error::new(ErrorKind::Protocol, "access session", &self.endpoint.host, NotConnected)
        })
    }

    /// Build a TLS connector backed by the platform's trust store, unlike
    /// the all-accepting verifier this is generalized from. Any
    /// `extra_ca_pem` configured on this client is trusted in addition.
    fn tls_connector(&self) -> Result<TlsConnector> {
        let mut roots = rustls::RootCertStore::empty();
        let certs = rustls_native_certs::load_native_certs();
        for err in certs.errors {
            warn!("native cert store load warning: {err}");
        }
        for cert in certs.certs {
            roots.add(cert).map_err(|e| {
                Error::new(ErrorKind::Connect, "load trust store", "-", e)
            })?;
        }

        if let Some(pem) = &self.extra_ca_pem {
            let mut reader = std::io::Cursor::new(pem);
            for cert in rustls_pemfile::certs(&mut reader) {
                let cert = cert.map_err(|e| Error::new(ErrorKind::Connect, "parse extra CA certificate", &self.endpoint.host, e))?;
                roots
                    .add(cert)
                    .map_err(|e| Error::new(ErrorKind::Connect, "trust extra CA certificate", &self.endpoint.host, e))?;
            }
        }

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(TlsConnector::from(Arc::new(config)))
    }
}

impl MailSession for ImapClient {
    async fn connect(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.endpoint.host, self.endpoint.port);
        debug!("connecting to {addr}");

        let tcp_stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| Error::new(ErrorKind::Connect, "open TCP connection", &self.endpoint.host, e))?;

        let connector = self.tls_connector()?;
        let server_name = ServerName::try_from(self.endpoint.host.clone())
            .map_err(|e| Error::new(ErrorKind::Connect, "resolve server name", &self.endpoint.host, e))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::new(ErrorKind::Connect, "TLS handshake", &self.endpoint.host, e))?;

        let client = async_imap::Client::new(tls_stream.compat());
        let session = client
            .login(&self.endpoint.user, &self.endpoint.pass)
            .await
            .map_err(|(e, _)| Error::new(ErrorKind::Auth, "login", &self.endpoint.host, e))?;

        info!("connected to {}", self.endpoint.host);
        self.session = Some(session);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.logout().await {
                warn!("logout failed for {}: {e}", self.endpoint.host);
            }
        }
    }

    async fn list_folders(&mut self) -> Result<Vec<String>> {
        let host = self.endpoint.host.clone();
        let session = self.session_mut()?;
        let mut stream = session
            .list(Some(""), Some("*"))
            .await
            .map_err(|e| Error::new(ErrorKind::FolderOp, "LIST", &host, e))?;

        let mut names = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(name) => names.push(decode_utf7(name.name())),
                Err(e) => warn!("LIST entry error from {host}: {e}"),
            }
        }
        Ok(names)
    }

    async fn folder_exists(&mut self, name: &str) -> Result<bool> {
        let host = self.endpoint.host.clone();
        let encoded = encode_utf7(name);
        let session = self.session_mut()?;
        let mut stream = session
            .list(Some(""), Some(&encoded))
            .await
            .map_err(|e| Error::new(ErrorKind::FolderOp, "LIST", &host, e))?;
        Ok(stream.next().await.is_some_and(Result::is_ok))
    }

    async fn create_folder(&mut self, name: &str) -> Result<()> {
        let host = self.endpoint.host.clone();
        let encoded = quote_folder_name(&encode_utf7(name));
        let session = self.session_mut()?;
        match session.create(&encoded).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let text = e.to_string();
                if is_already_exists(&text) {
                    Ok(())
                } else {
                    Err(Error::new(ErrorKind::FolderOp, format!("CREATE {name}"), &host, e))
                }
            }
        }
    }

    async fn select_folder(&mut self, name: &str) -> Result<u32> {
        let host = self.endpoint.host.clone();
        let encoded = quote_folder_name(&encode_utf7(name));
        let session = self.session_mut()?;
        let mailbox = session
            .select(&encoded)
            .await
            .map_err(|e| Error::new(ErrorKind::FolderOp, format!("SELECT {name}"), &host, e))?;
        Ok(mailbox.exists)
    }

    async fn uid_search_all(&mut self) -> Result<Vec<u32>> {
        let host = self.endpoint.host.clone();
        let session = self.session_mut()?;
        let uids = session
            .uid_search("ALL")
            .await
            .map_err(|e| Error::new(ErrorKind::FolderOp, "UID SEARCH ALL", &host, e))?;
        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    async fn fetch(&mut self, uid: u32) -> Result<Message> {
        let host = self.endpoint.host.clone();
        let session = self.session_mut()?;
        let uid_set = uid.to_string();
        let mut stream = session
            .uid_fetch(&uid_set, "(BODY.PEEK[] INTERNALDATE FLAGS)")
            .await
            .map_err(|e| Error::new(ErrorKind::Fetch, format!("UID FETCH {uid}"), &host, e))?;

        let fetched = stream
            .next()
            .await
            .ok_or_else(|| Error::new(ErrorKind::Fetch, format!("UID FETCH {uid}"), &host, NoSuchMessage(uid)))?
            .map_err(|e| Error::new(ErrorKind::Fetch, format!("UID FETCH {uid}"), &host, e))?;

        let payload = fetched
            .body()
            .ok_or_else(|| Error::new(ErrorKind::Fetch, format!("UID FETCH {uid}"), &host, EmptyPayload(uid)))?
            .to_vec();

        let internal_date = fetched
            .internal_date()
            .map(|d| d.format("%d-%b-%Y %H:%M:%S %z").to_string())
            .unwrap_or_default();
        let flags: Vec<String> = fetched.flags().map(|f| f.to_string()).collect();
        for flag in &flags {
            if !is_atom(flag) {
                warn!("UID {uid} on {host} carries non-atom flag {flag:?}, dropping it");
            }
        }
        let flags: Vec<String> = flags.into_iter().filter(|f| is_atom(f)).collect();

        Ok(Message { payload, internal_date, flags })
    }

    async fn append(&mut self, folder: &str, message: &Message) -> Result<String> {
        let host = self.endpoint.host.clone();
        let encoded = quote_folder_name(&encode_utf7(folder));
        let flags: Vec<Flag<'static>> = message.flags.iter().map(|f| parse_flag(f)).collect();
        let date = parse_internal_date(&message.internal_date);

        let session = self.session_mut()?;
        session
            .append(&encoded, Some(&flags), date, &message.payload)
            .await
            .map_err(|e| Error::new(ErrorKind::Append, format!("APPEND to {folder}"), &host, e))?;

        // `async-imap`'s typed `append` surfaces only success/failure, not
        // the raw tagged response text, so a server-assigned APPENDUID
        // can't be recovered here. An empty destination UID is accepted
        // downstream: the cache still records the transfer by source UID.
        Ok(String::new())
    }
}

/// Map an IMAP flag atom back to `async-imap`'s typed representation,
/// falling back to a custom flag for anything not in the standard set.
fn parse_flag(atom: &str) -> Flag<'static> {
    match atom {
        "\\Seen" => Flag::Seen,
        "\\Answered" => Flag::Answered,
        "\\Flagged" => Flag::Flagged,
        "\\Deleted" => Flag::Deleted,
        "\\Draft" => Flag::Draft,
        "\\Recent" => Flag::Recent,
        other => Flag::Custom(other.to_string().into()),
    }
}

fn parse_internal_date(raw: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    chrono::DateTime::parse_from_str(raw, "%d-%b-%Y %H:%M:%S %z").ok()
}

#[derive(Debug, thiserror::Error)]
#[error("no session established")]
struct NotConnected;

#[derive(Debug, thiserror::Error)]
#[error("UID {0} not found")]
struct NoSuchMessage(u32);

#[derive(Debug, thiserror::Error)]
#[error("UID {0} returned no body")]
struct EmptyPayload(u32);
