//! Error taxonomy and recovery classification.

use thiserror::Error;

/// The closed set of error kinds the system can raise.
///
/// Each kind has a fixed recovery disposition (see [`ErrorKind::disposition`])
/// that the retry handler and orchestrator consult instead of matching on
/// error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigInvalid,
    Connect,
    Auth,
    FolderOp,
    Fetch,
    Append,
    Cache,
    SizeLimit,
    Protocol,
    Interrupted,
}

/// How the system responds when an error of a given kind occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The triggering operation may be retried with backoff.
    Retryable,
    /// The unit of work (one message) is skipped; the run continues.
    Skip,
    /// The run cannot continue; propagate to the orchestrator.
    Fatal,
}

impl ErrorKind {
    #[must_use]
    pub const fn disposition(self) -> Disposition {
        match self {
            Self::Connect | Self::Fetch | Self::Append | Self::Protocol => Disposition::Retryable,
            Self::SizeLimit => Disposition::Skip,
            Self::ConfigInvalid | Self::Auth | Self::Interrupted => Disposition::Fatal,
            Self::FolderOp | Self::Cache => Disposition::Skip,
        }
    }
}

/// A single error value, carrying enough context to satisfy the
/// operation/host/cause message contract without per-site formatting.
#[derive(Debug, Error)]
#[error("{operation} ({host}): {source}")]
pub struct Error {
    pub kind: ErrorKind,
    pub operation: String,
    pub host: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    pub fn new(
        kind: ErrorKind,
        operation: impl Into<String>,
        host: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            operation: operation.into(),
            host: host.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub const fn disposition(&self) -> Disposition {
        self.kind.disposition()
    }

    /// Build a `ConfigInvalid` error without a network host or a boxed
    /// source (most validation failures are just a message).
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, "load configuration", "-", ConfigMessage(message.into()))
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct ConfigMessage(String);

pub type Result<T> = std::result::Result<T, Error>;
