//! Run configuration: CLI parsing, environment fallback, and validation.

use crate::error::Error;
use crate::folder::NamespaceRewrite;
use clap::Parser;
use std::env;
use std::time::Duration;

/// Connection details for one IMAP endpoint (source or destination).
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

/// Which folders a run transfers.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Transfer a single named folder.
    Folder(String),
    /// Discover and transfer every non-skipped folder.
    Auto,
}

/// The fully resolved, validated set of run parameters.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: Endpoint,
    pub dest: Endpoint,
    pub mode: Mode,
    pub timeout: Duration,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub log_file: String,
    pub cache_db: String,
    pub max_message_size: u64,
    pub namespace_rewrite: NamespaceRewrite,
    pub extra_ca_pem: Option<Vec<u8>>,
}

/// Command-line arguments, parsed by `clap`.
///
/// Mirrors the original tool's option set: both endpoints, a run mode
/// (exactly one of `--folder`/`--auto-mode`), and the tunables that
/// control retry, size limiting, and persistence paths.
#[derive(Parser, Debug)]
#[command(name = "imap-relay")]
#[command(about = "Transfer mail from one IMAP server to another, resumably")]
pub struct Args {
    #[arg(long)]
    pub source_host: String,
    #[arg(long)]
    pub source_user: String,
    #[arg(long)]
    pub source_pass: Option<String>,

    #[arg(long)]
    pub dest_host: String,
    #[arg(long)]
    pub dest_user: String,
    #[arg(long)]
    pub dest_pass: Option<String>,

    /// Transfer only this folder. Mutually exclusive with `--auto-mode`.
    #[arg(long)]
    pub folder: Option<String>,
    /// Discover and transfer every folder. Mutually exclusive with `--folder`.
    #[arg(long)]
    pub auto_mode: bool,

    #[arg(long, default_value_t = 993)]
    pub port: u16,
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,
    #[arg(long, default_value_t = 3)]
    pub retry_count: u32,
    #[arg(long, default_value_t = 5)]
    pub retry_delay: u64,

    #[arg(long, default_value = "transfer.log")]
    pub log_file: String,
    #[arg(long, default_value = "transfer_cache.db")]
    pub cache_db: String,

    #[arg(long, default_value_t = 52_428_800)]
    pub max_message_size: u64,

    #[arg(long, value_enum, default_value = "prefix-when-nested")]
    pub namespace_rewrite: NamespaceRewriteArg,

    /// Trust an additional CA certificate (PEM file) for both endpoints,
    /// alongside the platform trust store. For servers behind an
    /// internal or self-signed CA.
    #[arg(long)]
    pub ca_cert: Option<std::path::PathBuf>,
}

/// `clap`-friendly mirror of [`NamespaceRewrite`]; `clap::ValueEnum` cannot
/// be derived on the library-facing type without pulling `clap` into every
/// consumer of [`crate::folder`], so the CLI layer owns this tiny adapter.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum NamespaceRewriteArg {
    Off,
    AlwaysPrefix,
    PrefixWhenNested,
}

impl From<NamespaceRewriteArg> for NamespaceRewrite {
    fn from(value: NamespaceRewriteArg) -> Self {
        match value {
            NamespaceRewriteArg::Off => Self::Off,
            NamespaceRewriteArg::AlwaysPrefix => Self::AlwaysPrefix,
            NamespaceRewriteArg::PrefixWhenNested => Self::PrefixWhenNested,
        }
    }
}

impl Config {
    /// Build and validate a [`Config`] from parsed CLI arguments.
    ///
    /// Passwords fall back to the `SOURCE_PASS`/`DEST_PASS` environment
    /// variables when not given on the command line. All failures are
    /// `ConfigInvalid` and surface before any network connection opens.
    pub fn from_args(args: Args) -> Result<Self, Error> {
        let extra_ca_pem = args
            .ca_cert
            .as_ref()
            .map(std::fs::read)
            .transpose()
            .map_err(|e| Error::config(format!("failed to read --ca-cert file: {e}")))?;

        let source_pass = args
            .source_pass
            .or_else(|| env::var("SOURCE_PASS").ok())
            .unwrap_or_default();
        let dest_pass = args
            .dest_pass
            .or_else(|| env::var("DEST_PASS").ok())
            .unwrap_or_default();

        let config = Self {
            source: Endpoint {
                host: args.source_host,
                port: args.port,
                user: args.source_user,
                pass: source_pass,
            },
            dest: Endpoint {
                host: args.dest_host,
                port: args.port,
                user: args.dest_user,
                pass: dest_pass,
            },
            mode: match (args.folder, args.auto_mode) {
                (Some(name), false) => Mode::Folder(name),
                (None, true) => Mode::Auto,
                (None, false) => {
                    return Err(Error::config(
                        "exactly one of --folder or --auto-mode is required",
                    ));
                }
                (Some(_), true) => {
                    return Err(Error::config(
                        "--folder and --auto-mode are mutually exclusive",
                    ));
                }
            },
            timeout: Duration::from_secs(args.timeout),
            retry_count: args.retry_count,
            retry_delay: Duration::from_secs(args.retry_delay),
            log_file: args.log_file,
            cache_db: args.cache_db,
            max_message_size: args.max_message_size,
            namespace_rewrite: args.namespace_rewrite.into(),
            extra_ca_pem,
        };

        config.validate()
    }

    fn validate(self) -> Result<Self, Error> {
        let required = [
            ("source-host", &self.source.host),
            ("source-user", &self.source.user),
            ("source-pass", &self.source.pass),
            ("dest-host", &self.dest.host),
            ("dest-user", &self.dest.user),
            ("dest-pass", &self.dest.pass),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("required field '{name}' is missing or empty")));
            }
        }
        if self.source.port == 0 {
            return Err(Error::config("port must be between 1 and 65535"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be a positive integer"));
        }
        if self.max_message_size == 0 {
            return Err(Error::config("max-message-size must be a positive integer"));
        }
        Ok(self)
    }
}
