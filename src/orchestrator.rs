//! Wires configuration, IMAP sessions, and the resume cache into one
//! run, installs signal handlers, and maps the outcome to a process
//! exit code.

use crate::auto::AutoTransferDriver;
use crate::cache::Cache;
use crate::config::{Config, Mode};
use crate::engine::{ensure_destination, TransferEngine};
use crate::error::{Error, ErrorKind, Result};
use crate::imap::{ImapClient, MailSession};
use crate::progress::{ProgressReporter, TerminalProgress};
use crate::retry::RetryPolicy;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// POSIX `SIGTERM`'s signal number, used for the `128 + signum` exit
/// code contract. `tokio::signal::unix` doesn't expose the raw number
/// for a `SignalKind`, so it's named here instead.
const SIGTERM_SIGNUM: i32 = 15;

/// The process exit code a run should terminate with: `0` success,
/// `1` validation/connection/partial-failure, `130` user interrupt,
/// `128 + signum` for other terminating signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: Self = Self(0);
    pub const FAILURE: Self = Self(1);
    pub const SIGINT: Self = Self(130);
}

/// Summary of one orchestrated run, used only to decide the exit code.
struct Outcome {
    failed: usize,
}

/// Owns both IMAP sessions and the resume cache for one run's
/// duration. Built once by the binary entry point and passed by value
/// into [`Orchestrator::run`] -- never stashed behind a global -- so
/// the signal-handling task can only reach these resources through the
/// `cancel` flag it's handed, not through the resources themselves.
pub struct Orchestrator {
    config: Config,
    cache: Cache,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(config: Config) -> rusqlite::Result<Self> {
        let cache = Cache::open(&config.cache_db)?;
        Ok(Self { config, cache, cancel: Arc::new(AtomicBool::new(false)) })
    }

    /// Run the configured transfer to completion, racing it against
    /// `SIGINT`/`SIGTERM`. Always returns a code; never panics on a
    /// transfer error.
    pub async fn run(self) -> ExitCode {
        let cancel = Arc::clone(&self.cancel);
        let signal_exit = Arc::new(AtomicI32::new(-1));
        let watcher_exit = Arc::clone(&signal_exit);
        let watcher = tokio::spawn(async move {
            wait_for_terminating_signal(&cancel, &watcher_exit).await;
        });

        let mut source = ImapClient::new(self.config.source.clone());
        let mut dest = ImapClient::new(self.config.dest.clone());
        if let Some(pem) = &self.config.extra_ca_pem {
            source = source.with_extra_ca_cert(pem.clone());
            dest = dest.with_extra_ca_cert(pem.clone());
        }
        let result = self.execute(&mut source, &mut dest).await;
        watcher.abort();

        let signalled = signal_exit.load(Ordering::SeqCst);
        if signalled >= 0 {
            return ExitCode(signalled);
        }

        match result {
            Ok(outcome) if outcome.failed == 0 => ExitCode::SUCCESS,
            Ok(_) => {
                warn!("run completed with one or more failures");
                ExitCode::FAILURE
            }
            Err(err) => {
                tracing::error!("run failed: {err}");
                ExitCode::FAILURE
            }
        }
    }

    async fn execute<S: MailSession, D: MailSession>(&self, source: &mut S, dest: &mut D) -> Result<Outcome> {
        let connect_result = self.connect_both(source, dest).await;
        let transfer_result = match connect_result {
            Ok(()) => self.transfer(source, dest).await,
            Err(err) => Err(err),
        };

        source.disconnect().await;
        dest.disconnect().await;

        transfer_result
    }

    async fn connect_both<S: MailSession, D: MailSession>(&self, source: &mut S, dest: &mut D) -> Result<()> {
        source.connect().await?;
        dest.connect().await?;
        Ok(())
    }

    async fn transfer<S: MailSession, D: MailSession>(&self, source: &mut S, dest: &mut D) -> Result<Outcome> {
        let retry = RetryPolicy::new(self.config.retry_count, self.config.retry_delay);
        let mut progress = TerminalProgress::new(0);

        match &self.config.mode {
            Mode::Folder(name) => {
                ensure_destination(dest, name, name).await?;
                source
                    .select_folder(name)
                    .await
                    .map_err(|e| Error::new(ErrorKind::FolderOp, format!("select source folder {name}"), "-", e))?;
                dest.select_folder(name)
                    .await
                    .map_err(|e| Error::new(ErrorKind::FolderOp, format!("select destination folder {name}"), "-", e))?;

                let engine = TransferEngine::new(&self.cache, retry, self.config.max_message_size);
                let result = engine.run(source, dest, name, name, &mut progress, &self.cancel).await?;
                info!(
                    "transfer complete: {} transferred, {} skipped, {} failed",
                    result.transferred, result.skipped, result.failed
                );
                Ok(Outcome { failed: result.failed })
            }
            Mode::Auto => {
                let driver =
                    AutoTransferDriver::new(&self.cache, retry, self.config.max_message_size, self.config.namespace_rewrite);
                let summary = driver.run(source, dest, &mut progress, &self.cancel).await?;
                Ok(Outcome { failed: summary.total_failed + summary.failures() })
            }
        }
    }
}

/// Install two logging sinks: every event at `debug` or above goes to
/// `log_file` (non-blocking, rotated by nothing -- a single growing
/// file, matching the original tool's plain append log), while only
/// `info` and above (or whatever `RUST_LOG` overrides) go to stderr for
/// the operator watching the run. The returned guard must be held for
/// the process's lifetime; dropping it early truncates the file sink.
pub fn init_logging(log_file: &str) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    let path = std::path::Path::new(log_file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path.file_name().ok_or_else(|| std::io::Error::other("log file path has no file name"))?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false).with_filter(EnvFilter::new("debug"));
    let console_layer =
        fmt::layer().with_writer(std::io::stderr).with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry().with(file_layer).with(console_layer).init();

    Ok(guard)
}

/// Waits for `SIGINT` or (on Unix) `SIGTERM`, then sets `cancel` so the
/// running transfer loop raises `INTERRUPTED` at its next iteration
/// boundary, and records the exit code the signal implies.
async fn wait_for_terminating_signal(cancel: &AtomicBool, exit_code: &AtomicI32) {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(err) => {
                warn!("failed to install SIGTERM handler: {err}");
                let _ = tokio::signal::ctrl_c().await;
                cancel.store(true, Ordering::SeqCst);
                exit_code.store(ExitCode::SIGINT.0, Ordering::SeqCst);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.store(true, Ordering::SeqCst);
                exit_code.store(ExitCode::SIGINT.0, Ordering::SeqCst);
            }
            _ = sigterm.recv() => {
                cancel.store(true, Ordering::SeqCst);
                exit_code.store(128 + SIGTERM_SIGNUM, Ordering::SeqCst);
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        cancel.store(true, Ordering::SeqCst);
        exit_code.store(ExitCode::SIGINT.0, Ordering::SeqCst);
    }
}
