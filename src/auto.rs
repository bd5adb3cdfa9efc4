//! Discovers every non-skipped source folder and transfers each in turn.

use crate::cache::Cache;
use crate::engine::{ensure_destination, TransferEngine, TransferResult};
use crate::error::{Error, ErrorKind, Result};
use crate::folder::{is_skipped, NamespaceRewrite};
use crate::imap::MailSession;
use crate::progress::ProgressReporter;
use crate::retry::RetryPolicy;
use std::sync::atomic::AtomicBool;
use tracing::{error, info, warn};

/// One folder's outcome within an auto-mode run: either a completed
/// transfer, or a folder-level failure that didn't abort the run.
#[derive(Debug, Clone)]
pub enum FolderOutcome {
    Completed { source: String, dest: String, result: TransferResult },
    Failed { source: String, error: String },
}

/// Totals accumulated across every folder in an auto-mode run.
#[derive(Debug, Clone, Default)]
pub struct AutoTransferSummary {
    pub folders: Vec<FolderOutcome>,
    pub total_transferred: usize,
    pub total_skipped: usize,
    pub total_failed: usize,
    pub total_size_bytes: u64,
}

impl AutoTransferSummary {
    fn record(&mut self, outcome: FolderOutcome) {
        if let FolderOutcome::Completed { result, .. } = &outcome {
            self.total_transferred += result.transferred;
            self.total_skipped += result.skipped;
            self.total_failed += result.failed;
            self.total_size_bytes += result.total_size_bytes;
        }
        self.folders.push(outcome);
    }

    #[must_use]
    pub fn successes(&self) -> usize {
        self.folders.iter().filter(|f| matches!(f, FolderOutcome::Completed { .. })).count()
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.folders.iter().filter(|f| matches!(f, FolderOutcome::Failed { .. })).count()
    }
}

/// Discovers and transfers every non-skipped folder, sequentially.
pub struct AutoTransferDriver<'a> {
    cache: &'a Cache,
    retry: RetryPolicy,
    max_message_size: u64,
    namespace_rewrite: NamespaceRewrite,
}

impl<'a> AutoTransferDriver<'a> {
    #[must_use]
    pub const fn new(
        cache: &'a Cache,
        retry: RetryPolicy,
        max_message_size: u64,
        namespace_rewrite: NamespaceRewrite,
    ) -> Self {
        Self { cache, retry, max_message_size, namespace_rewrite }
    }

    /// Run the whole auto-transfer sweep. `INTERRUPTED` propagates to the
    /// caller immediately; any other per-folder error is recorded and the
    /// sweep continues with the next folder. `cancel` is checked at each
    /// folder boundary and passed through to the per-folder engine run.
    pub async fn run<S, D>(
        &self,
        source: &mut S,
        dest: &mut D,
        progress: &mut dyn ProgressReporter,
        cancel: &AtomicBool,
    ) -> Result<AutoTransferSummary>
    where
        S: MailSession,
        D: MailSession,
    {
        let all_folders = source.list_folders().await?;
        let folders: Vec<String> = all_folders.into_iter().filter(|f| !is_skipped(f)).collect();
        info!("discovered {} folder(s) to transfer: {:?}", folders.len(), folders);

        let mut summary = AutoTransferSummary::default();
        let engine = TransferEngine::new(self.cache, self.retry, self.max_message_size);

        for f_src in folders {
            if cancel.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::new(ErrorKind::Interrupted, "auto-transfer sweep", "-", Interrupted));
            }
            match self.transfer_folder(source, dest, &f_src, &engine, progress, cancel).await {
                Ok(outcome) => summary.record(outcome),
                Err(err) if err.kind == ErrorKind::Interrupted => return Err(err),
                Err(err) => {
                    error!("folder {f_src} failed: {err}");
                    summary.record(FolderOutcome::Failed { source: f_src, error: err.to_string() });
                }
            }
        }

        info!(
            "auto-transfer complete: {}/{} folders succeeded, {} transferred, {} skipped, {} failed, {} bytes",
            summary.successes(),
            summary.folders.len(),
            summary.total_transferred,
            summary.total_skipped,
            summary.total_failed,
            summary.total_size_bytes,
        );
        for outcome in &summary.folders {
            match outcome {
                FolderOutcome::Completed { source, dest, result } => info!(
                    "  {source} -> {dest}: {} transferred, {} skipped, {} failed",
                    result.transferred, result.skipped, result.failed
                ),
                FolderOutcome::Failed { source, error } => warn!("  {source}: FAILED ({error})"),
            }
        }

        Ok(summary)
    }

    async fn transfer_folder<S, D>(
        &self,
        source: &mut S,
        dest: &mut D,
        f_src: &str,
        engine: &TransferEngine<'_>,
        progress: &mut dyn ProgressReporter,
        cancel: &AtomicBool,
    ) -> Result<FolderOutcome>
    where
        S: MailSession,
        D: MailSession,
    {
        let f_dst = self.namespace_rewrite.normalize(f_src);

        ensure_destination(dest, &f_dst, f_src).await?;

        source
            .select_folder(f_src)
            .await
            .map_err(|e| Error::new(ErrorKind::FolderOp, format!("select source folder {f_src}"), "-", e))?;

        if dest.select_folder(&f_dst).await.is_err() {
            warn!("select {f_dst} on destination failed, retrying unnormalized name {f_src}");
            dest.select_folder(f_src)
                .await
                .map_err(|e| Error::new(ErrorKind::FolderOp, format!("select destination folder {f_dst}"), "-", e))?;
        }

        let result = engine.run(source, dest, f_src, &f_dst, progress, cancel).await?;
        Ok(FolderOutcome::Completed { source: f_src.to_string(), dest: f_dst, result })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("interrupted by signal")]
struct Interrupted;
