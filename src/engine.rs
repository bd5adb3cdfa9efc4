//! The per-folder transfer pipeline: search, diff against the resume
//! cache, then fetch/append/mark one message at a time.

use crate::cache::Cache;
use crate::error::{Error, ErrorKind, Result};
use crate::imap::{MailSession, Message};
use crate::progress::ProgressReporter;
use crate::retry::RetryPolicy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::warn;

/// Aggregate outcome of one folder's transfer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferResult {
    pub total: usize,
    pub transferred: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_size_bytes: u64,
    pub duration_seconds: f64,
    pub errors: Vec<String>,
}

/// Runs the fetch/append/mark pipeline for a single folder pair.
pub struct TransferEngine<'a> {
    cache: &'a Cache,
    retry: RetryPolicy,
    max_message_size: u64,
}

impl<'a> TransferEngine<'a> {
    #[must_use]
    pub const fn new(cache: &'a Cache, retry: RetryPolicy, max_message_size: u64) -> Self {
        Self { cache, retry, max_message_size }
    }

    /// Transfer every not-yet-transferred message from `f_src` on `source`
    /// to `f_dst` on `dest`. Both sessions must already have `f_src` /
    /// `f_dst` selected as appropriate (`source` for search/fetch, the
    /// caller owns `select_folder` on `dest` before calling this).
    ///
    /// `cancel` is polled at each message boundary; once set, the loop
    /// raises `INTERRUPTED` instead of starting the next transfer, per
    /// the orchestrator's signal-handling contract.
    pub async fn run<S, D>(
        &self,
        source: &mut S,
        dest: &mut D,
        f_src: &str,
        f_dst: &str,
        progress: &mut dyn ProgressReporter,
        cancel: &AtomicBool,
    ) -> Result<TransferResult>
    where
        S: MailSession,
        D: MailSession,
    {
        let started = Instant::now();
        let uids = source.uid_search_all().await?;
        if uids.is_empty() {
            return Ok(TransferResult::default());
        }

        let already = self.cache.transferred_uids(f_src);
        let pending: Vec<u32> = uids
            .iter()
            .copied()
            .filter(|uid| !already.contains(&uid.to_string()))
            .collect();
        let total = uids.len();
        let skipped = total - pending.len();

        progress.describe(f_src);

        let mut result = TransferResult {
            total,
            skipped,
            duration_seconds: 0.0,
            ..TransferResult::default()
        };

        for uid in pending {
            if cancel.load(Ordering::SeqCst) {
                progress.close();
                return Err(Error::new(
                    ErrorKind::Interrupted,
                    format!("transfer {f_src}"),
                    "-",
                    Interrupted,
                ));
            }
            self.transfer_one(source, dest, f_src, f_dst, uid, &mut result).await;
            progress.advance(1);
        }

        progress.close();
        result.duration_seconds = started.elapsed().as_secs_f64();
        Ok(result)
    }

    async fn transfer_one<S, D>(
        &self,
        source: &mut S,
        dest: &mut D,
        f_src: &str,
        f_dst: &str,
        uid: u32,
        result: &mut TransferResult,
    ) where
        S: MailSession,
        D: MailSession,
    {
        let msg = match self
            .retry
            .run(&format!("fetch UID {uid}"), || source.fetch(uid))
            .await
        {
            Ok(msg) => msg,
            Err(err) => {
                result.failed += 1;
                result.errors.push(err.to_string());
                return;
            }
        };

        let size = msg.payload.len() as u64;
        if size > self.max_message_size {
            warn!("UID {uid} in {f_src} is {size} bytes, exceeds max-message-size; skipping");
            result.failed += 1;
            result
                .errors
                .push(format!("UID {uid} in {f_src}: {size} bytes exceeds max-message-size"));
            return;
        }

        let dest_uid = match self
            .retry
            .run(&format!("append UID {uid} to {f_dst}"), || dest.append(f_dst, &msg))
            .await
        {
            Ok(dest_uid) => dest_uid,
            Err(err) => {
                result.failed += 1;
                result.errors.push(err.to_string());
                return;
            }
        };

        let dest_uid_ref = (!dest_uid.is_empty()).then_some(dest_uid.as_str());
        self.cache.mark(f_src, &uid.to_string(), dest_uid_ref, Some(size));

        result.transferred += 1;
        result.total_size_bytes += size;
    }
}

/// Attempt to create `name` on `dest`, treating pre-existence as success.
///
/// Implements the folder-ensure step shared by auto-mode and explicit
/// single-folder runs: check first, create on miss, accept `ALREADYEXISTS`.
/// If that fails for any other reason, retries once against `fallback`
/// (the unnormalized source name) before giving up, per the spec's
/// create-destination fallback: "retry without the `INBOX.` prefix once".
/// When `fallback == name` (single-folder mode, where no rewrite is
/// applied) there is nothing distinct to retry with, so the original
/// error is returned directly.
pub async fn ensure_destination<D: MailSession>(dest: &mut D, name: &str, fallback: &str) -> Result<()> {
    match ensure_once(dest, name).await {
        Ok(()) => Ok(()),
        Err(err) if fallback != name => {
            warn!("ensure destination folder {name} failed ({err}), retrying unnormalized name {fallback}");
            ensure_once(dest, fallback).await
        }
        Err(err) => Err(err),
    }
}

async fn ensure_once<D: MailSession>(dest: &mut D, name: &str) -> Result<()> {
    if dest.folder_exists(name).await? {
        return Ok(());
    }
    dest.create_folder(name).await.map_err(|err| {
        Error::new(ErrorKind::FolderOp, format!("ensure destination folder {name}"), "-", err)
    })
}

#[derive(Debug, thiserror::Error)]
#[error("interrupted by signal")]
struct Interrupted;
