//! Bulk upload/import orchestration: validate → scan → summarise → submit.
//!
//! A [`BulkRequest`] carries the flags of one command invocation; nothing is
//! kept in module state, so two runs never see each other's files or results.

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::interrupt;
use crate::pipeline::{submit_sequential, Submitter};
use crate::scanner::{self, AcceptFilter, ScanError, ScannedFile};

/// Flags shared by `upload` and `importWord`.
#[derive(Debug, Clone, Default)]
pub struct BulkRequest {
    pub paths: Vec<PathBuf>,
    pub recursive: bool,
    pub dry_run: bool,
    /// Destination for the not-uploaded log; stderr when `None`.
    pub logfile: Option<PathBuf>,
}

/// Everything a bulk run produced.
#[derive(Debug)]
pub struct BulkOutcome<T> {
    /// The filtered scan, with per-file uploaded flags.
    pub files: Vec<ScannedFile>,
    pub results: Vec<T>,
    pub failed: usize,
    pub interrupted: bool,
    pub dry_run: bool,
}

impl<T> BulkOutcome<T> {
    pub fn not_uploaded(&self) -> Vec<&ScannedFile> {
        interrupt::not_uploaded(&self.files)
    }

    /// Whether the not-uploaded log should be written. Dry runs upload
    /// nothing on purpose, so they only log when interrupted.
    pub fn needs_log(&self) -> bool {
        (self.interrupted || !self.dry_run) && !self.not_uploaded().is_empty()
    }
}

/// Validates and scans `req.paths`, then submits the accepted files.
pub async fn run_bulk<S>(
    req: &BulkRequest,
    filter: &AcceptFilter,
    submitter: &S,
    cancel: &CancellationToken,
) -> Result<BulkOutcome<S::Output>, ScanError>
where
    S: Submitter + ?Sized,
{
    // fail fast if any input can't be read
    scanner::validate_input_paths(&req.paths)?;
    let mut files = Vec::new();
    for (i, path) in req.paths.iter().enumerate() {
        if i > 0 {
            tokio::task::yield_now().await;
            if cancel.is_cancelled() {
                warn!(scanned = files.len(), "Interrupted while scanning, nothing submitted");
                return Ok(BulkOutcome {
                    files,
                    results: Vec::new(),
                    failed: 0,
                    interrupted: true,
                    dry_run: req.dry_run,
                });
            }
        }
        files.extend(scanner::scan_files(std::slice::from_ref(path), req.recursive, filter)?);
    }

    let noun = submitter.action();
    eprintln!(
        "Found {} files to {} - total amount to {} is {}",
        files.len(),
        noun,
        noun,
        scanner::sum_file_size_human(&files)
    );
    info!(
        files = files.len(),
        bytes = scanner::sum_file_size(&files),
        dry_run = req.dry_run,
        "Bulk run starting"
    );

    let submission = submit_sequential(&files, submitter, req.dry_run, cancel).await;

    Ok(BulkOutcome {
        files,
        results: submission.results,
        failed: submission.failed,
        interrupted: submission.interrupted,
        dry_run: req.dry_run,
    })
}
