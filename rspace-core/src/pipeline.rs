//! Sequential submission of scanned files to the ELN.
//!
//! Each file goes through a [`Submitter`] in scan order. A failing file is
//! reported and skipped; it never aborts the batch. The loop stops early when
//! its cancellation token fires, leaving unsubmitted files flagged as such.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::contract::{ClientError, DocumentInfo, ElnClient, FileInfo, FileUploadConfig, WordImport};
use crate::scanner::ScannedFile;

/// One remote operation applied per scanned file.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// The entity the server creates for a file.
    type Output: Default + Send;

    /// Verb used in progress messages, e.g. `upload`.
    fn action(&self) -> &'static str;

    async fn submit(&self, file: &ScannedFile) -> Result<Self::Output, ClientError>;
}

/// Uploads each file to the Gallery with a shared caption and target folder.
pub struct FileUploader<'a, C: ElnClient + ?Sized> {
    client: &'a C,
    caption: String,
    folder_id: Option<i64>,
}

impl<'a, C: ElnClient + ?Sized> FileUploader<'a, C> {
    pub fn new(client: &'a C, caption: impl Into<String>, folder_id: Option<i64>) -> Self {
        Self {
            client,
            caption: caption.into(),
            folder_id,
        }
    }
}

#[async_trait]
impl<C: ElnClient + ?Sized> Submitter for FileUploader<'_, C> {
    type Output = FileInfo;

    fn action(&self) -> &'static str {
        "upload"
    }

    async fn submit(&self, file: &ScannedFile) -> Result<FileInfo, ClientError> {
        self.client
            .upload_file(FileUploadConfig {
                file_path: file.path.clone(),
                caption: self.caption.clone(),
                folder_id: self.folder_id,
            })
            .await
    }
}

/// Imports each file as a native document.
pub struct WordImporter<'a, C: ElnClient + ?Sized> {
    client: &'a C,
    folder_id: Option<i64>,
}

impl<'a, C: ElnClient + ?Sized> WordImporter<'a, C> {
    pub fn new(client: &'a C, folder_id: Option<i64>) -> Self {
        Self { client, folder_id }
    }
}

#[async_trait]
impl<C: ElnClient + ?Sized> Submitter for WordImporter<'_, C> {
    type Output = DocumentInfo;

    fn action(&self) -> &'static str {
        "import"
    }

    async fn submit(&self, file: &ScannedFile) -> Result<DocumentInfo, ClientError> {
        self.client
            .import_word(WordImport {
                file_path: file.path.clone(),
                folder_id: self.folder_id,
            })
            .await
    }
}

/// What a sequential run produced.
#[derive(Debug)]
pub struct Submission<T> {
    /// Created entities in submission order. In dry-run, one placeholder per file.
    pub results: Vec<T>,
    /// Files whose submission failed.
    pub failed: usize,
    /// True when the run stopped because the token was cancelled.
    pub interrupted: bool,
}

/// Submits `files` one at a time.
///
/// On success the file is marked uploaded and the created entity collected.
/// In dry-run no call is made and a default placeholder stands in for each
/// result. Cancellation is checked before each file and raced against the
/// in-flight call; an abandoned call leaves its file unmarked.
pub async fn submit_sequential<S>(
    files: &[ScannedFile],
    submitter: &S,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Submission<S::Output>
where
    S: Submitter + ?Sized,
{
    let mut submission = Submission {
        results: Vec::with_capacity(files.len()),
        failed: 0,
        interrupted: false,
    };

    for file in files {
        if cancel.is_cancelled() {
            submission.interrupted = true;
            break;
        }
        if dry_run {
            debug!(path = %file.path.display(), action = submitter.action(), "Dry run, not submitting");
            submission.results.push(S::Output::default());
            continue;
        }

        eprintln!("Uploading: {}", file.path.display());
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = submitter.submit(file) => Some(res),
        };
        match outcome {
            None => {
                warn!(path = %file.path.display(), "Submission abandoned on cancellation");
                submission.interrupted = true;
                break;
            }
            Some(Ok(created)) => {
                file.mark_uploaded();
                debug!(path = %file.path.display(), action = submitter.action(), "Submitted");
                submission.results.push(created);
            }
            Some(Err(e)) => {
                // other files may still go through, keep going
                error!(path = %file.path.display(), action = submitter.action(), error = %e, "Submission failed");
                eprintln!("{e}");
                submission.failed += 1;
            }
        }
    }

    info!(
        submitted = submission.results.len(),
        failed = submission.failed,
        interrupted = submission.interrupted,
        dry_run,
        "Sequential submission finished"
    );
    submission
}
