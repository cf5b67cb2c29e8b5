//! Command bodies, one per subcommand, generic over the client so tests can
//! drive them with `MockElnClient`.
//!
//! Bulk commands own their interrupt listener for the duration of the run and
//! release it on the way out; the `*_with_token` variants take an external
//! token instead, which is how cancellation is exercised in tests.

use anyhow::{anyhow, bail, Context, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use rspace_core::bulk::{run_bulk, BulkOutcome, BulkRequest};
use rspace_core::contract::ElnClient;
use rspace_core::format::{DocListFormatter, FileListFormatter, Output, OutputFormat, UserListFormatter};
use rspace_core::interrupt::{log_not_uploaded, spawn_listener};
use rspace_core::pipeline::{FileUploader, WordImporter};
use rspace_core::pool::{run_pool, DEFAULT_WORKERS};
use rspace_core::report::{report_imports, report_uploads, report_users, UploadReportOptions};
use rspace_core::scanner::AcceptFilter;
use rspace_core::users::{read_user_rows, UserRow};

use crate::cli::{AddUserArgs, ImportArgs, ListingArgs, UploadArgs};

/// Results go to `out_file` when given, else stdout.
pub fn open_output(format: OutputFormat, out_file: Option<&Path>) -> Result<Output> {
    let writer: Box<dyn Write + Send> = match out_file {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Could not create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    Ok(Output::new(format, writer))
}

pub async fn status<C, W>(client: &C, out: &mut Output<W>) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let status = client
        .status()
        .await
        .map_err(|e| anyhow!("Could not get server status: {e}"))?;
    out.write_line(&format!("{}, {}", status.rspace_version, status.message))?;
    Ok(())
}

/// Runs `fut` with a signal listener cancelling `token`, then releases the
/// listener whatever the outcome. A signal that `fut` never saw, e.g. one
/// landing after the last check, still fails the command.
async fn with_interrupt_listener<F>(token: CancellationToken, fut: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let listener = spawn_listener(token);
    let result = fut.await;
    if listener.release().await {
        // the body's own interrupt error says more, keep it
        result?;
        bail!("interrupted");
    }
    result
}

/// Writes the not-uploaded log when needed and turns an interrupt into an
/// error. A cancellation arriving after submission ended counts as one.
async fn finish_bulk<T>(
    outcome: &mut BulkOutcome<T>,
    req: &BulkRequest,
    cancel: &CancellationToken,
) -> Result<()> {
    // a signal already delivered must be seen before deciding
    tokio::task::yield_now().await;
    if cancel.is_cancelled() {
        outcome.interrupted = true;
    }
    if outcome.needs_log() {
        log_not_uploaded(&outcome.files, req.logfile.as_deref())
            .context("Could not write the list of files that weren't uploaded")?;
    }
    if outcome.interrupted {
        bail!(
            "interrupted: {} files weren't uploaded",
            outcome.not_uploaded().len()
        );
    }
    if outcome.failed > 0 {
        warn!(failed = outcome.failed, "Some files could not be submitted");
    }
    Ok(())
}

/// The interrupt or log error wins over a failure to print results.
fn settle(finished: Result<()>, reported: io::Result<()>) -> Result<()> {
    if let Err(e) = &reported {
        error!(error = %e, "Could not write results");
    }
    finished.and(reported.context("Could not write results"))
}

pub async fn upload<C, W>(client: &C, args: &UploadArgs, out: &mut Output<W>) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let token = CancellationToken::new();
    with_interrupt_listener(token.clone(), upload_with_token(client, args, out, &token)).await
}

pub async fn upload_with_token<C, W>(
    client: &C,
    args: &UploadArgs,
    out: &mut Output<W>,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let req = args.bulk.to_request();
    let uploader = FileUploader::new(client, args.caption.clone(), args.folder);
    let mut outcome = run_bulk(&req, &AcceptFilter::AcceptAll, &uploader, cancel).await?;

    let opts = UploadReportOptions {
        dry_run: req.dry_run,
        add_summary: args.add_summary,
        summary_template: args.summary_template.as_deref(),
    };
    let reported = report_uploads(client, &outcome.results, &opts, out).await;
    let finished = finish_bulk(&mut outcome, &req, cancel).await;
    settle(finished, reported)
}

pub async fn import_word<C, W>(client: &C, args: &ImportArgs, out: &mut Output<W>) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let token = CancellationToken::new();
    with_interrupt_listener(token.clone(), import_word_with_token(client, args, out, &token)).await
}

pub async fn import_word_with_token<C, W>(
    client: &C,
    args: &ImportArgs,
    out: &mut Output<W>,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let req = args.bulk.to_request();
    let importer = WordImporter::new(client, args.folder);
    let mut outcome = run_bulk(&req, &AcceptFilter::word_documents(), &importer, cancel).await?;
    let reported = report_imports(&outcome.results, req.dry_run, out);
    let finished = finish_bulk(&mut outcome, &req, cancel).await;
    settle(finished, reported)
}

/// Creates one user from flags, or every user in `--userfile` through the
/// worker pool.
pub async fn add_user<C, W>(client: Arc<C>, args: &AddUserArgs, out: &mut Output<W>) -> Result<()>
where
    C: ElnClient + 'static,
    W: Write,
{
    match &args.userfile {
        Some(userfile) => add_users_from_file(client, userfile, out).await,
        None => add_single_user(client.as_ref(), args, out).await,
    }
}

async fn add_single_user<C, W>(client: &C, args: &AddUserArgs, out: &mut Output<W>) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let pwdfile = args
        .pwdfile
        .as_ref()
        .ok_or_else(|| anyhow!("--pwdfile is required when creating a single user"))?;
    let password = std::fs::read_to_string(pwdfile)
        .with_context(|| format!("Could not read password file {}", pwdfile.display()))?;

    let row = UserRow {
        first_name: args.first.clone(),
        last_name: args.last.clone(),
        email: args.email.clone().unwrap_or_default(),
        role: args.role.clone(),
        username: args.username.clone().unwrap_or_default(),
        password: password.trim().to_string(),
        affiliation: args.affiliation.clone(),
        api_key: String::new(),
    };
    let post = row.into_post()?;
    info!(username = %post.username, "Creating single user");
    let created = client
        .create_user(post)
        .await
        .map_err(|e| anyhow!("User creation failed: {e}"))?;
    out.write_result(&UserListFormatter(std::slice::from_ref(&created)))?;
    Ok(())
}

pub async fn add_users_from_file<C, W>(
    client: Arc<C>,
    userfile: &Path,
    out: &mut Output<W>,
) -> Result<()>
where
    C: ElnClient + 'static,
    W: Write,
{
    let file = File::open(userfile)
        .with_context(|| format!("Could not open user file {}", userfile.display()))?;
    let rows = read_user_rows(file)?;
    info!(rows = rows.len(), userfile = ?userfile, "Read user rows");

    let outcomes = run_pool(rows, DEFAULT_WORKERS, move |row: UserRow| {
        let client = Arc::clone(&client);
        async move {
            let post = row.into_post()?;
            client.create_user(post).await
        }
    })
    .await;

    let failures = report_users(outcomes, out)?;
    if failures > 0 {
        error!(failures, "Some users could not be created");
    }
    Ok(())
}

pub async fn list_files<C, W>(
    client: &C,
    listing: &ListingArgs,
    media_type: Option<String>,
    out: &mut Output<W>,
) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let list = client
        .files(listing.to_config(), media_type)
        .await
        .map_err(|e| anyhow!("Could not list files: {e}"))?;
    info!(total_hits = list.total_hits, shown = list.files.len(), "Listed files");
    out.write_result(&FileListFormatter(&list.files))?;
    Ok(())
}

pub async fn list_documents<C, W>(
    client: &C,
    listing: &ListingArgs,
    query: Option<String>,
    out: &mut Output<W>,
) -> Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    let list = client
        .documents(listing.to_config(), query)
        .await
        .map_err(|e| anyhow!("Could not list documents: {e}"))?;
    info!(total_hits = list.total_hits, shown = list.documents.len(), "Listed documents");
    out.write_result(&DocListFormatter(&list.documents))?;
    Ok(())
}
