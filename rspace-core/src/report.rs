//! Result reporting for bulk commands.
//!
//! Reporting runs both at the end of a normal run and on interrupt, with
//! whatever has been created so far.

use std::io::{self, Write};
use std::path::Path;
use tracing::{error, info};

use crate::contract::{DocumentInfo, ElnClient, FileInfo, NewDocument, UserInfo};
use crate::format::{DocListFormatter, FileListFormatter, Output, UserListFormatter};
use crate::pool::TaskOutcome;
use crate::summary::{generate_summary_content, SUMMARY_DOC_NAME};

/// How uploaded files should be reported.
#[derive(Debug, Clone, Default)]
pub struct UploadReportOptions<'a> {
    pub dry_run: bool,
    pub add_summary: bool,
    pub summary_template: Option<&'a Path>,
}

/// Reports uploaded files. Dry runs only print a count.
pub async fn report_uploads<C, W>(
    client: &C,
    uploaded: &[FileInfo],
    opts: &UploadReportOptions<'_>,
    out: &mut Output<W>,
) -> io::Result<()>
where
    C: ElnClient + ?Sized,
    W: Write,
{
    if opts.dry_run {
        eprintln!("File upload would upload {} files", uploaded.len());
        return Ok(());
    }
    if opts.add_summary {
        add_summary_doc(client, uploaded, opts.summary_template).await;
    }
    eprintln!("Reporting {} results:", uploaded.len());
    out.write_result(&FileListFormatter(uploaded))
}

/// Reports imported documents. Dry runs only print a count.
pub fn report_imports<W: Write>(
    imported: &[DocumentInfo],
    dry_run: bool,
    out: &mut Output<W>,
) -> io::Result<()> {
    if dry_run {
        eprintln!("File import would import {} files", imported.len());
        return Ok(());
    }
    eprintln!("Reporting {} results:", imported.len());
    out.write_result(&DocListFormatter(imported))
}

/// Writes created users through the formatter and failures to stderr.
/// Failed row numbers are 1-based data rows (the header is row 0).
pub fn report_users<W: Write>(
    outcomes: Vec<TaskOutcome<UserInfo>>,
    out: &mut Output<W>,
) -> io::Result<usize> {
    let mut created = Vec::new();
    let mut failures = 0;
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Succeeded { index, value } => created.push((index, value)),
            TaskOutcome::Failed { index, error } => {
                failures += 1;
                eprintln!("user creation failed for row {}: {}", index + 1, error);
            }
        }
    }
    // outcomes arrive in completion order; print in CSV order
    created.sort_by_key(|(index, _)| *index);
    let created: Vec<UserInfo> = created.into_iter().map(|(_, user)| user).collect();
    eprintln!("Created {} users, {} failed", created.len(), failures);
    out.write_result(&UserListFormatter(&created))?;
    Ok(failures)
}

/// Creates the summary document. Failures are logged, never returned.
pub async fn add_summary_doc<C>(client: &C, uploaded: &[FileInfo], template_file: Option<&Path>)
where
    C: ElnClient + ?Sized,
{
    let content = match generate_summary_content(uploaded, template_file) {
        Ok(content) => content,
        Err(e) => {
            error!(error = %e, "Could not render summary document");
            eprintln!("{e}");
            return;
        }
    };
    info!(bytes = content.len(), "Rendered summary content");
    let req = NewDocument {
        name: SUMMARY_DOC_NAME.to_string(),
        tags: String::new(),
        content,
    };
    match client.new_basic_document_with_content(req).await {
        Ok(doc) => eprintln!("Created summary with id {}", doc.global_id),
        Err(e) => {
            error!(error = %e, "Could not create summary document");
            eprintln!("{e}");
        }
    }
}
