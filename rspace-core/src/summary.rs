//! Summary document listing uploaded files, rendered from a Jinja template.

use minijinja::{context, Environment};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::contract::FileInfo;

/// Name of the document created to hold the summary.
pub const SUMMARY_DOC_NAME: &str = "fileupload-summary";

/// Built-in template: one table row per uploaded file, linking both ids.
pub const DEFAULT_TEMPLATE: &str = r#"
<table>
 <tr> <th>Name</th><th>Id</th><th>Link</th></tr>
{% for f in files %}
 <tr>
 <td>{{ f.name }}</td>
 <td><a href="/globalId/{{ f.global_id }}">{{ f.global_id }}</a></td>
 <td><fileId={{ f.id }}></td>
 </tr>
{% endfor %}
</table>
"#;

/// The fields a template can reference for each file.
#[derive(Debug, Serialize)]
pub struct FileSummary<'a> {
    pub id: i64,
    pub global_id: &'a str,
    pub name: &'a str,
    pub size: i64,
    pub content_type: &'a str,
}

impl<'a> From<&'a FileInfo> for FileSummary<'a> {
    fn from(f: &'a FileInfo) -> Self {
        Self {
            id: f.id,
            global_id: &f.global_id,
            name: &f.name,
            size: f.size,
            content_type: &f.content_type,
        }
    }
}

#[derive(Debug)]
pub enum SummaryError {
    TemplateFile(std::io::Error),
    Template(minijinja::Error),
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryError::TemplateFile(e) => write!(f, "cannot read summary template: {e}"),
            SummaryError::Template(e) => write!(f, "invalid summary template: {e}"),
        }
    }
}

impl std::error::Error for SummaryError {}

impl From<minijinja::Error> for SummaryError {
    fn from(e: minijinja::Error) -> Self {
        SummaryError::Template(e)
    }
}

/// Renders `files` through `template` (HTML auto-escaped).
pub fn render_summary(template: &str, files: &[FileInfo]) -> Result<String, SummaryError> {
    let mut env = Environment::new();
    // the .html name turns on HTML escaping
    env.add_template("summary.html", template)?;
    let summaries: Vec<FileSummary<'_>> = files.iter().map(FileSummary::from).collect();
    let rendered = env
        .get_template("summary.html")?
        .render(context! { files => summaries })?;
    Ok(rendered)
}

/// Renders with the template at `template_file`, or the built-in one.
pub fn generate_summary_content(
    files: &[FileInfo],
    template_file: Option<&Path>,
) -> Result<String, SummaryError> {
    match template_file {
        Some(path) => {
            let template = std::fs::read_to_string(path).map_err(SummaryError::TemplateFile)?;
            render_summary(&template, files)
        }
        None => render_summary(DEFAULT_TEMPLATE, files),
    }
}
