//! Output formatting shared by every command that prints a result list.
//!
//! A command wraps its results in a [`ResultListFormatter`] and hands it to
//! [`Output::write_result`], which renders JSON, a fixed-width table, CSV, or
//! just the ids, depending on the selected [`OutputFormat`].

use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::contract::{DocumentInfo, FileInfo, UserInfo};

/// Width of timestamp columns; longer values are cut.
pub const DISPLAY_TIMESTAMP_WIDTH: usize = 16;

/// Upper bound for the name column width.
pub const MAX_NAME_WIDTH: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
    Csv,
    Quiet,
}

impl OutputFormat {
    pub const VALID: [&'static str; 4] = ["json", "csv", "quiet", "table"];
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "quiet" => Ok(OutputFormat::Quiet),
            _ => Err(format!(
                "Invalid outputFormat argument: must be one of: {}",
                Self::VALID.join(",")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Quiet => "quiet",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub title: String,
    pub width: usize,
}

impl ColumnDef {
    pub fn new(title: &str, width: usize) -> Self {
        Self {
            title: title.to_string(),
            width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableResult {
    pub headers: Vec<ColumnDef>,
    pub content: Vec<Vec<String>>,
}

/// A list of results that can be rendered in any [`OutputFormat`].
pub trait ResultListFormatter {
    fn to_json(&self) -> String;
    fn to_table(&self) -> TableResult;
    /// One identifier per result.
    fn to_quiet(&self) -> Vec<String>;
}

/// Cuts `s` to `max_len` chars ending in `..`. Widths of 3 or less never cut.
pub fn abbreviate(s: &str, max_len: usize) -> String {
    if max_len > 3 && s.chars().count() > max_len {
        let mut cut: String = s.chars().take(max_len - 2).collect();
        cut.push_str("..");
        cut
    } else {
        s.to_string()
    }
}

/// Longest name, capped at [`MAX_NAME_WIDTH`].
pub fn max_name_width<'a, I>(names: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH)
}

fn timestamp(s: &str) -> String {
    s.chars().take(DISPLAY_TIMESTAMP_WIDTH).collect()
}

fn pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Where results go, and in which format.
pub struct Output<W: Write = Box<dyn Write + Send>> {
    format: OutputFormat,
    writer: W,
}

impl<W: Write> Output<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self { format, writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes one line to the result stream.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{line}")
    }

    pub fn write_result(&mut self, formatter: &dyn ResultListFormatter) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write_line(&formatter.to_json())?,
            OutputFormat::Quiet => {
                for id in formatter.to_quiet() {
                    self.write_line(&id)?;
                }
            }
            OutputFormat::Csv => self.write_csv(&formatter.to_table())?,
            OutputFormat::Table => self.write_table(&formatter.to_table())?,
        }
        self.writer.flush()
    }

    fn write_table(&mut self, table: &TableResult) -> io::Result<()> {
        let header = table
            .headers
            .iter()
            .map(|h| format!("{:<width$}", abbreviate(&h.title, h.width), width = h.width))
            .collect::<Vec<_>>()
            .join("\t");
        self.write_line(&header)?;
        for row in &table.content {
            let line = row
                .iter()
                .zip(&table.headers)
                .map(|(cell, h)| format!("{:<width$}", abbreviate(cell, h.width), width = h.width))
                .collect::<Vec<_>>()
                .join("\t");
            self.write_line(&line)?;
        }
        Ok(())
    }

    fn write_csv(&mut self, table: &TableResult) -> io::Result<()> {
        let mut csv = csv::Writer::from_writer(&mut self.writer);
        csv.write_record(table.headers.iter().map(|h| h.title.as_str()))?;
        for row in &table.content {
            csv.write_record(row)?;
        }
        csv.flush()
    }
}

/// Gallery files.
pub struct FileListFormatter<'a>(pub &'a [FileInfo]);

impl ResultListFormatter for FileListFormatter<'_> {
    fn to_json(&self) -> String {
        pretty_json(self.0)
    }

    fn to_table(&self) -> TableResult {
        let name_width = max_name_width(self.0.iter().map(|f| f.name.as_str()));
        let headers = vec![
            ColumnDef::new("Id", 8),
            ColumnDef::new("GlobalId", 10),
            ColumnDef::new("Name", name_width),
            ColumnDef::new("Created", DISPLAY_TIMESTAMP_WIDTH),
            ColumnDef::new("Size", 12),
            ColumnDef::new("ContentType", 25),
        ];
        let content = self
            .0
            .iter()
            .map(|f| {
                vec![
                    f.id.to_string(),
                    f.global_id.clone(),
                    f.name.clone(),
                    timestamp(&f.created),
                    f.size.to_string(),
                    f.content_type.clone(),
                ]
            })
            .collect();
        TableResult { headers, content }
    }

    fn to_quiet(&self) -> Vec<String> {
        self.0.iter().map(|f| f.id.to_string()).collect()
    }
}

/// Documents.
pub struct DocListFormatter<'a>(pub &'a [DocumentInfo]);

impl ResultListFormatter for DocListFormatter<'_> {
    fn to_json(&self) -> String {
        pretty_json(self.0)
    }

    fn to_table(&self) -> TableResult {
        let headers = vec![
            ColumnDef::new("Id", 8),
            ColumnDef::new("GlobalId", 10),
            ColumnDef::new("Name", MAX_NAME_WIDTH),
            ColumnDef::new("Created", DISPLAY_TIMESTAMP_WIDTH),
        ];
        let content = self
            .0
            .iter()
            .map(|d| {
                vec![
                    d.id.to_string(),
                    d.global_id.clone(),
                    d.name.clone(),
                    timestamp(&d.created),
                ]
            })
            .collect();
        TableResult { headers, content }
    }

    fn to_quiet(&self) -> Vec<String> {
        self.0.iter().map(|d| d.id.to_string()).collect()
    }
}

/// User accounts.
pub struct UserListFormatter<'a>(pub &'a [UserInfo]);

impl ResultListFormatter for UserListFormatter<'_> {
    fn to_json(&self) -> String {
        pretty_json(self.0)
    }

    fn to_table(&self) -> TableResult {
        let headers = vec![
            ColumnDef::new("Id", 8),
            ColumnDef::new("Username", 20),
            ColumnDef::new("FirstName", 15),
            ColumnDef::new("LastName", 15),
            ColumnDef::new("Email", 30),
            ColumnDef::new("PI", 5),
        ];
        let content = self
            .0
            .iter()
            .map(|u| {
                vec![
                    u.id.to_string(),
                    u.username.clone(),
                    u.first_name.clone(),
                    u.last_name.clone(),
                    u.email.clone(),
                    u.has_pi_role.to_string(),
                ]
            })
            .collect();
        TableResult { headers, content }
    }

    fn to_quiet(&self) -> Vec<String> {
        self.0.iter().map(|u| u.id.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviate_cuts_long_values() {
        assert_eq!(abbreviate("abcdefg", 6), "abcd..");
        assert_eq!(abbreviate("abcde", 3), "abcde");
        assert_eq!(abbreviate("abc", 3), "abc");
    }

    #[test]
    fn name_width_is_capped() {
        assert_eq!(max_name_width(["abcde", "abcdefdfkdsfj"]), 13);
        assert_eq!(
            max_name_width(["abcde", "abcdefdfsdfdsfdsfdsfdsfdsfdsfsdfdsfkdsfj"]),
            MAX_NAME_WIDTH
        );
        assert_eq!(max_name_width(Vec::<&str>::new()), 0);
    }
}
