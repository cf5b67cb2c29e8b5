//! Local file discovery for bulk upload and import.
//!
//! Input paths are validated up front, then walked (optionally recursively)
//! into a flat list of [`ScannedFile`] records. Hidden entries matching the
//! dotfile pattern never make it into the list; an [`AcceptFilter`] then
//! narrows the collected files.

use regex::Regex;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

static DOTFILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.[A-Za-z0-9\-_]+").expect("dotfile pattern is valid"));

/// Extensions accepted by [`AcceptFilter::word_documents`].
pub const WORD_EXTENSIONS: [&str; 3] = ["doc", "docx", "odt"];

/// Filesystem metadata captured at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// A local file awaiting submission, and whether its submission succeeded.
///
/// The uploaded flag is atomic so the record can be shared with whoever
/// reports progress while the submission loop is still running. Once set it
/// is never cleared.
#[derive(Debug)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub meta: FileMeta,
    uploaded: AtomicBool,
}

impl ScannedFile {
    pub fn new(path: PathBuf, meta: FileMeta) -> Self {
        Self {
            path,
            meta,
            uploaded: AtomicBool::new(false),
        }
    }

    pub fn mark_uploaded(&self) {
        self.uploaded.store(true, Ordering::Release);
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded.load(Ordering::Acquire)
    }

    /// Lower-cased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Decides which scanned files go on to submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptFilter {
    AcceptAll,
    RejectAll,
    /// Lower-case extensions without the leading dot.
    Extensions(Vec<String>),
}

impl AcceptFilter {
    /// `.doc`, `.docx` and `.odt`, case-insensitively.
    pub fn word_documents() -> Self {
        AcceptFilter::Extensions(WORD_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }

    /// Build an extension filter from values like `.PDF` or `png`.
    pub fn extensions<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AcceptFilter::Extensions(
            exts.into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        )
    }

    pub fn accepts(&self, file: &ScannedFile) -> bool {
        match self {
            AcceptFilter::AcceptAll => true,
            AcceptFilter::RejectAll => false,
            AcceptFilter::Extensions(exts) => file
                .extension()
                .map(|ext| exts.iter().any(|e| *e == ext))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug)]
pub enum ScanError {
    /// A command-line path could not be resolved or stat'ed.
    InvalidPath { path: PathBuf, source: std::io::Error },
    Io(std::io::Error),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::InvalidPath { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            ScanError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::InvalidPath { source, .. } => Some(source),
            ScanError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(e: std::io::Error) -> Self {
        ScanError::Io(e)
    }
}

/// True for names like `.git` or `.DS_Store`. A bare `.` or `..` is not a dotfile.
pub fn is_dotfile(name: &str) -> bool {
    DOTFILE_PATTERN.is_match(name)
}

/// Resolve `path` against the working directory and drop `.` components.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

/// Checks every path resolves and exists, stopping at the first that doesn't.
pub fn validate_input_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, ScanError> {
    let mut resolved = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let abs = absolute_path(path).map_err(|source| ScanError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })?;
        if let Err(source) = std::fs::metadata(&abs) {
            warn!(path = %abs.display(), error = %source, "Input path failed validation");
            return Err(ScanError::InvalidPath { path: abs, source });
        }
        resolved.push(abs);
    }
    Ok(resolved)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn scanned(path: PathBuf, md: &std::fs::Metadata) -> ScannedFile {
    let meta = FileMeta {
        name: file_name_of(&path),
        size: md.len(),
        is_dir: md.is_dir(),
    };
    ScannedFile::new(path, meta)
}

/// Walks `paths` into a flat file list, then keeps what `filter` accepts.
///
/// Directories are read in file-name order. Entries matching the dotfile
/// pattern are skipped, and dot-directories below an input are never
/// descended into. The same file reached through two inputs appears twice.
pub fn scan_files<P: AsRef<Path>>(
    paths: &[P],
    recurse: bool,
    filter: &AcceptFilter,
) -> Result<Vec<ScannedFile>, ScanError> {
    let mut collected = Vec::new();
    for input in paths {
        let input = input.as_ref();
        eprintln!("processing {}", input.display());
        let abs = absolute_path(input)?;
        let md = std::fs::metadata(&abs).map_err(|source| ScanError::InvalidPath {
            path: abs.clone(),
            source,
        })?;
        if md.is_dir() {
            eprintln!("Scanning for files in {}", file_name_of(&abs));
            if recurse {
                walk_tree(&abs, &mut collected);
            } else {
                read_single_dir(&abs, &mut collected)?;
            }
        } else {
            collected.push(scanned(abs, &md));
        }
    }

    let before = collected.len();
    let accepted: Vec<ScannedFile> = collected.into_iter().filter(|f| filter.accepts(f)).collect();
    info!(
        scanned = before,
        accepted = accepted.len(),
        recurse,
        "File scan complete"
    );
    Ok(accepted)
}

fn walk_tree(root: &Path, files: &mut Vec<ScannedFile>) {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let prune = entry.depth() > 0
                && entry.file_type().is_dir()
                && is_dotfile(&entry.file_name().to_string_lossy());
            if prune {
                eprintln!("Skipping .folder {}", entry.path().display());
            }
            !prune
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry during scan");
                continue;
            }
        };
        if entry.file_type().is_dir() || is_dotfile(&entry.file_name().to_string_lossy()) {
            continue;
        }
        if let Some(md) = file_metadata(entry.path()) {
            files.push(scanned(entry.into_path(), &md));
        }
    }
}

fn read_single_dir(dir: &Path, files: &mut Vec<ScannedFile>) -> Result<(), ScanError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "Skipping unreadable entry during scan");
                None
            }
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = match entry.file_type() {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                warn!(error = %e, name = %name, "Skipping entry of unknown type");
                continue;
            }
        };
        if is_dir || is_dotfile(&name) {
            debug!(name = %name, "Not scanning entry in non-recursive mode");
            continue;
        }
        let path = dir.join(&name);
        if let Some(md) = file_metadata(&path) {
            files.push(scanned(path, &md));
        }
    }
    Ok(())
}

/// Metadata of a regular file, following symlinks. Directories reached via a
/// link and entries that can't be stat'ed (dangling links, races) are skipped.
fn file_metadata(path: &Path) -> Option<std::fs::Metadata> {
    match std::fs::metadata(path) {
        Ok(md) if md.is_dir() => {
            debug!(path = %path.display(), "Not scanning linked directory");
            None
        }
        Ok(md) => Some(md),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Skipping entry without metadata");
            None
        }
    }
}

/// Total size in bytes. Zero for an empty list.
pub fn sum_file_size(files: &[ScannedFile]) -> u64 {
    files.iter().map(|f| f.meta.size).sum()
}

pub fn sum_file_size_human(files: &[ScannedFile]) -> String {
    humanize_bytes(sum_file_size(files))
}

/// SI rendering, e.g. `4.2 MB` or `830 kB`.
pub fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
    if bytes < 10 {
        return format!("{bytes} B");
    }
    let mut exp = 0;
    let mut scale = 1u64;
    while exp + 1 < UNITS.len() && bytes / scale >= 1000 {
        scale *= 1000;
        exp += 1;
    }
    let value = ((bytes as f64 / scale as f64) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{:.1} {}", value, UNITS[exp])
    } else {
        format!("{:.0} {}", value, UNITS[exp])
    }
}
