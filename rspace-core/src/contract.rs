//! # contract: the ELN client interface and the entities it exchanges
//!
//! This module defines a single trait ([`ElnClient`]) plus the request and
//! response types that flow across it. Everything else in the core crate talks
//! to the remote notebook only through this trait, so commands can be driven
//! by the real HTTP client in the CLI crate or by a `mockall` mock in tests.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockElnClient` is exported when the
//!   `test-export-mocks` feature is on (it is by default) so downstream crates
//!   can use it in their own tests.
//!
//! ## Type Sources
//! - Field names follow the JSON the RSpace API produces (camelCase on the
//!   wire, snake_case in Rust).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mockall::automock;

/// Error returned by every client call. Transport, HTTP status and decoding
/// failures all surface through this one boxed type.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Server version and health, as returned by `GET /status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub message: String,
    pub rspace_version: String,
}

/// A file stored in the Gallery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    pub id: i64,
    pub global_id: String,
    pub name: String,
    pub caption: Option<String>,
    pub content_type: String,
    pub created: String,
    pub size: i64,
    pub version: i64,
}

/// Summary of a structured or basic document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentInfo {
    pub id: i64,
    pub global_id: String,
    pub name: String,
    pub created: String,
    pub last_modified: String,
    pub tags: Option<String>,
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub home_folder_id: Option<i64>,
    pub workbench_id: Option<i64>,
    pub has_pi_role: bool,
    pub has_sys_admin_role: bool,
}

/// One page of Gallery files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileList {
    pub total_hits: i64,
    pub page_number: i64,
    pub files: Vec<FileInfo>,
}

/// One page of documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentList {
    pub total_hits: i64,
    pub page_number: i64,
    pub documents: Vec<DocumentInfo>,
}

/// Everything needed to upload one local file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUploadConfig {
    pub file_path: std::path::PathBuf,
    /// Added to the uploaded file. Empty means no caption.
    pub caption: String,
    /// Target Gallery folder; `None` lets the server pick the Api Inbox.
    pub folder_id: Option<i64>,
}

/// Import of a single Word/OpenOffice file as a native document.
#[derive(Debug, Clone, PartialEq)]
pub struct WordImport {
    pub file_path: std::path::PathBuf,
    /// Target workspace folder; `None` means the Home folder.
    pub folder_id: Option<i64>,
}

/// A basic (single text field) document.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub name: String,
    pub tags: String,
    pub content: String,
}

/// Role granted to a newly created user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_PI")]
    Pi,
}

impl UserRole {
    /// `pi` or `ROLE_PI` selects the PI role; anything else is a plain user.
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "pi" | "ROLE_PI" => UserRole::Pi,
            _ => UserRole::User,
        }
    }
}

/// Request body for `POST /sysadmin/users`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPost {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub affiliation: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Pagination and ordering for listing calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordListingConfig {
    pub page_number: u32,
    pub page_size: u32,
    /// One of `name`, `created`, `lastModified`.
    pub order_by: String,
    pub sort_order: SortOrder,
}

impl Default for RecordListingConfig {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: 20,
            order_by: "lastModified".to_string(),
            sort_order: SortOrder::Desc,
        }
    }
}

impl RecordListingConfig {
    /// The `orderBy` query value the API expects, e.g. `lastModified desc`.
    pub fn order_by_param(&self) -> String {
        format!("{} {}", self.order_by, self.sort_order.as_str())
    }
}

/// Trait for talking to a remote ELN.
/// The implementor owns base URL, credentials and transport; callers only see
/// typed requests and responses.
///
/// The trait is implemented by the reqwest client in the CLI crate and by
/// test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ElnClient: Send + Sync {
    /// Server version and status message.
    async fn status(&self) -> Result<Status, ClientError>;

    /// Upload a single local file to the Gallery.
    async fn upload_file(&self, req: FileUploadConfig) -> Result<FileInfo, ClientError>;

    /// Import a Word/OpenOffice file as a new document.
    async fn import_word(&self, req: WordImport) -> Result<DocumentInfo, ClientError>;

    /// Create a basic document whose single field holds `content`.
    async fn new_basic_document_with_content(
        &self,
        req: NewDocument,
    ) -> Result<DocumentInfo, ClientError>;

    /// Create a user account. Requires sysadmin permission.
    async fn create_user(&self, req: UserPost) -> Result<UserInfo, ClientError>;

    /// List Gallery files, optionally restricted to a media type.
    async fn files(
        &self,
        cfg: RecordListingConfig,
        media_type: Option<String>,
    ) -> Result<FileList, ClientError>;

    /// List documents, optionally matching a basic search query.
    async fn documents(
        &self,
        cfg: RecordListingConfig,
        query: Option<String>,
    ) -> Result<DocumentList, ClientError>;
}
