#![doc = "HTTP implementation of the core `ElnClient` trait, talking to the RSpace REST API."]
//
//! # RSpace web client
//!
//! [`RsWebClient`] wires the [`ElnClient`] trait from `rspace-core` to a real
//! RSpace server using `reqwest`. Every request carries the `apiKey` header;
//! non-2xx responses become errors carrying the status and response body.
//!
//! - Construct it from a [`ClientConfig`] (see [`crate::load_config`]).
//! - File upload and Word import are multipart posts; everything else is JSON.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;

use rspace_core::contract::{
    ClientError, DocumentInfo, DocumentList, ElnClient, FileInfo, FileList, FileUploadConfig,
    NewDocument, RecordListingConfig, Status, UserInfo, UserPost, WordImport,
};

use crate::load_config::ClientConfig;

const API_KEY_HEADER: &str = "apiKey";

pub struct RsWebClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RsWebClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(concat!("rspace-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        tracing::info!(
            base_url = %config.base_url,
            api_key_set = !config.api_key.is_empty(),
            "Initialized RsWebClient"
        );
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path)).header(API_KEY_HEADER, &self.api_key)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path)).header(API_KEY_HEADER, &self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let res = req.send().await?;
        let res = check_status(res).await?;
        Ok(res.json::<T>().await?)
    }
}

async fn check_status(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let url = res.url().to_string();
    let body = res.text().await.unwrap_or_default();
    tracing::error!(%status, %url, body = %body, "RSpace API returned an error");
    Err(format!("{status} from {url}: {body}").into())
}

async fn file_part(path: &Path) -> Result<Part, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}

fn listing_query(cfg: &RecordListingConfig) -> Vec<(&'static str, String)> {
    vec![
        ("pageNumber", cfg.page_number.to_string()),
        ("pageSize", cfg.page_size.to_string()),
        ("orderBy", cfg.order_by_param()),
    ]
}

#[async_trait]
impl ElnClient for RsWebClient {
    async fn status(&self) -> Result<Status, ClientError> {
        tracing::info!("Fetching server status");
        self.send(self.get("/status")).await
    }

    async fn upload_file(&self, req: FileUploadConfig) -> Result<FileInfo, ClientError> {
        tracing::info!(
            path = %req.file_path.display(),
            folder_id = ?req.folder_id,
            "Uploading file"
        );
        let mut form = Form::new().part("file", file_part(&req.file_path).await?);
        if !req.caption.is_empty() {
            form = form.text("caption", req.caption);
        }
        if let Some(folder_id) = req.folder_id {
            form = form.text("folderId", folder_id.to_string());
        }
        let created: FileInfo = self.send(self.post("/files").multipart(form)).await?;
        tracing::info!(id = created.id, global_id = %created.global_id, "Uploaded file");
        Ok(created)
    }

    async fn import_word(&self, req: WordImport) -> Result<DocumentInfo, ClientError> {
        tracing::info!(
            path = %req.file_path.display(),
            folder_id = ?req.folder_id,
            "Importing Word file"
        );
        let mut form = Form::new().part("file", file_part(&req.file_path).await?);
        if let Some(folder_id) = req.folder_id {
            form = form.text("folderId", folder_id.to_string());
        }
        let doc: DocumentInfo = self.send(self.post("/import/word").multipart(form)).await?;
        tracing::info!(id = doc.id, global_id = %doc.global_id, "Imported Word file");
        Ok(doc)
    }

    async fn new_basic_document_with_content(
        &self,
        req: NewDocument,
    ) -> Result<DocumentInfo, ClientError> {
        tracing::info!(name = %req.name, "Creating basic document");
        let body = json!({
            "name": req.name,
            "tags": req.tags,
            "fields": [{ "content": req.content }],
        });
        self.send(self.post("/documents").json(&body)).await
    }

    async fn create_user(&self, req: UserPost) -> Result<UserInfo, ClientError> {
        tracing::info!(username = %req.username, role = ?req.role, "Creating user");
        self.send(self.post("/sysadmin/users").json(&req)).await
    }

    async fn files(
        &self,
        cfg: RecordListingConfig,
        media_type: Option<String>,
    ) -> Result<FileList, ClientError> {
        let mut query = listing_query(&cfg);
        if let Some(media_type) = media_type {
            query.push(("mediaType", media_type));
        }
        tracing::info!(?query, "Listing files");
        self.send(self.get("/files").query(&query)).await
    }

    async fn documents(
        &self,
        cfg: RecordListingConfig,
        query: Option<String>,
    ) -> Result<DocumentList, ClientError> {
        let mut params = listing_query(&cfg);
        if let Some(query) = query {
            params.push(("query", query));
        }
        tracing::info!(?params, "Listing documents");
        self.send(self.get("/documents").query(&params)).await
    }
}
