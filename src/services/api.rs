use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::errors::{ApiError, ApiResult};
use crate::models::{FileRecord, FilterState, UploadOutcome};
use crate::services::download::save_bytes;

/// Thin wrapper over the file storage REST API.
///
/// Holds nothing but the connection pool and cookie jar; every call maps to
/// exactly one HTTP request with no retry and no timeout.
#[derive(Debug, Clone)]
pub struct FileApiClient {
    client: Client,
    base_url: String,
}

impl FileApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str()).cookie_store(true);

        if config.accept_invalid_certs {
            warn!("API client configured to accept invalid certificates (FILEVAULT_ACCEPT_INVALID_CERTS=true)");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Listing URL; the query is omitted entirely when no filter is set
    pub fn files_url(&self, filters: &FilterState) -> String {
        let query = filters.query_string();
        if query.is_empty() {
            format!("{}/files/", self.base_url)
        } else {
            format!("{}/files/?{}", self.base_url, query)
        }
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/files/{}/", self.base_url, urlencoding::encode(id))
    }

    fn download_url(&self, id: &str) -> String {
        format!("{}/files/{}/download/", self.base_url, urlencoding::encode(id))
    }

    /// Turn any non-2xx response into `ApiError::Status`, logging the body
    async fn check_status(response: Response, url: &str) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("API request failed - URL: {}, Status: {}, Body: {}", url, status, body);
        Err(ApiError::Status { status, body })
    }

    pub async fn list_files(&self, filters: &FilterState) -> ApiResult<Vec<FileRecord>> {
        let url = self.files_url(filters);
        debug!("Fetching file list: {}", url);

        let response = self.client.get(&url).header(ACCEPT, "application/json").send().await?;
        let response = Self::check_status(response, &url).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(format!("file list is not JSON: {}", e)))?;

        parse_listing(body)
    }

    /// Upload a file from disk as the multipart field `file`
    pub async fn upload_file(&self, path: &Path) -> ApiResult<UploadOutcome> {
        let content = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        self.upload_bytes(&filename, content, mime.essence_str()).await
    }

    pub async fn upload_bytes(&self, filename: &str, content: Vec<u8>, mime: &str) -> ApiResult<UploadOutcome> {
        let url = format!("{}/files/", self.base_url);
        let size = content.len();
        debug!("Uploading {} ({} bytes, {}) to {}", filename, size, mime, url);

        let part = Part::bytes(content).file_name(filename.to_string()).mime_str(mime)?;
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::check_status(response, &url).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(format!("upload response is not JSON: {}", e)))?;

        let outcome = UploadOutcome::from_json(body)?;
        match &outcome {
            UploadOutcome::Created(record) => info!("Uploaded {} as {}", filename, record.id),
            UploadOutcome::Duplicate { record, storage_saved } => info!(
                "Server already stores {} as {} ({} bytes saved)",
                filename, record.id, storage_saved
            ),
        }
        Ok(outcome)
    }

    pub async fn delete_file(&self, id: &str) -> ApiResult<()> {
        let url = self.file_url(id);
        debug!("Deleting file: {}", url);

        let response = self.client.delete(&url).send().await?;
        Self::check_status(response, &url).await?;

        info!("Deleted file {}", id);
        Ok(())
    }

    /// Raw content of a stored file
    pub async fn download_file(&self, id: &str) -> ApiResult<Vec<u8>> {
        let url = self.download_url(id);
        self.fetch_bytes(&url).await
    }

    /// Download a listed file into `dest_dir` under its original filename
    pub async fn download_record(&self, record: &FileRecord, dest_dir: &Path) -> ApiResult<PathBuf> {
        let content = self.download_file(&record.id).await?;
        save_bytes(dest_dir, &record.original_filename, &content)
    }

    /// Fetch arbitrary binary content and save it locally as `filename`.
    ///
    /// Relative URLs are resolved against the API base URL.
    pub async fn download_blob(&self, url: &str, filename: &str, dest_dir: &Path) -> ApiResult<PathBuf> {
        let url = self.resolve_url(url)?;
        let content = self.fetch_bytes(url.as_str()).await?;
        save_bytes(dest_dir, filename, &content)
    }

    fn resolve_url(&self, url: &str) -> ApiResult<Url> {
        // Joining leaves absolute URLs untouched
        let base = Url::parse(&format!("{}/", self.base_url))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        base.join(url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))
    }

    async fn fetch_bytes(&self, url: &str) -> ApiResult<Vec<u8>> {
        debug!("Downloading {}", url);

        let response = self.client.get(url).header(ACCEPT, "*/*").send().await?;
        let response = Self::check_status(response, url).await?;

        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode a listing body; anything other than a JSON array counts as no files
pub fn parse_listing(body: Value) -> ApiResult<Vec<FileRecord>> {
    match body {
        Value::Array(items) => serde_json::from_value(Value::Array(items))
            .map_err(|e| ApiError::MalformedResponse(format!("file list entry: {}", e))),
        other => {
            warn!("File list response is not an array ({}), showing no files", json_kind(&other));
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> FileApiClient {
        FileApiClient::new(&ApiConfig::for_base_url("http://localhost:8000/api/"))
    }

    #[test]
    fn listing_url_without_filters_has_no_query() {
        assert_eq!(client().files_url(&FilterState::default()), "http://localhost:8000/api/files/");
    }

    #[test]
    fn listing_url_carries_filters() {
        let filters = FilterState { search: Some("cat".into()), date_range: Some(30), ..Default::default() };
        assert_eq!(client().files_url(&filters), "http://localhost:8000/api/files/?search=cat&date_range=30");
    }

    #[test]
    fn item_urls() {
        let api = client();
        assert_eq!(api.file_url("abc"), "http://localhost:8000/api/files/abc/");
        assert_eq!(api.download_url("abc"), "http://localhost:8000/api/files/abc/download/");
    }

    #[test]
    fn relative_locators_resolve_against_the_base() {
        let api = client();
        assert_eq!(
            api.resolve_url("media/a.txt").unwrap().as_str(),
            "http://localhost:8000/api/media/a.txt"
        );
        assert_eq!(api.resolve_url("/media/a.txt").unwrap().as_str(), "http://localhost:8000/media/a.txt");
        assert_eq!(api.resolve_url("https://cdn.example.com/x").unwrap().as_str(), "https://cdn.example.com/x");
    }

    #[test]
    fn non_array_listing_is_empty() {
        assert!(parse_listing(json!({"results": []})).unwrap().is_empty());
        assert!(parse_listing(json!(null)).unwrap().is_empty());
        assert!(parse_listing(json!("nope")).unwrap().is_empty());
    }

    #[test]
    fn broken_listing_entries_are_an_error() {
        let err = parse_listing(json!([{"id": "1"}])).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }
}
