use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::{info, instrument};

use super::dto::BatchJob;
use super::poller::JobStatusSource;
use crate::error::ApiError;
use crate::http::ApiClient;

pub const TEMPLATE_FILE_NAME: &str = "product_template.csv";

/// Upload side of the batch import, kept behind a trait so the upload widget can
/// be driven without a server.
#[async_trait]
pub trait BatchApi: JobStatusSource {
    async fn upload_csv(&self, file_name: &str, body: Bytes) -> Result<BatchJob, ApiError>;
}

/// Checks a file before it is sent: `.csv` name, at most `max_bytes`.
pub fn validate_csv(file_name: &str, size: u64, max_bytes: u64) -> Result<(), ApiError> {
    if !file_name.to_lowercase().ends_with(".csv") {
        return Err(ApiError::Validation("Please select a CSV file".into()));
    }
    if size > max_bytes {
        let mb = max_bytes / (1024 * 1024);
        return Err(ApiError::Validation(format!("File size must be less than {mb}MB")));
    }
    Ok(())
}

/// Message shown when an upload is rejected.
pub fn upload_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
        ApiError::Validation(message) => message.clone(),
        _ => "Upload failed. Please try again.".into(),
    }
}

/// CSV batch-import endpoints.
#[derive(Clone)]
pub struct BatchService {
    api: ApiClient,
    max_upload_bytes: u64,
}

impl BatchService {
    pub fn new(api: ApiClient, max_upload_bytes: u64) -> Self {
        Self {
            api,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Uploads CSV bytes as the multipart field `file`.
    #[instrument(skip(self, body), fields(size = body.len()))]
    pub async fn upload(&self, file_name: &str, body: Bytes) -> Result<BatchJob, ApiError> {
        validate_csv(file_name, body.len() as u64, self.max_upload_bytes)?;
        let part = Part::bytes(body.to_vec())
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);
        let job: BatchJob = self
            .api
            .send_multipart(Method::POST, "/api/products/batch/upload", form)
            .await?;
        info!(job_id = job.job_execution_id, status = %job.status, "batch upload accepted");
        Ok(job)
    }

    pub async fn upload_path(&self, path: &Path) -> Result<BatchJob, ApiError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| ApiError::Validation(format!("cannot read {}: {e}", path.display())))?;
        validate_csv(&file_name, meta.len(), self.max_upload_bytes)?;
        let body = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Validation(format!("cannot read {}: {e}", path.display())))?;
        self.upload(&file_name, body.into()).await
    }

    pub async fn status(&self, job_id: i64) -> Result<BatchJob, ApiError> {
        self.api
            .get_json(&format!("/api/products/batch/status/{job_id}"))
            .await
    }

    /// Raw bytes of the sample CSV.
    pub async fn template(&self) -> Result<Bytes, ApiError> {
        self.api.get_bytes("/api/products/batch/template").await
    }
}

#[async_trait]
impl JobStatusSource for BatchService {
    async fn job_status(&self, job_id: i64) -> Result<BatchJob, ApiError> {
        self.status(job_id).await
    }
}

#[async_trait]
impl BatchApi for BatchService {
    async fn upload_csv(&self, file_name: &str, body: Bytes) -> Result<BatchJob, ApiError> {
        self.upload(file_name, body).await
    }
}
