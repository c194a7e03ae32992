use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::dto::{BatchJob, JobStatus};
use super::poller::{BatchPoller, PollHandle, PollState};
use super::services::{upload_error_message, validate_csv, BatchApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Uploading,
    Polling,
    Completed,
    Failed,
    Stopped,
}

#[derive(Debug, Clone)]
struct SelectedFile {
    name: String,
    body: Bytes,
}

/// State behind the batch-import screen: file selection, the upload call and
/// the status poll that follows it.
pub struct BatchUpload<S: BatchApi> {
    api: Arc<S>,
    poller: BatchPoller<S>,
    max_upload_bytes: u64,
    file: Option<SelectedFile>,
    uploading: bool,
    error: Option<String>,
    last_job: Option<BatchJob>,
    poll: Option<PollHandle>,
}

impl<S: BatchApi> BatchUpload<S> {
    pub fn new(api: Arc<S>, poll_interval: Duration, max_upload_bytes: u64) -> Self {
        let poller = BatchPoller::new(Arc::clone(&api), poll_interval);
        Self {
            api,
            poller,
            max_upload_bytes,
            file: None,
            uploading: false,
            error: None,
            last_job: None,
            poll: None,
        }
    }

    /// Picks the file to upload. An invalid file is rejected and leaves no
    /// selection behind.
    pub fn select_file(&mut self, name: impl Into<String>, body: Bytes) -> bool {
        let name = name.into();
        self.error = None;
        match validate_csv(&name, body.len() as u64, self.max_upload_bytes) {
            Ok(()) => {
                self.file = Some(SelectedFile { name, body });
                true
            }
            Err(e) => {
                self.file = None;
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub fn selected_file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Latest job record: polled state if a poll exists, else the last one seen.
    pub fn status(&self) -> Option<BatchJob> {
        match &self.poll {
            Some(handle) => handle.state().job,
            None => self.last_job.clone(),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading || self.poll.as_ref().is_some_and(PollHandle::is_polling)
    }

    pub fn phase(&self) -> UploadPhase {
        if self.uploading {
            return UploadPhase::Uploading;
        }
        let Some(handle) = &self.poll else {
            return UploadPhase::Idle;
        };
        let PollState { job, polling } = handle.state();
        if polling {
            return UploadPhase::Polling;
        }
        match job.map(|j| j.status) {
            Some(JobStatus::Completed) => UploadPhase::Completed,
            Some(JobStatus::Failed) => UploadPhase::Failed,
            Some(JobStatus::Stopped) => UploadPhase::Stopped,
            _ => UploadPhase::Idle,
        }
    }

    /// Sends the selected file and starts polling its job.
    #[instrument(skip(self))]
    pub async fn upload(&mut self) {
        let Some(file) = self.file.clone() else {
            self.error = Some("Please select a file".into());
            return;
        };
        self.cancel_poll();
        self.error = None;
        self.last_job = None;
        self.uploading = true;

        let result = self.api.upload_csv(&file.name, file.body).await;
        self.uploading = false;
        match result {
            Ok(job) => {
                info!(job_id = job.job_execution_id, "upload accepted; polling");
                let job_id = job.job_execution_id;
                self.last_job = Some(job.clone());
                self.poll = Some(self.poller.spawn(job_id, Some(job)));
            }
            Err(e) => {
                warn!(error = %e, "batch upload failed");
                self.error = Some(upload_error_message(&e));
            }
        }
    }

    /// Waits until the current poll (if any) stops.
    pub async fn wait(&self) -> Option<PollState> {
        match &self.poll {
            Some(handle) => Some(handle.settled().await),
            None => None,
        }
    }

    pub fn subscribe(&self) -> Option<tokio::sync::watch::Receiver<PollState>> {
        self.poll.as_ref().map(PollHandle::subscribe)
    }

    /// Back to a blank form; a running poll is cancelled.
    pub fn reset(&mut self) {
        self.cancel_poll();
        self.file = None;
        self.error = None;
        self.last_job = None;
        self.uploading = false;
    }

    fn cancel_poll(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.cancel();
            if let Some(job) = handle.state().job {
                self.last_job = Some(job);
            }
        }
    }
}
