pub mod dto;
pub mod poller;
mod services;
pub mod upload;

pub use dto::{BatchJob, JobStatus};
pub use poller::{BatchPoller, JobStatusSource, PollHandle, PollOutcome, PollState};
pub use services::{upload_error_message, validate_csv, BatchApi, BatchService, TEMPLATE_FILE_NAME};
pub use upload::{BatchUpload, UploadPhase};
