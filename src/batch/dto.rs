use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Spring Batch execution status. Unrecognised values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Starting,
    Started,
    Stopping,
    Stopped,
    Completed,
    Failed,
    Abandoned,
    Unknown,
    Other(String),
}

impl JobStatus {
    /// Only these three end the polling loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Stopped)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Starting => "STARTING",
            JobStatus::Started => "STARTED",
            JobStatus::Stopping => "STOPPING",
            JobStatus::Stopped => "STOPPED",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Abandoned => "ABANDONED",
            JobStatus::Unknown => "UNKNOWN",
            JobStatus::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "STARTING" => JobStatus::Starting,
            "STARTED" => JobStatus::Started,
            "STOPPING" => JobStatus::Stopping,
            "STOPPED" => JobStatus::Stopped,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "ABANDONED" => JobStatus::Abandoned,
            "UNKNOWN" => JobStatus::Unknown,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record of one CSV import execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub job_execution_id: i64,
    pub status: JobStatus,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub total_records: Option<i64>,
    #[serde(default)]
    pub success_count: Option<i64>,
    #[serde(default)]
    pub failure_count: Option<i64>,
    #[serde(default)]
    pub skip_count: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "row_errors")]
    pub errors: Vec<String>,
}

/// Accepts `null` for the list and for individual entries; nulls are dropped.
fn row_errors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(raw.into_iter().flatten().flatten().collect())
}

impl BatchJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
