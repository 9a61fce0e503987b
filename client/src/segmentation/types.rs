//! Segmentation job types and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status value the server reports once the job has finished
pub const DONE_STATUS: &str = "Done";

/// Errors returned by the segmentation HTTP API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Invalid status payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised by the job poller
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Segmentation job failed to start: {0}")]
    JobStartFailed(String),

    #[error("Segmentation status poll failed: {0}")]
    PollFailed(String),
}

/// Lifecycle of the segmentation job as seen by this client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JobStatus {
    #[default]
    Idle,
    /// The begin-job request is in flight
    Starting,
    /// The job runs on the server; progress is 0..=100
    Polling { progress: u8 },
    Done,
    Failed { message: Option<String> },
}

impl JobStatus {
    /// A job is starting or being polled
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Starting | JobStatus::Polling { .. })
    }

    /// A new job may be started from this state
    pub fn accepts_start(&self) -> bool {
        matches!(self, JobStatus::Idle | JobStatus::Failed { .. })
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            JobStatus::Polling { progress } => Some(*progress),
            JobStatus::Done => Some(100),
            _ => None,
        }
    }
}

/// Body of `GET /check_segment_status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPayload {
    pub status: String,
    #[serde(default)]
    pub progress: f64,
}

impl StatusPayload {
    pub fn new(status: impl Into<String>, progress: f64) -> Self {
        Self {
            status: status.into(),
            progress,
        }
    }

    /// Only the exact literal `"Done"` signals completion
    pub fn is_done(&self) -> bool {
        self.status == DONE_STATUS
    }

    /// Progress rounded and clamped to a whole percentage
    pub fn percent(&self) -> u8 {
        if self.progress.is_nan() {
            return 0;
        }
        self.progress.round().clamp(0.0, 100.0) as u8
    }
}

/// Result of asking the poller to start a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The job was submitted and polling began
    Started,
    /// A job is already running or finished; nothing was sent
    Ignored,
}

/// What a single poll produced
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// The job is still running
    Progress { progress: u8, status: String },
    /// The server reported completion; the timer has been cancelled
    Completed,
    /// The poll failed and will be retried on the next tick
    PollFailed { consecutive_failures: u32 },
    /// The poller gave up; the timer has been cancelled
    Failed { message: String },
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Completed | JobEvent::Failed { .. })
    }
}

/// Trigger button plus status and progress elements
pub trait JobIndicator {
    fn set_trigger_enabled(&mut self, enabled: bool);
    fn set_status_text(&mut self, text: &str);
    fn set_progress_text(&mut self, text: &str);
    /// Width of the progress bar as a percentage
    fn set_progress_bar(&mut self, percent: u8);
}
