//! Segmentation job module
//!
//! This module provides:
//! - `SegmentationApi` trait for the server's job endpoints
//! - `HttpSegmentationClient` implementing it over reqwest
//! - `SegmentationJobPoller`, the start/poll state machine with its `PollTimer`

pub mod client;
pub mod poller;
pub mod types;

pub use client::{HttpSegmentationClient, SEGMENT_PATH, STATUS_PATH, SegmentationApi};
pub use poller::{PollTimer, SegmentationJobPoller};
pub use types::{
    ApiError, DONE_STATUS, JobError, JobEvent, JobIndicator, JobStatus, StartOutcome,
    StatusPayload,
};
