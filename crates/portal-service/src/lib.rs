//! Complaint service for the complaint portal
//!
//! [`ComplaintService`] validates nothing itself: callers validate drafts
//! before calling [`ComplaintService::create`]. Attachment checks are the
//! exception; rejected attachments come back as `Ok(None)`.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod service;
pub mod storage;

pub use service::{ComplaintService, DEFAULT_LIST_LIMIT, RECENT_WINDOW_DAYS};
pub use storage::{AttachmentStorage, FilesystemStorage};
