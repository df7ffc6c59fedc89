//! Feedback storage module.
//!
//! Stores analyzed posts as JSON keyed by hashtag, plus an access log.

mod access_log;
mod store;

pub use access_log::{AccessEvent, AccessLog};
pub use store::{FeedbackStore, StoredFeedback};
