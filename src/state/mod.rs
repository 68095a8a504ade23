//! Bookmark state management
//!
//! Watermarks that bound incremental re-extraction. FULL_TABLE streams
//! never touch state; incremental streams store one scalar per stream (or
//! per `{account}_{stream}` for report streams).

mod manager;
mod types;

pub use manager::BookmarkManager;
pub use types::State;
