//! # adsync
//!
//! A source connector for an advertising platform, emitting the Singer
//! line protocol on stdout.
//!
//! ## Features
//!
//! - **Discovery**: static catalog of core object and report streams
//! - **Incremental Sync**: bookmark tracking with a conversion-window
//!   lookback for report streams
//! - **Async Reports**: submit, poll, download, and parse zipped CSV
//!   report results
//! - **Resilience**: classified retries with bounded exponential backoff
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         CLI                                │
//! │      discover → Catalog        sync → Singer messages      │
//! └────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────┬───────────┬─────┴─────┬───────────┬────────────┐
//! │  Client  │  Catalog  │  Report   │   State   │   Output   │
//! ├──────────┼───────────┼───────────┼───────────┼────────────┤
//! │ OAuth2   │ Streams   │ Submit    │ Bookmarks │ SCHEMA     │
//! │ Retry    │ Schemas   │ Poll      │ Lookback  │ RECORD     │
//! │ RateLimit│ Selection │ Download  │ Atomic    │ STATE      │
//! └──────────┴───────────┴───────────┴───────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the connector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Connector configuration
pub mod config;

/// Retry executor with error classification
pub mod retry;

/// Record flattening and datetime normalization
pub mod flatten;

/// Stream registry and discovery catalog
pub mod catalog;

/// HTTP client, auth, and rate limiting
pub mod client;

/// Asynchronous report jobs
pub mod report;

/// Bookmark state management
pub mod state;

/// Sync pipeline
pub mod sync;

/// Singer message output
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
