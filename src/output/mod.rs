//! Singer-style output protocol
//!
//! Line-oriented SCHEMA / RECORD / STATE messages consumed by the
//! downstream loader.

mod writer;

pub use writer::{Message, SingerWriter};
