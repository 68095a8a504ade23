//! Stream catalog
//!
//! The remote type system is fixed for this connector, so discovery reads a
//! static stream registry instead of introspecting the service at runtime.
//! `discover()` turns the registry into the catalog document a downstream
//! loader consumes; the same catalog, annotated with selections, drives a
//! sync run.

mod streams;
mod types;

pub use streams::{column_alias, report_field_type, stream_def, stream_defs, StreamKind};
pub use types::{Catalog, CatalogEntry, StreamDef};

use crate::error::Result;

/// Build the discovery catalog from the static stream registry
pub fn discover() -> Result<Catalog> {
    let streams = stream_defs()
        .iter()
        .map(CatalogEntry::from_def)
        .collect::<Result<Vec<_>>>()?;
    Ok(Catalog { streams })
}
