//! Singer catalog
//!
//! Discovery builds a catalog from the bundled stream schemas; sync mode
//! reads a (possibly user-edited) catalog to decide which streams and
//! fields to extract.

mod discover;
mod types;

pub use discover::{create_metadata, discover};
pub use types::{Catalog, CatalogEntry, FieldMetadata, MetadataEntry};

#[cfg(test)]
mod tests;
