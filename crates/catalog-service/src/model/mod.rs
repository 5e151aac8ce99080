//! Data types exchanged with callers and downstreams.

pub mod catalog;
pub mod product;

pub use catalog::{Catalog, CatalogId};
pub use product::Product;
