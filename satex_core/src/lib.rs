//! Shared types and plumbing used across the pipeline: the value types
//! (bounding boxes, tiles, catalog items, extraction tasks, constellation
//! band tables), the error taxonomy, the object-store abstraction, the
//! CRS transform cache, the bounded concurrency helper, and configuration
//! loading.

pub mod cache;
pub mod catalog;
pub use catalog::{Catalog, StacCatalog};
pub mod concurrency;
pub use concurrency::ConcurrencyLimits;
pub mod config;
pub use config::*;
pub mod error;
pub use error::*;
pub mod io;
pub mod types;
pub use types::*;
