//! Core value types shared across the pipeline: byte buffers, bounding boxes,
//! tiles, catalog items, extraction tasks, raster patches and constellation
//! band tables.

mod blob;
pub use blob::*;

mod byte_range;
pub use byte_range::*;

mod geo_bbox;
pub use geo_bbox::*;

mod constellation;
pub use constellation::*;

mod tile;
pub use tile::*;

mod catalog;
pub use catalog::*;

mod task;
pub use task::*;

mod patch;
pub use patch::*;
