//! Region-of-interest loading and UTM tiling.
//!
//! - [`roi`]: reads a GeoJSON region of interest into a `geo::MultiPolygon`.
//! - [`utm`]: UTM zone/EPSG/latitude-band derivation.
//! - [`tiler`]: splits a region into the fixed-size UTM tile grid the rest of
//!   the pipeline operates on.

pub mod roi;
pub mod tiler;
pub mod utm;

pub use roi::{parse_region_of_interest, read_region_of_interest};
pub use tiler::split_region_in_utm_tiles;
