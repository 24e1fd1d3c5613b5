//! Turns a tile grid and a catalog into a list of extraction tasks: groups
//! tiles into coarse clusters, buckets catalog items by revisit interval, and
//! emits one task per `(tile-region, constellation, revisit, band)` whose
//! coverage invariant holds, skipping what the archive already has.

pub mod cluster;
pub mod dates;
pub mod schedule;

pub use cluster::cluster_tiles_in_utm;
pub use dates::get_dates_in_range;
pub use schedule::{ExtractedTimestamps, ScheduleParams, create_tasks_by_splits};
