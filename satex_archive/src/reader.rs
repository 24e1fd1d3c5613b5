//! Reads an existing archive's timestamps back out, so the Scheduler can
//! skip `(tile, constellation, band)` slots that are already populated.

use crate::layout::timestamps_path;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use satex_core::types::Constellation;
use satex_scheduler::ExtractedTimestamps;
use std::sync::Arc;
use zarrs::array::Array;
use zarrs_filesystem::FilesystemStore;
use zarrs_storage::ReadableWritableListableStorage;

/// A zarr-backed [`ExtractedTimestamps`] source.
pub struct ZarrArchiveReader {
	store: Arc<FilesystemStore>,
}

impl ZarrArchiveReader {
	#[must_use]
	pub fn new(store: Arc<FilesystemStore>) -> Self {
		Self { store }
	}
}

impl ExtractedTimestamps for ZarrArchiveReader {
	fn existing_timestamps(&self, tile_id: &str, constellation: Constellation) -> Result<Vec<DateTime<Utc>>> {
		let storage: ReadableWritableListableStorage = self.store.clone();
		let path = format!("/{}", timestamps_path(tile_id, constellation));
		let array = match Array::open(storage, &path) {
			Ok(array) => array,
			// Not yet prepared: nothing has been extracted for this group.
			Err(_) => return Ok(Vec::new()),
		};
		let epoch_seconds: Vec<i64> = array
			.retrieve_array_subset_elements::<i64>(&array.subset_all())
			.context("reading timestamps")?;
		Ok(epoch_seconds
			.into_iter()
			.map(|s| Utc.timestamp_opt(s, 0).single().unwrap_or_default())
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::preparer::prepare_tile;
	use chrono::TimeZone;

	#[test]
	fn test_reads_back_prepared_timestamps() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 50, &[t1, t2], true).unwrap();

		let reader = ZarrArchiveReader::new(store);
		let found = reader.existing_timestamps("t1", Constellation::Sentinel2).unwrap();
		assert_eq!(found, vec![t1, t2]);
	}

	#[test]
	fn test_unprepared_group_returns_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let reader = ZarrArchiveReader::new(store);
		assert!(reader.existing_timestamps("nope", Constellation::Sentinel2).unwrap().is_empty());
	}
}
