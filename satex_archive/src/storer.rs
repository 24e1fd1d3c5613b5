//! Writes one extracted patch into its `(timestamp, band)` slot of an
//! already-[`crate::preparer::prepare_tile`]d archive group.
//!
//! Grounded in `store_patches`: look up the band and timestamp indices,
//! resample to the archive's native resolution if the patch arrived at a
//! coarser or finer GSD, zero-pad a short patch up to the tile's pixel grid,
//! then write into the `data` array subset at `[t, b, :, :]`.

use crate::layout::{data_path, timestamps_path};
use crate::resample::{resample_bicubic, zero_pad};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use satex_core::error::SatexError;
use satex_core::types::{Constellation, Patch};
use std::sync::Arc;
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;
use zarrs_storage::ReadableWritableListableStorage;

/// Stores `patch` (at `patch_gsd` meters/pixel) into the tile-constellation
/// group's `(sensing_time, band)` slot.
///
/// # Errors
/// Returns [`SatexError::ArchiveInconsistency`] if `sensing_time` has no
/// matching entry in the group's `timestamps` array, or
/// [`SatexError::InvalidArgument`] if `band` is not one of the
/// constellation's bands.
pub fn store_patch(
	store: &Arc<FilesystemStore>,
	tile_id: &str,
	constellation: Constellation,
	band: &str,
	sensing_time: DateTime<Utc>,
	patch_gsd: f64,
	patch: &Patch,
) -> Result<()> {
	let storage: ReadableWritableListableStorage = store.clone();

	let band_index = constellation
		.bands()
		.iter()
		.position(|b| b.name == band)
		.ok_or_else(|| SatexError::InvalidArgument(format!("band '{band}' is not valid for {constellation}")))?;

	let timestamps = Array::open(storage.clone(), &format!("/{}", timestamps_path(tile_id, constellation)))
		.context("opening timestamps array")?;
	let existing: Vec<i64> = timestamps
		.retrieve_array_subset_elements::<i64>(&timestamps.subset_all())
		.context("reading timestamps")?;
	let target = sensing_time.timestamp();
	let time_index = existing
		.iter()
		.position(|&t| t == target)
		.ok_or_else(|| SatexError::ArchiveInconsistency(format!("no timestamp slot for {sensing_time} in {tile_id}/{constellation}")))?;

	let data = Array::open(storage, &format!("/{}", data_path(tile_id, constellation))).context("opening data array")?;
	let shape = data.shape();
	let side_pixels = shape[2];
	if side_pixels > u32::MAX as u64 {
		bail!("archive side length {side_pixels} overflows u32");
	}
	let side_pixels = side_pixels as u32;

	let archive_gsd = constellation
		.bands()
		.iter()
		.map(|b| b.gsd)
		.fold(f64::INFINITY, f64::min);
	let target_pixels = ((patch.width as f64) * patch_gsd / archive_gsd).round().max(1.0) as u32;
	let resampled = if target_pixels == patch.width && (patch_gsd - archive_gsd).abs() < f64::EPSILON {
		patch.clone()
	} else {
		resample_bicubic(patch, target_pixels, target_pixels)
	};
	let padded = zero_pad(&resampled, side_pixels, side_pixels);

	let subset = ArraySubset::new_with_start_shape(
		vec![time_index as u64, band_index as u64, 0, 0],
		vec![1, 1, u64::from(side_pixels), u64::from(side_pixels)],
	)
	.context("building write subset")?;
	data.store_array_subset_elements::<u16>(&subset, &padded.data)
		.context("writing patch")?;

	log::debug!("stored patch for {tile_id}/{constellation}/{band} at t={time_index}");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::preparer::prepare_tile;
	use chrono::TimeZone;

	fn setup() -> (tempfile::TempDir, Arc<FilesystemStore>, DateTime<Utc>) {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 50, &[t1, t2], true).unwrap();
		(dir, store, t1)
	}

	#[test]
	fn test_store_patch_unknown_band_errors() {
		let (_dir, store, t1) = setup();
		let patch = Patch::zeroed(100, 100);
		let err = store_patch(&store, "t1", Constellation::Sentinel2, "NOPE", t1, 10.0, &patch).unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "InvalidArgument");
	}

	#[test]
	fn test_store_patch_unknown_timestamp_errors() {
		let (_dir, store, _t1) = setup();
		let other = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
		let patch = Patch::zeroed(100, 100);
		let err = store_patch(&store, "t1", Constellation::Sentinel2, "B02", other, 10.0, &patch).unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "ArchiveInconsistency");
	}

	#[test]
	fn test_store_patch_writes_matching_resolution() {
		let (_dir, store, t1) = setup();
		let patch = Patch::new(100, 100, vec![42u16; 100 * 100]).unwrap();
		store_patch(&store, "t1", Constellation::Sentinel2, "B02", t1, 10.0, &patch).unwrap();
	}

	#[test]
	fn test_store_patch_resamples_coarser_band() {
		let (_dir, store, t1) = setup();
		// B01 has a 60m gsd against the group's 10m grid; patch arrives at
		// native B01 resolution and must be upsampled before writing.
		let patch = Patch::new(17, 17, vec![7u16; 17 * 17]).unwrap();
		store_patch(&store, "t1", Constellation::Sentinel2, "B01", t1, 60.0, &patch).unwrap();
	}
}
