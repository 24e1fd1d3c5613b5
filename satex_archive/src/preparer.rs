//! Creates the on-disk zarr structure for a tile-constellation pair before
//! any patches are stored into it, and safely resizes it across runs.
//!
//! Grounded in `create_zarr_patch_structure`: a `data` array shaped
//! `(len(sensing_times), len(bands), H, W)` chunked `(1, 1, chunk, chunk)`,
//! and a `timestamps` array holding the sorted, deduplicated sensing times.
//! `H`/`W` are `patch_size / min(band gsd)`, so every band shares the grid of
//! the constellation's finest-resolution band.
//!
//! When `overwrite` is false and a group already exists, the new sensing
//! times are merged with the existing ones rather than replacing them: the
//! `data` (and any `mask/<name>`) array is resized along its time axis to
//! the union's length before `timestamps` is rewritten, so a crash between
//! the two leaves `timestamps` describing a slot `data` doesn't have yet
//! (caught on the next prepare) rather than the reverse (silently missing a
//! slot `timestamps` claims exists).
//!
//! Timestamps are stored as Unix-epoch seconds (`i64`) rather than the
//! original's fixed-length ISO-8601 string array (`dtype="<U27"`) — zarr's
//! string data type is a newer, less universally-supported extension than a
//! plain integer array, and epoch seconds round-trip through every zarr
//! implementation without it.

use crate::layout::{data_path, group_path, mask_path, timestamps_path};
use anyhow::{Context, Result, ensure};
use chrono::{DateTime, TimeZone, Utc};
use satex_core::error::SatexError;
use satex_core::types::Constellation;
use std::sync::Arc;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs_filesystem::FilesystemStore;
use zarrs_storage::{ListableStorageTraits, ReadableWritableListableStorage, StorePrefix};

/// Prepares (or re-prepares, resizing in place) a tile-constellation group
/// to hold the union of its existing and new sensing times.
///
/// When `overwrite` is true, or the group doesn't exist yet, `data` and
/// `timestamps` are (re)built fresh from `sensing_times` alone. Otherwise the
/// existing `timestamps` are read back, merged with `sensing_times`, and
/// `data`/`mask/*` are resized to fit the merged set before `timestamps` is
/// rewritten.
///
/// # Errors
/// Returns [`SatexError::InvalidArgument`] if `sensing_times` is empty,
/// unsorted, or contains duplicates.
pub fn prepare_tile(
	store: &Arc<FilesystemStore>,
	tile_id: &str,
	constellation: Constellation,
	patch_size: f64,
	chunk_size: u64,
	sensing_times: &[DateTime<Utc>],
	overwrite: bool,
) -> Result<()> {
	ensure!(!sensing_times.is_empty(), SatexError::InvalidArgument("sensing_times must not be empty".into()));
	ensure!(sensing_times.windows(2).all(|w| w[0] < w[1]), SatexError::InvalidArgument("sensing_times must be sorted and unique".into()));

	let bands = constellation.bands();
	let min_gsd = bands.iter().map(|b| b.gsd).fold(f64::INFINITY, f64::min);
	let side_pixels = (patch_size / min_gsd).round() as u64;

	let storage: ReadableWritableListableStorage = store.clone();
	let data_path_str = format!("/{}", data_path(tile_id, constellation));
	let timestamps_path_str = format!("/{}", timestamps_path(tile_id, constellation));

	let existing_timestamps = if overwrite { None } else { read_existing_timestamps(&storage, &timestamps_path_str)? };

	let union: Vec<DateTime<Utc>> = match &existing_timestamps {
		None => sensing_times.to_vec(),
		Some(existing) => {
			if let Some(&max_existing) = existing.iter().max() {
				if sensing_times.iter().any(|t| *t < max_existing) {
					log::warn!("{tile_id}/{constellation}: new sensing times predate existing ones, merging anyway");
				}
			}
			let mut merged: Vec<DateTime<Utc>> = existing.iter().chain(sensing_times).copied().collect();
			merged.sort_unstable();
			merged.dedup();
			merged
		}
	};

	match &existing_timestamps {
		Some(_) => resize_group(&storage, tile_id, constellation, union.len() as u64).context("resizing existing archive group")?,
		None => {
			let data = ArrayBuilder::new(
				vec![union.len() as u64, bands.len() as u64, side_pixels, side_pixels],
				DataType::UInt16,
				vec![1, 1, chunk_size, chunk_size].try_into().context("building chunk grid")?,
				FillValue::from(0u16),
			)
			.build(storage.clone(), &data_path_str)
			.context("building data array")?;
			data.store_metadata().context("storing data array metadata")?;
		}
	}

	let epoch_seconds: Vec<i64> = union.iter().map(DateTime::timestamp).collect();
	let mut timestamps = match &existing_timestamps {
		Some(_) => {
			let mut array = Array::open(storage.clone(), &timestamps_path_str).context("reopening timestamps array")?;
			array.set_shape(vec![union.len() as u64]);
			array.store_metadata().context("storing resized timestamps array metadata")?;
			array
		}
		None => {
			let array = ArrayBuilder::new(
				vec![union.len() as u64],
				DataType::Int64,
				vec![union.len() as u64].try_into().context("building chunk grid")?,
				FillValue::from(0i64),
			)
			.build(storage, &timestamps_path_str)
			.context("building timestamps array")?;
			array.store_metadata().context("storing timestamps array metadata")?;
			array
		}
	};
	timestamps
		.store_array_subset_elements::<i64>(&timestamps.subset_all(), &epoch_seconds)
		.context("writing timestamps")?;

	log::info!("prepared {tile_id}/{constellation}: {}x{} px, {} timestamps", side_pixels, side_pixels, union.len());
	Ok(())
}

/// Reads a group's existing `timestamps` array, or `None` if it hasn't been
/// prepared yet (the fresh-create path should run instead of a resize).
fn read_existing_timestamps(storage: &ReadableWritableListableStorage, timestamps_path_str: &str) -> Result<Option<Vec<DateTime<Utc>>>> {
	let array = match Array::open(storage.clone(), timestamps_path_str) {
		Ok(array) => array,
		Err(_) => return Ok(None),
	};
	let epoch_seconds: Vec<i64> = array.retrieve_array_subset_elements::<i64>(&array.subset_all()).context("reading existing timestamps")?;
	Ok(Some(epoch_seconds.into_iter().map(|s| Utc.timestamp_opt(s, 0).single().unwrap_or_default()).collect()))
}

/// Resizes `data`'s time axis (axis 0) to `new_len`, then resizes every
/// existing `mask/<name>` array in lockstep, leaving the other axes alone.
fn resize_group(storage: &ReadableWritableListableStorage, tile_id: &str, constellation: Constellation, new_len: u64) -> Result<()> {
	let data_path_str = format!("/{}", data_path(tile_id, constellation));
	let mut data = Array::open(storage.clone(), &data_path_str).context("reopening data array")?;
	let mut shape = data.shape().to_vec();
	shape[0] = new_len;
	data.set_shape(shape);
	data.store_metadata().context("storing resized data array metadata")?;

	for name in existing_mask_names(storage, tile_id, constellation) {
		let path = format!("/{}", mask_path(tile_id, constellation, &name));
		let mut mask = Array::open(storage.clone(), &path).with_context(|| format!("reopening mask array {name}"))?;
		let mut shape = mask.shape().to_vec();
		shape[0] = new_len;
		mask.set_shape(shape);
		mask.store_metadata().with_context(|| format!("storing resized mask array metadata {name}"))?;
	}
	Ok(())
}

/// Names of the `mask/<name>` arrays currently present under a group, by
/// listing the store directly — masks are created lazily by the Storer, so
/// none may exist yet.
fn existing_mask_names(storage: &ReadableWritableListableStorage, tile_id: &str, constellation: Constellation) -> Vec<String> {
	let prefix_str = format!("{}/mask/", group_path(tile_id, constellation));
	let Ok(prefix) = StorePrefix::new(prefix_str) else {
		return Vec::new();
	};
	let Ok(listing) = storage.list_dir(&prefix) else {
		return Vec::new();
	};
	listing
		.prefixes()
		.iter()
		.filter_map(|p| p.as_str().trim_end_matches('/').rsplit('/').next().map(str::to_string))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn test_rejects_empty_timestamps() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let err = prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[], true).unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "InvalidArgument");
	}

	#[test]
	fn test_rejects_unsorted_timestamps() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let err = prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t1, t2], true).unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "InvalidArgument");
	}

	#[test]
	fn test_prepares_group() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t1, t2], true).unwrap();
		assert!(dir.path().join("t1/sentinel-2/data/zarr.json").exists() || dir.path().join("t1/sentinel-2/data/.zarray").exists());
	}

	#[test]
	fn test_overwrite_true_replaces_rather_than_merges() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
		let t3 = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t1, t2], true).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t3], true).unwrap();

		let storage: ReadableWritableListableStorage = store.clone();
		let timestamps = read_existing_timestamps(&storage, "/t1/sentinel-2/timestamps").unwrap().unwrap();
		assert_eq!(timestamps, vec![t3]);
	}

	#[test]
	fn test_non_overwrite_merges_and_resizes() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
		let t3 = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t1, t2], true).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t3], false).unwrap();

		let storage: ReadableWritableListableStorage = store.clone();
		let timestamps = read_existing_timestamps(&storage, "/t1/sentinel-2/timestamps").unwrap().unwrap();
		assert_eq!(timestamps, vec![t1, t2, t3]);

		let data = Array::open(storage, "/t1/sentinel-2/data").unwrap();
		assert_eq!(data.shape()[0], 3);
	}

	#[test]
	fn test_non_overwrite_without_existing_group_creates_fresh() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t1], false).unwrap();

		let storage: ReadableWritableListableStorage = store.clone();
		let timestamps = read_existing_timestamps(&storage, "/t1/sentinel-2/timestamps").unwrap().unwrap();
		assert_eq!(timestamps, vec![t1]);
	}

	#[test]
	fn test_non_overwrite_resizes_existing_mask_in_lockstep() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
		let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t1], true).unwrap();

		let storage: ReadableWritableListableStorage = store.clone();
		zarrs::array::ArrayBuilder::new(vec![1, 64, 64], DataType::UInt8, vec![1, 64, 64].try_into().unwrap(), FillValue::from(0u8))
			.build(storage.clone(), "/t1/sentinel-2/mask/cloud")
			.unwrap()
			.store_metadata()
			.unwrap();

		prepare_tile(&store, "t1", Constellation::Sentinel2, 1000.0, 128, &[t2], false).unwrap();

		let mask = Array::open(storage, "/t1/sentinel-2/mask/cloud").unwrap();
		assert_eq!(mask.shape()[0], 2);
	}
}
