//! Runs one dispatched task end to end: extract, then store every
//! resulting tile patch into the archive.

use anyhow::{Context, Result};
use satex_archive::store_patch;
use satex_core::cache::TransformCache;
use satex_core::types::DispatchEnvelope;
use satex_extractor::MosaicMethod;
use std::sync::Arc;
use zarrs_filesystem::FilesystemStore;

/// Extracts and stores every tile patch for `envelope.extraction_task`.
///
/// `archive_root` is the local filesystem root the archive's zarr store is
/// rooted at (the Worker's view of `envelope.storage_gs_path`, already
/// resolved to a local mount by the caller).
pub fn run_task(envelope: &DispatchEnvelope, archive_root: &std::path::Path, resolution: f64, method: MosaicMethod) -> Result<()> {
	let task = &envelope.extraction_task;
	let band_spec = task
		.constellation
		.band(&task.band)
		.with_context(|| format!("task {} references unknown band {}", task.task_id, task.band))?;

	let store = Arc::new(FilesystemStore::new(archive_root).context("opening archive store")?);
	let cache = TransformCache::default();

	let patches = satex_extractor::extract_task(task, resolution, method, &cache)
		.with_context(|| format!("extracting task {}", task.task_id))?;

	for (tile, patch) in patches {
		store_patch(&store, &tile.id, task.constellation, &task.band, task.sensing_time, band_spec.gsd, &patch)
			.with_context(|| format!("storing patch for tile {} in task {}", tile.id, task.task_id))?;
	}

	Ok(())
}
