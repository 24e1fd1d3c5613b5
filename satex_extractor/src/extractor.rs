//! Turns one [`ExtractionTask`] into a patch per tile.
//!
//! Grounded in `task_mosaic_patches`: reads each covering item's window over
//! the task's tile union, mosaics them per [`MosaicMethod`], then crops the
//! per-tile sub-patches out of the merged window — the Rust equivalent of
//! writing the merge to a temp GeoTIFF and re-reading per-tile windows,
//! done in memory since every patch here is already a plain `u16` buffer.

use crate::mosaic::{MosaicMethod, merge_patches};
use crate::window::{proj_win, reproject_window, tile_offset_in_window};
use anyhow::{Context, Result};
use gdal::raster::ResampleAlg;
use satex_core::cache::TransformCache;
use satex_core::error::SatexError;
use satex_core::types::{ExtractionTask, Patch, Tile};

/// Picks the resampling algorithm for a band, matching
/// `download_and_extract_tiles_window`'s `BQA` special case (nearest, to
/// avoid blending categorical quality-assurance flag values).
fn resample_alg_for_band(band: &str) -> ResampleAlg {
	if band == "BQA" { ResampleAlg::NearestNeighbour } else { ResampleAlg::Bilinear }
}

/// Crops the sub-patch belonging to `tile` out of `mosaic`, whose top-left
/// corner sits at `(window_ulx, window_uly)` in the tile's CRS.
fn crop_tile_patch(mosaic: &Patch, window_ulx: f64, window_uly: f64, resolution: f64, tile: &Tile) -> Result<Patch> {
	let (col0, row0) = tile_offset_in_window(tile, window_ulx, window_uly, resolution);
	let side = (tile.bbox_size() / resolution).round().max(1.0) as usize;

	let mut data = Vec::with_capacity(side * side);
	for row in row0..row0 + side {
		for col in col0..col0 + side {
			let value = if row < mosaic.height as usize && col < mosaic.width as usize {
				mosaic.get(col as u32, row as u32)
			} else {
				0
			};
			data.push(value);
		}
	}
	Patch::new(side as u32, side as u32, data)
}

/// Extracts `task` at `resolution` meters/pixel, returning one patch per
/// tile the task covers.
///
/// # Errors
/// Returns [`SatexError::InvalidArgument`] if `task` carries no items, or
/// propagates read/merge failures from the underlying GDAL reads.
pub fn extract_task(task: &ExtractionTask, resolution: f64, method: MosaicMethod, cache: &TransformCache) -> Result<Vec<(Tile, Patch)>> {
	anyhow::ensure!(
		!task.items.is_empty(),
		SatexError::InvalidArgument(format!("task {} has no covering items", task.task_id))
	);

	let (ulx, uly, lrx, lry) = proj_win(&task.tiles);
	let out_width = ((lrx - ulx) / resolution).round().max(1.0) as usize;
	let out_height = ((uly - lry) / resolution).round().max(1.0) as usize;
	let resample = resample_alg_for_band(&task.band);
	let task_epsg = task.epsg();

	let mut patches = Vec::with_capacity(task.items.len());
	for item in &task.items {
		let asset = item
			.asset(&task.band)
			.ok_or_else(|| SatexError::InvalidArgument(format!("item {} has no asset for band {}", item.id, task.band)))?;
		let asset_bounds = reproject_window((ulx, uly, lrx, lry), task_epsg, item.epsg, cache)
			.with_context(|| format!("reprojecting extraction window into item {}'s CRS (EPSG:{})", item.id, item.epsg))?;
		let patch = crate::reader::read_window(&asset.href, asset_bounds, out_width, out_height, resample)
			.with_context(|| format!("reading item {} band {}", item.id, task.band))?;
		patches.push(patch);
	}

	let merged = merge_patches(&patches, method)?;

	task
		.tiles
		.iter()
		.map(|tile| crop_tile_patch(&merged, ulx, uly, resolution, tile).map(|patch| (tile.clone(), patch)))
		.collect()
}
