//! Projected-coordinate and pixel-window arithmetic shared by the
//! extraction pipeline.
//!
//! Grounded in `get_proj_win` (the task's tile-union bounding box) and
//! `get_window_union`'s use of `rasterio.windows.from_bounds`, which inverts
//! a GDAL-style affine geotransform to turn a projected-coordinate window
//! into a pixel-space one.

use anyhow::Result;
use satex_core::cache::TransformCache;
use satex_core::types::Tile;

/// The union bounding box of `tiles`, as `(ulx, uly, lrx, lry)` — upper-left
/// x/y and lower-right x/y, matching `get_proj_win`'s axis convention (y
/// decreases downward).
#[must_use]
pub fn proj_win(tiles: &[Tile]) -> (f64, f64, f64, f64) {
	let ulx = tiles.iter().map(|t| t.min_x).fold(f64::INFINITY, f64::min);
	let uly = tiles.iter().map(|t| t.max_y).fold(f64::NEG_INFINITY, f64::max);
	let lrx = tiles.iter().map(|t| t.max_x).fold(f64::NEG_INFINITY, f64::max);
	let lry = tiles.iter().map(|t| t.min_y).fold(f64::INFINITY, f64::min);
	(ulx, uly, lrx, lry)
}

/// A pixel-space read window: offset and size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
	pub x_off: isize,
	pub y_off: isize,
	pub x_size: usize,
	pub y_size: usize,
}

/// Converts a projected-coordinate `(ulx, uly, lrx, lry)` window into pixel
/// space under a GDAL affine geotransform `[origin_x, px_w, rot_x, origin_y,
/// rot_y, px_h]`. Assumes a north-up, unrotated geotransform (`rot_x ==
/// rot_y == 0.0`), which is all the source assets this pipeline reads ever
/// carry.
#[must_use]
pub fn pixel_window(geo_transform: [f64; 6], bounds: (f64, f64, f64, f64)) -> PixelWindow {
	let (ulx, uly, lrx, lry) = bounds;
	let origin_x = geo_transform[0];
	let px_w = geo_transform[1];
	let origin_y = geo_transform[3];
	let px_h = geo_transform[5];

	let col0 = (ulx - origin_x) / px_w;
	let col1 = (lrx - origin_x) / px_w;
	let row0 = (uly - origin_y) / px_h;
	let row1 = (lry - origin_y) / px_h;

	let x_off = col0.min(col1).floor() as isize;
	let y_off = row0.min(row1).floor() as isize;
	let x_size = (col0.max(col1) - col0.min(col1)).ceil().max(1.0) as usize;
	let y_size = (row0.max(row1) - row0.min(row1)).ceil().max(1.0) as usize;

	PixelWindow { x_off, y_off, x_size, y_size }
}

/// Reprojects a `(ulx, uly, lrx, lry)` window from `from_epsg` into
/// `to_epsg`, so a window computed in the task's tile CRS can be read
/// against an asset whose native CRS differs — an asset's own geotransform
/// is always expressed in its own CRS, so the window handed to
/// [`pixel_window`] must be too. Reprojects all four corners rather than
/// just the two diagonal ones, since a CRS change can rotate the box.
///
/// # Errors
/// Propagates the underlying PROJ transform failure.
pub fn reproject_window(bounds: (f64, f64, f64, f64), from_epsg: u32, to_epsg: u32, cache: &TransformCache) -> Result<(f64, f64, f64, f64)> {
	if from_epsg == to_epsg {
		return Ok(bounds);
	}
	let (ulx, uly, lrx, lry) = bounds;
	let transform = cache.get_or_create(&format!("EPSG:{from_epsg}"), &format!("EPSG:{to_epsg}"))?;

	let mut min_x = f64::INFINITY;
	let mut min_y = f64::INFINITY;
	let mut max_x = f64::NEG_INFINITY;
	let mut max_y = f64::NEG_INFINITY;
	for (x, y) in [(ulx, uly), (lrx, uly), (lrx, lry), (ulx, lry)] {
		let (px, py) = transform.convert((x, y)).map_err(|e| anyhow::anyhow!("reprojecting extraction window corner: {e}"))?;
		min_x = min_x.min(px);
		min_y = min_y.min(py);
		max_x = max_x.max(px);
		max_y = max_y.max(py);
	}
	Ok((min_x, max_y, max_x, min_y))
}

/// The pixel offset of `tile` within the merged mosaic window whose origin
/// is `(ulx, uly)` at `resolution` meters/pixel — the equivalent of
/// `get_tile_pixel_coords`, computed directly from the tile's own bbox
/// instead of round-tripping through a written-out raster's transform.
#[must_use]
pub fn tile_offset_in_window(tile: &Tile, window_ulx: f64, window_uly: f64, resolution: f64) -> (usize, usize) {
	let col = ((tile.min_x - window_ulx) / resolution).round().max(0.0) as usize;
	let row = ((window_uly - tile.max_y) / resolution).round().max(0.0) as usize;
	(col, row)
}
