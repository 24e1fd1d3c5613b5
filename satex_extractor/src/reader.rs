//! Opens one source asset and reads a windowed, resampled patch out of it.
//!
//! Grounded in `download_and_extract_tiles_window`'s `ds.read(window=...,
//! out_shape=..., resampling=...)` call, adapted to the `gdal` crate's
//! `RasterBand::read_as`. Remote
//! `http(s)://` asset URLs are opened through GDAL's `/vsicurl/` virtual
//! filesystem rather than downloaded up front, since the task only ever
//! needs one small window out of a much larger scene.

use crate::window::{PixelWindow, pixel_window};
use anyhow::{Context, Result};
use gdal::Dataset;
use gdal::raster::ResampleAlg;
use satex_core::types::Patch;

/// Rewrites a remote `http(s)://` asset URL to GDAL's `/vsicurl/` virtual
/// filesystem path; local paths pass through unchanged.
fn to_gdal_path(href: &str) -> String {
	if href.starts_with("http://") || href.starts_with("https://") {
		format!("/vsicurl/{href}")
	} else {
		href.to_string()
	}
}

/// Opens `href` (a local path or an `http(s)://` URL) for GDAL reading.
fn open_dataset(href: &str) -> Result<Dataset> {
	let path = to_gdal_path(href);
	Dataset::open(&path).with_context(|| format!("failed to open GDAL dataset {path}"))
}

/// Reads the window covering `bounds` (projected coordinates, in the
/// dataset's own CRS) out of band 1 of `href`, resampled to
/// `(out_width, out_height)` pixels.
pub fn read_window(
	href: &str,
	bounds: (f64, f64, f64, f64),
	out_width: usize,
	out_height: usize,
	resample: ResampleAlg,
) -> Result<Patch> {
	let dataset = open_dataset(href)?;
	let geo_transform = dataset.geo_transform().context("dataset has no geotransform")?;
	let PixelWindow { x_off, y_off, x_size, y_size } = pixel_window(geo_transform, bounds);

	let band = dataset.rasterband(1).context("dataset has no band 1")?;
	let buffer = band
		.read_as::<u16>((x_off, y_off), (x_size, y_size), (out_width, out_height), Some(resample))
		.context("reading windowed band data")?;

	Patch::new(out_width as u32, out_height as u32, buffer.data().to_vec())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_to_gdal_path_rewrites_http() {
		assert_eq!(to_gdal_path("https://example.com/B04.jp2"), "/vsicurl/https://example.com/B04.jp2");
		assert_eq!(to_gdal_path("http://example.com/B04.jp2"), "/vsicurl/http://example.com/B04.jp2");
	}

	#[test]
	fn test_to_gdal_path_leaves_local_path_unchanged() {
		assert_eq!(to_gdal_path("/data/scene/B04.jp2"), "/data/scene/B04.jp2");
	}

	#[test]
	fn test_open_dataset_local_missing_file_errors() {
		assert!(open_dataset("/nonexistent/path/to/scene.tif").is_err());
	}
}
