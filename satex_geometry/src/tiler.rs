//! Splits a region of interest into a grid of fixed-size UTM tiles.
//!
//! Grounded in `split_region_in_utm_tiles` (the original used `sentinelhub`'s
//! `UtmGridSplitter`): pick the UTM zone covering the region, reproject into
//! it, and emit one [`Tile`] per `bbox_size` grid cell that touches the
//! region. Regions spanning more than one UTM zone are reprojected into the
//! zone of their centroid rather than split per zone — a known limitation,
//! not a goal of this pass (see the open question in the design notes).

use crate::utm::{utm_epsg, utm_row, utm_zone};
use anyhow::{Context, Result, ensure};
use geo::{BoundingRect, Centroid, Coord, Intersects, MultiPolygon, Polygon, Rect};
use satex_core::cache::TransformCache;
use satex_core::error::SatexError;
use satex_core::types::Tile;

/// Splits `region` (WGS84 degrees) into square tiles of `bbox_size` meters.
///
/// # Errors
/// Returns [`SatexError::InvalidArgument`] if `region` is empty or `bbox_size`
/// is not positive, or if the reprojection into the region's UTM zone fails.
pub fn split_region_in_utm_tiles(region: &MultiPolygon<f64>, bbox_size: f64, cache: &TransformCache) -> Result<Vec<Tile>> {
	ensure!(bbox_size > 0.0, SatexError::InvalidArgument(format!("bbox_size must be positive, got {bbox_size}")));
	ensure!(!region.0.is_empty(), SatexError::InvalidArgument("region of interest has no polygons".into()));

	let centroid = region.centroid().ok_or_else(|| SatexError::InvalidArgument("region of interest has no centroid".into()))?;
	let (lon, lat) = (centroid.x(), centroid.y());
	let zone = utm_zone(lat, lon);
	let row = utm_row(lat);
	let epsg = utm_epsg(lat, lon);

	let transform = cache.get_or_create("EPSG:4326", &format!("EPSG:{epsg}")).context("building WGS84 -> UTM transform")?;
	let projected = project_multi_polygon(region, |x, y| transform.convert((x, y)))?;

	let bounds = projected.bounding_rect().ok_or_else(|| SatexError::InvalidArgument("projected region has no bounding box".into()))?;

	let x0 = (bounds.min().x / bbox_size).floor() as i64;
	let x1 = (bounds.max().x / bbox_size).ceil() as i64;
	let y0 = (bounds.min().y / bbox_size).floor() as i64;
	let y1 = (bounds.max().y / bbox_size).ceil() as i64;

	let mut tiles = Vec::new();
	for xi in x0..x1 {
		for yi in y0..y1 {
			let min_x = xi as f64 * bbox_size;
			let min_y = yi as f64 * bbox_size;
			let cell = Rect::new(Coord { x: min_x, y: min_y }, Coord { x: min_x + bbox_size, y: min_y + bbox_size });
			if projected.intersects(&cell) {
				tiles.push(Tile::new(zone, row, epsg, min_x, min_y, min_x + bbox_size, min_y + bbox_size)?);
			}
		}
	}
	Ok(tiles)
}

/// Reprojects every coordinate of a [`MultiPolygon`] through `transform`.
fn project_multi_polygon(region: &MultiPolygon<f64>, transform: impl Fn(f64, f64) -> Result<(f64, f64), proj::ProjError>) -> Result<MultiPolygon<f64>> {
	let mut polygons = Vec::with_capacity(region.0.len());
	for polygon in &region.0 {
		polygons.push(project_polygon(polygon, &transform)?);
	}
	Ok(MultiPolygon(polygons))
}

fn project_polygon(polygon: &Polygon<f64>, transform: &impl Fn(f64, f64) -> Result<(f64, f64), proj::ProjError>) -> Result<Polygon<f64>> {
	let project_ring = |ring: &geo::LineString<f64>| -> Result<geo::LineString<f64>> {
		let coords = ring
			.coords()
			.map(|c| {
				let (x, y) = transform(c.x, c.y).map_err(|e| SatexError::InvalidArgument(format!("reprojection failed for ({}, {}): {e}", c.x, c.y)))?;
				Ok(Coord { x, y })
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(geo::LineString(coords))
	};

	let exterior = project_ring(polygon.exterior())?;
	let interiors = polygon.interiors().iter().map(project_ring).collect::<Result<Vec<_>>>()?;
	Ok(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
	use super::*;
	use geo::polygon;

	#[test]
	fn test_splits_small_square_region() {
		let region = MultiPolygon(vec![polygon![
			(x: 10.0, y: 45.0),
			(x: 10.05, y: 45.0),
			(x: 10.05, y: 45.05),
			(x: 10.0, y: 45.05),
		]]);
		let cache = TransformCache::default();
		let tiles = split_region_in_utm_tiles(&region, 1000.0, &cache).unwrap();
		assert!(!tiles.is_empty());
		for tile in &tiles {
			assert_eq!(tile.epsg, 32633);
			assert_eq!(tile.bbox_size(), 1000.0);
		}
	}

	#[test]
	fn test_rejects_nonpositive_bbox_size() {
		let region = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
		let cache = TransformCache::default();
		assert!(split_region_in_utm_tiles(&region, 0.0, &cache).is_err());
	}

	#[test]
	fn test_rejects_empty_region() {
		let region = MultiPolygon(vec![]);
		let cache = TransformCache::default();
		assert!(split_region_in_utm_tiles(&region, 1000.0, &cache).is_err());
	}

	#[test]
	fn test_tile_ids_are_deterministic_across_runs() {
		let region = MultiPolygon(vec![polygon![
			(x: 10.0, y: 45.0),
			(x: 10.05, y: 45.0),
			(x: 10.05, y: 45.05),
			(x: 10.0, y: 45.05),
		]]);
		let cache = TransformCache::default();
		let a = split_region_in_utm_tiles(&region, 1000.0, &cache).unwrap();
		let b = split_region_in_utm_tiles(&region, 1000.0, &cache).unwrap();
		assert_eq!(a.iter().map(|t| t.id.clone()).collect::<Vec<_>>(), b.iter().map(|t| t.id.clone()).collect::<Vec<_>>());
	}
}
