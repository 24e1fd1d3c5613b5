//! Groups tiles into coarser `split_m` clusters, so the per-bucket item
//! intersection (the expensive step) runs once per cluster instead of once
//! per tile.
//!
//! Grounded in `cluster_tiles_in_utm`: build a region from the union of the
//! tiles' footprints, split that region into a coarser UTM grid, then tag
//! each tile with the id of the coarse cell its centroid falls in.

use anyhow::{Context, Result};
use geo::{Coord, MultiPolygon, Polygon};
use satex_core::cache::TransformCache;
use satex_core::types::Tile;
use satex_geometry::tiler::split_region_in_utm_tiles;

/// Returns `tiles` with `cluster_id` populated for every tile, per a
/// `split_m`-meter coarse grid over their combined footprint.
pub fn cluster_tiles_in_utm(tiles: &[Tile], split_m: f64, cache: &TransformCache) -> Result<Vec<Tile>> {
	if tiles.is_empty() {
		return Ok(Vec::new());
	}

	let footprint = tiles_footprint_wgs84(tiles, cache)?;
	let clusters = split_region_in_utm_tiles(&footprint, split_m, cache)?;
	if clusters.is_empty() {
		return Ok(tiles.to_vec());
	}

	let mut out = Vec::with_capacity(tiles.len());
	for tile in tiles {
		let (lon, lat) = tile_centroid_wgs84(tile, cache)?;
		let to_cluster_crs = cache.get_or_create("EPSG:4326", &format!("EPSG:{}", clusters[0].epsg)).context("reprojecting tile centroid into cluster CRS")?;
		let (cx, cy) = to_cluster_crs.convert((lon, lat)).map_err(|e| anyhow::anyhow!("reprojecting tile centroid: {e}"))?;

		let cluster_id = clusters
			.iter()
			.position(|cluster| cluster.contains_bbox((cx, cy, cx, cy)))
			.map(|idx| idx as u64);

		out.push(Tile { cluster_id, ..tile.clone() });
	}
	Ok(out)
}

fn tile_centroid_wgs84(tile: &Tile, cache: &TransformCache) -> Result<(f64, f64)> {
	let to_wgs84 = cache.get_or_create(&format!("EPSG:{}", tile.epsg), "EPSG:4326").context("reprojecting tile centroid to WGS84")?;
	let cx = (tile.min_x + tile.max_x) / 2.0;
	let cy = (tile.min_y + tile.max_y) / 2.0;
	to_wgs84.convert((cx, cy)).map_err(|e| anyhow::anyhow!("reprojecting tile centroid: {e}"))
}

/// Reprojects a tile's bbox corners into WGS84 and returns their envelope,
/// for comparing a UTM tile against a catalog item's WGS84 footprint.
pub fn tile_bbox_wgs84(tile: &Tile, cache: &TransformCache) -> Result<(f64, f64, f64, f64)> {
	let to_wgs84 = cache.get_or_create(&format!("EPSG:{}", tile.epsg), "EPSG:4326").context("reprojecting tile bbox to WGS84")?;
	let corners = [
		(tile.min_x, tile.min_y),
		(tile.max_x, tile.min_y),
		(tile.max_x, tile.max_y),
		(tile.min_x, tile.max_y),
	];
	let mut min_lon = f64::INFINITY;
	let mut min_lat = f64::INFINITY;
	let mut max_lon = f64::NEG_INFINITY;
	let mut max_lat = f64::NEG_INFINITY;
	for (x, y) in corners {
		let (lon, lat) = to_wgs84.convert((x, y)).map_err(|e| anyhow::anyhow!("reprojecting tile bbox corner: {e}"))?;
		min_lon = min_lon.min(lon);
		min_lat = min_lat.min(lat);
		max_lon = max_lon.max(lon);
		max_lat = max_lat.max(lat);
	}
	Ok((min_lon, min_lat, max_lon, max_lat))
}

fn tiles_footprint_wgs84(tiles: &[Tile], cache: &TransformCache) -> Result<MultiPolygon<f64>> {
	let mut polygons = Vec::with_capacity(tiles.len());
	for tile in tiles {
		let (min_lon, min_lat, max_lon, max_lat) = tile_bbox_wgs84(tile, cache)?;
		let ring = vec![
			Coord { x: min_lon, y: min_lat },
			Coord { x: max_lon, y: min_lat },
			Coord { x: max_lon, y: max_lat },
			Coord { x: min_lon, y: max_lat },
			Coord { x: min_lon, y: min_lat },
		];
		polygons.push(Polygon::new(geo::LineString(ring), vec![]));
	}
	Ok(MultiPolygon(polygons))
}
