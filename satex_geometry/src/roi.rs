//! Loads the region of interest the pipeline extracts over.
//!
//! The config's `gpd_input` path names a vector file; this crate reads
//! GeoJSON (`FeatureCollection`, `Feature`, or a bare geometry), folding every
//! polygonal feature into a single [`MultiPolygon`]. Other vector formats the
//! original tooling accepted via `geopandas` (Shapefile, GeoPackage) are not
//! supported — callers should convert to GeoJSON first.

use anyhow::{Context, Result, bail};
use geo::{MultiPolygon, Polygon};
use geojson::{GeoJson, quick_collection};
use satex_core::error::SatexError;
use std::path::Path;

/// Reads the region of interest from a GeoJSON file as a single [`MultiPolygon`].
pub fn read_region_of_interest(path: impl AsRef<Path>) -> Result<MultiPolygon<f64>> {
	let path = path.as_ref();
	let raw = std::fs::read_to_string(path).with_context(|| format!("reading region of interest {}", path.display()))?;
	parse_region_of_interest(&raw).with_context(|| format!("parsing region of interest {}", path.display()))
}

/// Parses a GeoJSON document into a single [`MultiPolygon`], merging every
/// `Polygon`/`MultiPolygon` feature it contains.
pub fn parse_region_of_interest(geojson: &str) -> Result<MultiPolygon<f64>> {
	let parsed: GeoJson = geojson.parse().map_err(|e| SatexError::InvalidArgument(format!("invalid GeoJSON: {e}")))?;
	let collection: geo::GeometryCollection<f64> =
		quick_collection(&parsed).map_err(|e| SatexError::InvalidArgument(format!("invalid GeoJSON geometry: {e}")))?;

	let mut polygons: Vec<Polygon<f64>> = Vec::new();
	for geometry in collection {
		match geometry {
			geo::Geometry::Polygon(p) => polygons.push(p),
			geo::Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
			other => bail!(SatexError::InvalidArgument(format!(
				"region of interest must be polygonal, found a {other:?}"
			))),
		}
	}

	if polygons.is_empty() {
		bail!(SatexError::InvalidArgument("region of interest contains no polygons".into()));
	}
	Ok(MultiPolygon(polygons))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_single_polygon() {
		let json = r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]},"properties":{}}"#;
		let region = parse_region_of_interest(json).unwrap();
		assert_eq!(region.0.len(), 1);
	}

	#[test]
	fn test_parse_feature_collection_merges_polygons() {
		let json = r#"{"type":"FeatureCollection","features":[
			{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]},"properties":{}},
			{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[5,5],[6,5],[6,6],[5,6],[5,5]]]},"properties":{}}
		]}"#;
		let region = parse_region_of_interest(json).unwrap();
		assert_eq!(region.0.len(), 2);
	}

	#[test]
	fn test_rejects_point_geometry() {
		let json = r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{}}"#;
		assert!(parse_region_of_interest(json).is_err());
	}

	#[test]
	fn test_rejects_invalid_json() {
		assert!(parse_region_of_interest("not json").is_err());
	}
}
