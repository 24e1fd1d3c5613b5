//! A single source scene as returned by the external Catalog collaborator.

use crate::types::Constellation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single per-band downloadable asset of a [`CatalogItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
	/// Fully-qualified URL of the asset, e.g.
	/// `{base_url}/GRANULE/{granule_id}/IMG_DATA/T{mgrs_tile}_{datatake_time}_{band}.jp2`
	/// for Sentinel-2, `{base_url}/{scene_id}_{band}.TIF` for Landsat.
	pub href: String,
	/// Ground sample distance in meters for this specific asset; normally
	/// equal to the constellation's band table value but kept per-asset since
	/// the catalog is the authoritative source.
	pub gsd: f64,
}

/// One observation of a region by one satellite at one time, read-only in
/// the core — produced entirely by the external Catalog query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
	pub id: String,
	pub constellation: Constellation,
	pub sensing_time: DateTime<Utc>,
	/// Geographic footprint of the scene in WGS84, as `(min_lon, min_lat,
	/// max_lon, max_lat)`. The original STAC item carries a full polygon;
	/// the pipeline only ever needs the bounding box for intersection tests.
	pub footprint: (f64, f64, f64, f64),
	/// Projected CRS of the scene's native assets.
	pub epsg: u32,
	/// Percentage (0-100) of the scene obscured by cloud, when known.
	pub cloud_cover: Option<f64>,
	/// Per-band asset URLs, keyed by band name (e.g. `"B04"`, `"B1"`).
	pub assets: HashMap<String, Asset>,
	/// Arbitrary STAC-style properties, carried for diagnostics only — never
	/// consulted by pipeline control flow.
	pub properties: Option<serde_json::Value>,
}

impl CatalogItem {
	/// Whether this item's footprint intersects the given WGS84 bbox.
	#[must_use]
	pub fn intersects(&self, bbox: (f64, f64, f64, f64)) -> bool {
		let (a_x0, a_y0, a_x1, a_y1) = self.footprint;
		let (b_x0, b_y0, b_x1, b_y1) = bbox;
		a_x0 <= b_x1 && a_x1 >= b_x0 && a_y0 <= b_y1 && a_y1 >= b_y0
	}

	/// Whether this item's footprint fully contains the given WGS84 bbox.
	#[must_use]
	pub fn contains(&self, bbox: (f64, f64, f64, f64)) -> bool {
		let (a_x0, a_y0, a_x1, a_y1) = self.footprint;
		let (b_x0, b_y0, b_x1, b_y1) = bbox;
		a_x0 <= b_x0 && a_y0 <= b_y0 && a_x1 >= b_x1 && a_y1 >= b_y1
	}

	/// Looks up the asset for a given band, if the item carries it.
	#[must_use]
	pub fn asset(&self, band: &str) -> Option<&Asset> {
		self.assets.get(band)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn item(footprint: (f64, f64, f64, f64)) -> CatalogItem {
		CatalogItem {
			id: "scene-1".into(),
			constellation: Constellation::Sentinel2,
			sensing_time: Utc::now(),
			footprint,
			epsg: 32632,
			cloud_cover: Some(12.5),
			assets: HashMap::new(),
			properties: None,
		}
	}

	#[test]
	fn test_intersects() {
		let a = item((0.0, 0.0, 10.0, 10.0));
		assert!(a.intersects((5.0, 5.0, 15.0, 15.0)));
		assert!(!a.intersects((11.0, 11.0, 20.0, 20.0)));
	}

	#[test]
	fn test_contains() {
		let a = item((0.0, 0.0, 10.0, 10.0));
		assert!(a.contains((2.0, 2.0, 8.0, 8.0)));
		assert!(!a.contains((2.0, 2.0, 12.0, 8.0)));
	}

	#[test]
	fn test_asset_lookup() {
		let mut a = item((0.0, 0.0, 1.0, 1.0));
		a.assets.insert(
			"B04".into(),
			Asset {
				href: "https://example.com/B04.jp2".into(),
				gsd: 10.0,
			},
		);
		assert!(a.asset("B04").is_some());
		assert!(a.asset("B99").is_none());
	}
}
