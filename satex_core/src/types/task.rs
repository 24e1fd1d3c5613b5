//! The unit of work dispatched to a Worker.

use crate::error::SatexError;
use crate::types::{CatalogItem, Constellation, Tile};
use anyhow::{Result, ensure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single extraction job: a set of same-UTM-zone tiles, the catalog items
/// covering them, and the `(band, sensing_time)` slot they should be written
/// to in the archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTask {
	pub task_id: String,
	pub tiles: Vec<Tile>,
	pub items: Vec<CatalogItem>,
	pub band: String,
	pub constellation: Constellation,
	/// The canonical timestamp this task's output is written under — the
	/// start of the revisit bucket it was scheduled into.
	pub sensing_time: DateTime<Utc>,
}

impl ExtractionTask {
	/// Builds a task, checking its invariants: non-empty tiles sharing one
	/// EPSG, and a band that exists on the constellation.
	///
	/// # Errors
	/// Returns [`SatexError::InvalidArgument`] if `tiles` is empty, the tiles
	/// span more than one EPSG, or `band` is not one of the constellation's
	/// bands.
	pub fn new(
		task_id: impl Into<String>,
		tiles: Vec<Tile>,
		items: Vec<CatalogItem>,
		band: impl Into<String>,
		constellation: Constellation,
		sensing_time: DateTime<Utc>,
	) -> Result<Self> {
		let band = band.into();
		ensure!(
			!tiles.is_empty(),
			SatexError::InvalidArgument("extraction task must have at least one tile".into())
		);
		let epsg = tiles[0].epsg;
		ensure!(
			tiles.iter().all(|t| t.epsg == epsg),
			SatexError::InvalidArgument("all tiles in an extraction task must share one EPSG".into())
		);
		ensure!(
			constellation.band(&band).is_ok(),
			SatexError::InvalidArgument(format!("band '{band}' is not valid for {constellation}"))
		);
		Ok(Self {
			task_id: task_id.into(),
			tiles,
			items,
			band,
			constellation,
			sensing_time,
		})
	}

	/// The EPSG all of this task's tiles share (validated at construction).
	#[must_use]
	pub fn epsg(&self) -> u32 {
		self.tiles[0].epsg
	}

	/// Serializes this task to the JSON shape published on the bus:
	/// `{task_id, tiles[], item_collection, band, constellation, sensing_time}`.
	pub fn serialize(&self) -> Result<serde_json::Value> {
		Ok(serde_json::json!({
			"task_id": self.task_id,
			"tiles": self.tiles.iter().map(|t| serde_json::json!({
				"id": t.id,
				"epsg": t.epsg,
				"bbox": [t.min_x, t.min_y, t.max_x, t.max_y],
			})).collect::<Vec<_>>(),
			"item_collection": self.items,
			"band": self.band,
			"constellation": self.constellation.as_str(),
			"sensing_time": self.sensing_time.to_rfc3339(),
		}))
	}
}

/// The push-subscription envelope the Worker receives over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEnvelope {
	pub storage_gs_path: String,
	pub job_id: String,
	pub extraction_task: ExtractionTask,
	pub bands: Vec<String>,
	/// Zarr chunk shape, always `[1, 1, C, C]`.
	pub chunks: [u64; 4],
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn tile(epsg: u32) -> Tile {
		Tile::new(32, 'U', epsg, 0.0, 0.0, 1000.0, 1000.0).unwrap()
	}

	fn item() -> CatalogItem {
		CatalogItem {
			id: "scene-1".into(),
			constellation: Constellation::Sentinel2,
			sensing_time: Utc::now(),
			footprint: (0.0, 0.0, 1.0, 1.0),
			epsg: 32632,
			cloud_cover: None,
			assets: HashMap::new(),
			properties: None,
		}
	}

	#[test]
	fn test_new_rejects_empty_tiles() {
		let err = ExtractionTask::new("t1", vec![], vec![], "B04", Constellation::Sentinel2, Utc::now()).unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "InvalidArgument");
	}

	#[test]
	fn test_new_rejects_mixed_epsg() {
		let tiles = vec![tile(32632), tile(32633)];
		let err = ExtractionTask::new("t1", tiles, vec![item()], "B04", Constellation::Sentinel2, Utc::now())
			.unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "InvalidArgument");
	}

	#[test]
	fn test_new_rejects_unknown_band() {
		let err = ExtractionTask::new(
			"t1",
			vec![tile(32632)],
			vec![item()],
			"NOPE",
			Constellation::Sentinel2,
			Utc::now(),
		)
		.unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "InvalidArgument");
	}

	#[test]
	fn test_serialize_roundtrip_shape() {
		let task = ExtractionTask::new(
			"t1",
			vec![tile(32632)],
			vec![item()],
			"B04",
			Constellation::Sentinel2,
			Utc::now(),
		)
		.unwrap();
		let json = task.serialize().unwrap();
		assert_eq!(json["task_id"], "t1");
		assert_eq!(json["band"], "B04");
		assert_eq!(json["constellation"], "sentinel-2");
	}
}
