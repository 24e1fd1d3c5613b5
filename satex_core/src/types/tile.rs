//! An axis-aligned square in a specific UTM projection — the unit of the
//! archive's spatial grid.

use crate::error::SatexError;
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// A fixed-size square patch of ground in a projected (UTM) CRS.
///
/// Immutable after construction. `id` is derived from `(zone, row, size,
/// xloc, yloc)` and is therefore stable across runs for a fixed
/// `(region, bbox_size)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
	pub id: String,
	pub zone: u8,
	pub row: char,
	pub epsg: u32,
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
	/// The split-grid cluster this tile was assigned to by the Scheduler.
	/// `None` until clustering runs.
	pub cluster_id: Option<u64>,
}

impl Tile {
	/// Builds a tile, deriving its canonical id from the UTM grid coordinates.
	///
	/// # Errors
	/// Returns [`SatexError::InvalidArgument`] if the box isn't square or is
	/// degenerate (`max <= min`).
	pub fn new(zone: u8, row: char, epsg: u32, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
		ensure!(
			max_x > min_x && max_y > min_y,
			SatexError::InvalidArgument(format!(
				"tile bbox must satisfy max > min, got ({min_x},{min_y},{max_x},{max_y})"
			))
		);
		let size_x = max_x - min_x;
		let size_y = max_y - min_y;
		ensure!(
			(size_x - size_y).abs() < 1e-6,
			SatexError::InvalidArgument(format!("tile bbox must be square, got {size_x} x {size_y}"))
		);
		let size = size_x;
		let xloc = (min_x / size).round() as i64;
		let yloc = (min_y / size).round() as i64;
		let id = format!("{zone}_{row}_{}_{xloc}_{yloc}", size as i64);
		Ok(Self {
			id,
			zone,
			row,
			epsg,
			min_x,
			min_y,
			max_x,
			max_y,
			cluster_id: None,
		})
	}

	/// Bounding box as `(min_x, min_y, max_x, max_y)` in the tile's projected CRS.
	#[must_use]
	pub fn bbox(&self) -> (f64, f64, f64, f64) {
		(self.min_x, self.min_y, self.max_x, self.max_y)
	}

	/// Side length of the tile in meters (tiles are always square).
	#[must_use]
	pub fn bbox_size(&self) -> f64 {
		self.max_x - self.min_x
	}

	/// True if `self`'s bbox fully contains `other`'s bbox in the same EPSG.
	#[must_use]
	pub fn contains(&self, other: &Tile) -> bool {
		self.epsg == other.epsg
			&& self.min_x <= other.min_x
			&& self.min_y <= other.min_y
			&& self.max_x >= other.max_x
			&& self.max_y >= other.max_y
	}

	/// True if a raw bbox (in the same EPSG as this tile) is fully contained.
	#[must_use]
	pub fn contains_bbox(&self, bbox: (f64, f64, f64, f64)) -> bool {
		let (x0, y0, x1, y1) = bbox;
		self.min_x <= x0 && self.min_y <= y0 && self.max_x >= x1 && self.max_y >= y1
	}
}
