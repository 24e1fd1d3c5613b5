//! A single band's worth of raster samples for one tile, one timestamp —
//! the unit the Extractor produces and the Storer writes into the archive.

use crate::error::SatexError;
use anyhow::{Result, ensure};

/// A `u16` raster patch with row-major `(height, width)` layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
	pub width: u32,
	pub height: u32,
	pub data: Vec<u16>,
}

impl Patch {
	/// Builds a patch, checking `data.len() == width * height`.
	pub fn new(width: u32, height: u32, data: Vec<u16>) -> Result<Self> {
		ensure!(
			data.len() == (width as usize) * (height as usize),
			SatexError::InvalidArgument(format!(
				"patch data length {} does not match {width}x{height}",
				data.len()
			))
		);
		Ok(Self { width, height, data })
	}

	/// A patch of all zeros, used to pad a resampled patch up to the archive's grid size.
	#[must_use]
	pub fn zeroed(width: u32, height: u32) -> Self {
		Self { width, height, data: vec![0; (width as usize) * (height as usize)] }
	}

	#[must_use]
	pub fn get(&self, x: u32, y: u32) -> u16 {
		self.data[(y as usize) * (self.width as usize) + (x as usize)]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new_rejects_mismatched_length() {
		assert!(Patch::new(2, 2, vec![1, 2, 3]).is_err());
	}

	#[test]
	fn test_get() {
		let patch = Patch::new(2, 2, vec![1, 2, 3, 4]).unwrap();
		assert_eq!(patch.get(1, 1), 4);
	}

	#[test]
	fn test_zeroed() {
		let patch = Patch::zeroed(3, 2);
		assert_eq!(patch.data.len(), 6);
		assert!(patch.data.iter().all(|&v| v == 0));
	}
}
