//! Mosaic merge methods, a closed enumeration.
//!
//! Grounded in `task_mosaic_patches`'s use of `rasterio.merge.merge(method=
//! ...)`, restricted to the two methods the pipeline actually schedules
//! with: `"first"` (first non-nodata pixel wins) and `"max"` (brightest
//! pixel wins, used to bias toward cloud-free pixels across a revisit
//! bucket).

use anyhow::{Result, ensure};
use satex_core::error::SatexError;
use satex_core::types::Patch;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MosaicMethod {
	First,
	Max,
}

impl MosaicMethod {
	pub fn parse(s: &str) -> Result<Self> {
		Ok(match s {
			"first" => MosaicMethod::First,
			"max" => MosaicMethod::Max,
			other => {
				return Err(SatexError::InvalidArgument(format!("unknown mosaic method '{other}'")).into());
			}
		})
	}
}

/// Merges same-shape `patches` pixelwise. `0` is treated as nodata, matching
/// `download_and_extract_tiles_window`'s `fill_value=0` boundless reads.
///
/// # Errors
/// Returns [`SatexError::InvalidArgument`] if `patches` is empty or the
/// patches don't all share one `(width, height)`.
pub fn merge_patches(patches: &[Patch], method: MosaicMethod) -> Result<Patch> {
	ensure!(!patches.is_empty(), SatexError::InvalidArgument("no patches to merge".into()));
	let (width, height) = (patches[0].width, patches[0].height);
	ensure!(
		patches.iter().all(|p| p.width == width && p.height == height),
		SatexError::InvalidArgument("all patches in a mosaic must share one size".into())
	);

	let mut data = vec![0u16; (width as usize) * (height as usize)];
	match method {
		MosaicMethod::First => {
			for patch in patches {
				for (out, &value) in data.iter_mut().zip(&patch.data) {
					if *out == 0 && value != 0 {
						*out = value;
					}
				}
			}
		}
		MosaicMethod::Max => {
			for patch in patches {
				for (out, &value) in data.iter_mut().zip(&patch.data) {
					*out = (*out).max(value);
				}
			}
		}
	}
	Patch::new(width, height, data)
}
