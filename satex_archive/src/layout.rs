//! Path layout within the archive:
//! `{root}/{tile_id}/{constellation}/{data,timestamps,mask/<name>}`.

use satex_core::types::Constellation;

/// Path, relative to the archive root, of a tile-constellation group.
#[must_use]
pub fn group_path(tile_id: &str, constellation: Constellation) -> String {
	format!("{tile_id}/{constellation}")
}

/// Path of the chunked `(T, B, H, W)` data array for a tile-constellation group.
#[must_use]
pub fn data_path(tile_id: &str, constellation: Constellation) -> String {
	format!("{}/data", group_path(tile_id, constellation))
}

/// Path of the 1-D sorted timestamps array for a tile-constellation group.
#[must_use]
pub fn timestamps_path(tile_id: &str, constellation: Constellation) -> String {
	format!("{}/timestamps", group_path(tile_id, constellation))
}

/// Path of an optional named mask array for a tile-constellation group.
#[must_use]
pub fn mask_path(tile_id: &str, constellation: Constellation, name: &str) -> String {
	format!("{}/mask/{name}", group_path(tile_id, constellation))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_paths() {
		assert_eq!(data_path("32_U_1000_500_5600", Constellation::Sentinel2), "32_U_1000_500_5600/sentinel-2/data");
		assert_eq!(timestamps_path("t1", Constellation::Landsat8), "t1/landsat-8/timestamps");
		assert_eq!(mask_path("t1", Constellation::Landsat8, "cloud"), "t1/landsat-8/mask/cloud");
	}
}
