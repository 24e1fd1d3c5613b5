//! Constellation identity and per-band metadata (name, common name, center
//! wavelength, full-width-half-max, ground sample distance) for every sensor
//! this pipeline knows how to extract.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A satellite constellation supported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Constellation {
	Sentinel2,
	Landsat5,
	Landsat7,
	Landsat8,
}

impl Constellation {
	/// Canonical string id used in task ids, zarr group paths and STAC queries.
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			Constellation::Sentinel2 => "sentinel-2",
			Constellation::Landsat5 => "landsat-5",
			Constellation::Landsat7 => "landsat-7",
			Constellation::Landsat8 => "landsat-8",
		}
	}

	/// Parses a constellation from its canonical string id.
	pub fn parse(s: &str) -> Result<Self> {
		Ok(match s {
			"sentinel-2" => Constellation::Sentinel2,
			"landsat-5" => Constellation::Landsat5,
			"landsat-7" => Constellation::Landsat7,
			"landsat-8" => Constellation::Landsat8,
			other => bail!("unknown constellation '{other}'"),
		})
	}

	/// The raster media type assets of this constellation are stored as.
	#[must_use]
	pub fn media_type(&self) -> &'static str {
		match self {
			Constellation::Sentinel2 => "image/jp2",
			Constellation::Landsat5 | Constellation::Landsat7 | Constellation::Landsat8 => "image/tiff",
		}
	}

	/// The full band table for this constellation, in sensor-native order.
	#[must_use]
	pub fn bands(&self) -> Vec<BandSpec> {
		match self {
			Constellation::Sentinel2 => sentinel2_bands(),
			Constellation::Landsat5 => landsat5_bands(),
			Constellation::Landsat7 => landsat7_bands(),
			Constellation::Landsat8 => landsat8_bands(),
		}
	}

	/// Looks up a single band by name, e.g. `"B04"` on Sentinel-2.
	pub fn band(&self, name: &str) -> Result<BandSpec> {
		self
			.bands()
			.into_iter()
			.find(|b| b.name == name)
			.ok_or_else(|| anyhow::anyhow!("constellation {} has no band '{name}'", self.as_str()))
	}
}

impl fmt::Display for Constellation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Metadata for a single spectral band of a constellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
	pub name: String,
	pub common_name: String,
	pub center_wavelength: f64,
	/// Full width at half maximum, in micrometers. Only populated for Landsat
	/// bands — the original Sentinel-2 band table never carried it.
	pub full_width_half_max: Option<f64>,
	/// Ground sample distance in meters.
	pub gsd: f64,
}

impl BandSpec {
	fn new(name: &str, common_name: &str, center_wavelength: f64, fwhm: Option<f64>, gsd: f64) -> Self {
		Self {
			name: name.to_string(),
			common_name: common_name.to_string(),
			center_wavelength,
			full_width_half_max: fwhm,
			gsd,
		}
	}
}

fn sentinel2_bands() -> Vec<BandSpec> {
	vec![
		BandSpec::new("B01", "coastal", 0.443, None, 60.0),
		BandSpec::new("B02", "blue", 0.490, None, 10.0),
		BandSpec::new("B03", "green", 0.560, None, 10.0),
		BandSpec::new("B04", "red", 0.665, None, 10.0),
		BandSpec::new("B05", "rededge1", 0.705, None, 20.0),
		BandSpec::new("B06", "rededge2", 0.740, None, 20.0),
		BandSpec::new("B07", "rededge3", 0.783, None, 20.0),
		BandSpec::new("B08", "nir", 0.842, None, 10.0),
		BandSpec::new("B8A", "nir08", 0.865, None, 20.0),
		BandSpec::new("B09", "nir09", 0.945, None, 60.0),
		BandSpec::new("B10", "cirrus", 1.375, None, 60.0),
		BandSpec::new("B11", "swir1", 1.610, None, 20.0),
		BandSpec::new("B12", "swir2", 2.190, None, 20.0),
	]
}

fn landsat8_bands() -> Vec<BandSpec> {
	vec![
		BandSpec::new("B1", "coastal", 0.48, Some(0.02), 30.0),
		BandSpec::new("B2", "blue", 0.44, Some(0.06), 30.0),
		BandSpec::new("B3", "green", 0.56, Some(0.06), 30.0),
		BandSpec::new("B4", "red", 0.65, Some(0.04), 30.0),
		BandSpec::new("B5", "nir", 0.86, Some(0.03), 30.0),
		BandSpec::new("B6", "swir1", 1.6, Some(0.08), 30.0),
		BandSpec::new("B7", "swir2", 2.2, Some(0.2), 30.0),
		BandSpec::new("B8", "pan", 0.59, Some(0.18), 15.0),
		BandSpec::new("B9", "cirrus", 1.37, Some(0.02), 30.0),
		BandSpec::new("B10", "tirs1", 10.9, Some(0.8), 100.0),
		BandSpec::new("B11", "tirs2", 12.0, Some(1.0), 100.0),
	]
}

fn landsat7_bands() -> Vec<BandSpec> {
	vec![
		BandSpec::new("B1", "blue", 0.485, Some(0.035), 30.0),
		BandSpec::new("B2", "green", 0.56, Some(0.04), 30.0),
		BandSpec::new("B3", "red", 0.66, Some(0.03), 30.0),
		BandSpec::new("B4", "nir", 0.835, Some(0.065), 30.0),
		BandSpec::new("B5", "swir1", 1.65, Some(0.10), 30.0),
		BandSpec::new("B6_VCID_1", "low-gain thermal infrared 1", 11.45, Some(1.05), 60.0),
		BandSpec::new("B6_VCID_2", "high-gain thermal infrared 2", 11.45, Some(1.05), 60.0),
		BandSpec::new("B7", "swir2", 2.215, Some(0.135), 30.0),
		BandSpec::new("B8", "pan", 0.71, Some(0.24), 15.0),
	]
}

fn landsat5_bands() -> Vec<BandSpec> {
	vec![
		BandSpec::new("B1", "blue", 0.485, Some(0.035), 30.0),
		BandSpec::new("B2", "green", 0.56, Some(0.04), 30.0),
		BandSpec::new("B3", "red", 0.66, Some(0.03), 30.0),
		BandSpec::new("B4", "nir", 0.835, Some(0.065), 30.0),
		BandSpec::new("B5", "swir1", 1.65, Some(0.10), 30.0),
		BandSpec::new("B6", "thermal infrared 1", 11.45, Some(1.05), 60.0),
		BandSpec::new("B7", "swir2", 2.215, Some(0.135), 30.0),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_roundtrip_parse() {
		for c in [
			Constellation::Sentinel2,
			Constellation::Landsat5,
			Constellation::Landsat7,
			Constellation::Landsat8,
		] {
			assert_eq!(Constellation::parse(c.as_str()).unwrap(), c);
		}
	}

	#[test]
	fn test_unknown_constellation() {
		assert!(Constellation::parse("sentinel-99").is_err());
	}

	#[test]
	fn test_sentinel2_band_count_and_gsd() {
		let bands = Constellation::Sentinel2.bands();
		assert_eq!(bands.len(), 13);
		assert_eq!(Constellation::Sentinel2.band("B02").unwrap().gsd, 10.0);
		assert!(Constellation::Sentinel2.band("B02").unwrap().full_width_half_max.is_none());
	}

	#[test]
	fn test_landsat8_band_lookup() {
		let band = Constellation::Landsat8.band("B8").unwrap();
		assert_eq!(band.common_name, "pan");
		assert_eq!(band.gsd, 15.0);
		assert_eq!(band.full_width_half_max, Some(0.18));
	}

	#[test]
	fn test_unknown_band() {
		assert!(Constellation::Landsat5.band("B99").is_err());
	}
}
