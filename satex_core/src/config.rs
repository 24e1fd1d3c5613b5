//! The pipeline's hierarchical configuration, loaded from YAML via
//! `serde_yaml_ng` — the same format VersaTiles' own `server.yml` uses —
//! with no hidden global state beyond the read-only constellation band
//! tables in [`crate::types::Constellation`].

use crate::types::Constellation;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tiler stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilerConfig {
	/// Side length, in meters, of each emitted tile. Must be square.
	pub bbox_size: f64,
}

/// Scheduler stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
	/// Side length, in meters, of the coarser clustering grid.
	pub split_m: f64,
	/// Width, in days, of a revisit bucket.
	pub interval_days: i64,
	/// When false, tasks already present in the archive are skipped.
	#[serde(default)]
	pub overwrite: bool,
}

/// Archive Preparer stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparerConfig {
	/// Side length, in meters, of a patch (normally equal to `tiler.bbox_size`).
	pub patch_size: f64,
	/// Zarr chunk size along each spatial axis, in pixels.
	pub chunk_size: u64,
}

/// Root pipeline configuration — one value covers every stage, so every
/// entry point is explicit about its inputs rather than reaching for a
/// process-wide global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
	pub project: String,
	pub user_id: String,
	pub dataset_name: String,
	pub storage_root: String,
	pub start_date: NaiveDate,
	pub end_date: NaiveDate,
	pub constellations: Vec<Constellation>,
	/// Path to the vector file (e.g. GeoJSON/Shapefile) defining the region of interest.
	pub gpd_input: PathBuf,
	/// Path the STAC-like item collection is read from / written to.
	pub item_collection: PathBuf,
	/// Path the Tiler's output is read from / written to.
	pub tiles: PathBuf,
	/// Path the Scheduler's output is read from / written to.
	pub extraction_tasks: PathBuf,
	pub tiler: TilerConfig,
	pub scheduler: SchedulerConfig,
	pub preparer: PreparerConfig,
}

impl PipelineConfig {
	/// Loads a configuration from a YAML file on disk.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
		serde_yaml_ng::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
	}

	/// The archive root for this run's dataset: `{storage_root}/{dataset_name}`.
	#[must_use]
	pub fn archive_root(&self) -> PathBuf {
		PathBuf::from(&self.storage_root).join(&self.dataset_name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn sample_yaml() -> &'static str {
		r"
project: satex-demo
user_id: alice
dataset_name: demo-archive
storage_root: /data/archives
start_date: 2024-01-01
end_date: 2024-02-01
constellations: [sentinel-2]
gpd_input: region.geojson
item_collection: items.json
tiles: tiles.bin
extraction_tasks: tasks.bin
tiler:
  bbox_size: 1000.0
scheduler:
  split_m: 10000.0
  interval_days: 5
  overwrite: false
preparer:
  patch_size: 1000.0
  chunk_size: 256
"
	}

	#[test]
	fn test_parse_sample() {
		let cfg: PipelineConfig = serde_yaml_ng::from_str(sample_yaml()).unwrap();
		assert_eq!(cfg.project, "satex-demo");
		assert_eq!(cfg.constellations, vec![Constellation::Sentinel2]);
		assert_eq!(cfg.tiler.bbox_size, 1000.0);
		assert!(!cfg.scheduler.overwrite);
	}

	#[test]
	fn test_archive_root() {
		let cfg: PipelineConfig = serde_yaml_ng::from_str(sample_yaml()).unwrap();
		assert_eq!(cfg.archive_root(), PathBuf::from("/data/archives/demo-archive"));
	}

	#[test]
	fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(sample_yaml().as_bytes()).unwrap();
		let cfg = PipelineConfig::load(file.path()).unwrap();
		assert_eq!(cfg.user_id, "alice");
	}

	#[test]
	fn test_load_missing_file_errors() {
		assert!(PipelineConfig::load("/nonexistent/path/config.yml").is_err());
	}
}
