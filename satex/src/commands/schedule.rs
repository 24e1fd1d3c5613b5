//! `schedule`: clusters tiles, intersects with the item collection, and
//! emits extraction tasks, skipping slots the archive already has.

use super::tile::read_tiles;
use anyhow::{Context, Result};
use satex_archive::ZarrArchiveReader;
use satex_core::PipelineConfig;
use satex_core::cache::TransformCache;
use satex_core::types::{CatalogItem, ExtractionTask};
use satex_scheduler::{ExtractedTimestamps, ScheduleParams, create_tasks_by_splits};
use std::path::PathBuf;
use std::sync::Arc;
use zarrs_filesystem::FilesystemStore;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Path to the pipeline configuration file.
	#[arg(short, long)]
	pub config: PathBuf,

	/// How many scheduling threads to use for the bucket-intersection pass.
	#[arg(long, default_value_t = num_cpus::get())]
	pub concurrency: usize,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let cfg = PipelineConfig::load(&arguments.config)?;

	if cfg.extraction_tasks.exists() {
		log::info!("extraction tasks already exist at {}, skipping", cfg.extraction_tasks.display());
		return Ok(());
	}

	let tiles = read_tiles(&cfg.tiles)?;
	let raw_items = std::fs::read_to_string(&cfg.item_collection).with_context(|| format!("reading {}", cfg.item_collection.display()))?;
	let items: Vec<CatalogItem> = serde_json::from_str(&raw_items).context("parsing item collection")?;

	let archive: Option<Box<dyn ExtractedTimestamps>> = if cfg.scheduler.overwrite {
		None
	} else {
		let store = Arc::new(FilesystemStore::new(cfg.archive_root()).context("opening archive store")?);
		Some(Box::new(ZarrArchiveReader::new(store)))
	};

	let params = ScheduleParams {
		tiles: &tiles,
		items: &items,
		constellations: &cfg.constellations,
		split_m: cfg.scheduler.split_m,
		interval_days: cfg.scheduler.interval_days,
		overwrite: cfg.scheduler.overwrite,
		io_concurrency: arguments.concurrency,
	};
	let cache = TransformCache::default();
	let tasks = create_tasks_by_splits(&params, &cache, archive.as_deref())?;

	log::info!("scheduled {} extraction tasks", tasks.len());

	write_tasks(&cfg.extraction_tasks, &tasks)?;
	Ok(())
}

pub fn write_tasks(path: &PathBuf, tasks: &[ExtractionTask]) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	std::fs::write(path, serde_json::to_string(tasks)?).with_context(|| format!("writing {}", path.display()))
}

pub fn read_tasks(path: &PathBuf) -> Result<Vec<ExtractionTask>> {
	let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	serde_json::from_str(&raw).with_context(|| format!("parsing extraction tasks from {}", path.display()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use satex_core::types::Tile;
	use std::collections::HashMap;

	fn write_config(dir: &std::path::Path, overwrite: bool) -> PathBuf {
		let config_path = dir.join("config.yml");
		let yaml = format!(
			r"
project: satex-demo
user_id: alice
dataset_name: demo
storage_root: {0}/archive
start_date: 2024-01-01
end_date: 2024-02-01
constellations: [sentinel-2]
gpd_input: {0}/region.geojson
item_collection: {0}/items.json
tiles: {0}/tiles.json
extraction_tasks: {0}/tasks.json
tiler: {{ bbox_size: 1000.0 }}
scheduler: {{ split_m: 50000.0, interval_days: 5, overwrite: {1} }}
preparer: {{ patch_size: 1000.0, chunk_size: 128 }}
",
			dir.display(),
			overwrite
		);
		std::fs::write(&config_path, yaml).unwrap();
		config_path
	}

	fn covering_tile() -> Tile {
		Tile::new(32, 'U', 32632, 500_000.0, 5_000_000.0, 501_000.0, 5_001_000.0).unwrap()
	}

	fn covering_item() -> satex_core::types::CatalogItem {
		satex_core::types::CatalogItem {
			id: "scene-1".into(),
			constellation: satex_core::types::Constellation::Sentinel2,
			sensing_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
			footprint: (9.0, 44.0, 11.0, 46.0),
			epsg: 32632,
			cloud_cover: None,
			assets: HashMap::new(),
			properties: None,
		}
	}

	#[test]
	fn test_schedule_writes_tasks() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path(), true);
		let cfg = PipelineConfig::load(&config_path).unwrap();

		super::super::tile::write_tiles(&cfg.tiles, &[covering_tile()]).unwrap();
		std::fs::write(&cfg.item_collection, serde_json::to_string(&vec![covering_item()]).unwrap()).unwrap();

		run(&Subcommand { config: config_path, concurrency: 2 }).unwrap();

		let tasks = read_tasks(&cfg.extraction_tasks).unwrap();
		assert!(!tasks.is_empty());
	}

	#[test]
	fn test_schedule_skips_when_already_present() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path(), true);
		let cfg = PipelineConfig::load(&config_path).unwrap();

		super::super::tile::write_tiles(&cfg.tiles, &[covering_tile()]).unwrap();
		std::fs::write(&cfg.item_collection, "[]").unwrap();
		std::fs::write(&cfg.extraction_tasks, "[]").unwrap();

		run(&Subcommand { config: config_path, concurrency: 2 }).unwrap();
		assert!(read_tasks(&cfg.extraction_tasks).unwrap().is_empty());
	}
}
