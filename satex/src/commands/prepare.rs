//! `prepare`: creates the zarr archive skeleton for every `(tile,
//! constellation)` pair a scheduled task touches.

use super::schedule::read_tasks;
use super::tile::read_tiles;
use anyhow::{Context, Result};
use satex_archive::prepare_tile;
use satex_core::PipelineConfig;
use satex_core::concurrency::parallel_map;
use satex_core::types::{Constellation, Tile};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use zarrs_filesystem::FilesystemStore;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Path to the pipeline configuration file.
	#[arg(short, long)]
	pub config: PathBuf,

	/// How many preparation threads to use.
	#[arg(long, default_value_t = num_cpus::get())]
	pub concurrency: usize,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let cfg = PipelineConfig::load(&arguments.config)?;
	let tiles = read_tiles(&cfg.tiles)?;
	let tasks = read_tasks(&cfg.extraction_tasks)?;

	let tiles_by_id: BTreeMap<&str, &Tile> = tiles.iter().map(|t| (t.id.as_str(), t)).collect();

	let mut sensing_times: BTreeMap<(String, Constellation), Vec<DateTime<Utc>>> = BTreeMap::new();
	for task in &tasks {
		for tile in &task.tiles {
			let entry = sensing_times.entry((tile.id.clone(), task.constellation)).or_default();
			if !entry.contains(&task.sensing_time) {
				entry.push(task.sensing_time);
			}
		}
	}
	for times in sensing_times.values_mut() {
		times.sort_unstable();
	}

	let archive_root = cfg.archive_root();
	std::fs::create_dir_all(&archive_root).with_context(|| format!("creating archive root {}", archive_root.display()))?;
	let store = Arc::new(FilesystemStore::new(&archive_root).context("opening archive store")?);

	let jobs: Vec<(String, Constellation, Vec<DateTime<Utc>>)> = sensing_times
		.into_iter()
		.filter(|((tile_id, _), _)| tiles_by_id.contains_key(tile_id.as_str()))
		.map(|((tile_id, constellation), times)| (tile_id, constellation, times))
		.collect();

	log::info!("preparing {} (tile, constellation) archive groups", jobs.len());

	let patch_size = cfg.preparer.patch_size;
	let chunk_size = cfg.preparer.chunk_size;
	let overwrite = cfg.scheduler.overwrite;
	let results = parallel_map(jobs, arguments.concurrency, move |(tile_id, constellation, times)| {
		prepare_tile(&store, &tile_id, constellation, patch_size, chunk_size, &times, overwrite)
			.with_context(|| format!("preparing tile {tile_id} constellation {constellation}"))
	});

	for result in results {
		result?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use satex_core::PipelineConfig;
	use satex_core::types::{CatalogItem, ExtractionTask};
	use std::collections::HashMap;

	fn write_config(dir: &std::path::Path) -> PathBuf {
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
scheduler: {{ split_m: 50000.0, interval_days: 5, overwrite: true }}
preparer: {{ patch_size: 1000.0, chunk_size: 128 }}
",
			dir.display()
		);
		std::fs::write(&config_path, yaml).unwrap();
		config_path
	}

	fn item() -> CatalogItem {
		CatalogItem {
			id: "scene-1".into(),
			constellation: Constellation::Sentinel2,
			sensing_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
			footprint: (9.0, 44.0, 11.0, 46.0),
			epsg: 32632,
			cloud_cover: None,
			assets: HashMap::new(),
			properties: None,
		}
	}

	#[test]
	fn test_prepare_creates_archive_groups() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path());
		let cfg = PipelineConfig::load(&config_path).unwrap();

		let tile = Tile::new(32, 'U', 32632, 500_000.0, 5_000_000.0, 501_000.0, 5_001_000.0).unwrap();
		super::super::tile::write_tiles(&cfg.tiles, &[tile.clone()]).unwrap();

		let task = ExtractionTask::new(
			"0",
			vec![tile.clone()],
			vec![item()],
			"B02",
			Constellation::Sentinel2,
			Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
		)
		.unwrap();
		super::super::schedule::write_tasks(&cfg.extraction_tasks, &[task]).unwrap();

		run(&Subcommand { config: config_path, concurrency: 2 }).unwrap();

		let group_root = cfg.archive_root().join(&tile.id).join("sentinel-2");
		assert!(group_root.join("data").exists());
		assert!(group_root.join("timestamps").exists());
	}

	#[test]
	fn test_prepare_is_a_noop_with_no_tasks() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path());
		let cfg = PipelineConfig::load(&config_path).unwrap();

		super::super::tile::write_tiles(&cfg.tiles, &[]).unwrap();
		super::super::schedule::write_tasks(&cfg.extraction_tasks, &[]).unwrap();

		run(&Subcommand { config: config_path, concurrency: 2 }).unwrap();
	}
}
