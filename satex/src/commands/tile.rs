//! `tile`: partitions the region of interest into the UTM tile grid.

use anyhow::{Context, Result};
use satex_core::PipelineConfig;
use satex_core::cache::TransformCache;
use satex_core::types::Tile;
use satex_geometry::{read_region_of_interest, split_region_in_utm_tiles};
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Path to the pipeline configuration file.
	#[arg(short, long)]
	pub config: PathBuf,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let cfg = PipelineConfig::load(&arguments.config)?;

	if cfg.tiles.exists() {
		log::info!("tile set already exists at {}, skipping", cfg.tiles.display());
		return Ok(());
	}

	let region = read_region_of_interest(&cfg.gpd_input)?;
	let cache = TransformCache::default();
	let tiles = split_region_in_utm_tiles(&region, cfg.tiler.bbox_size, &cache)?;

	log::info!("generated {} tiles", tiles.len());

	write_tiles(&cfg.tiles, &tiles)?;
	Ok(())
}

pub fn write_tiles(path: &PathBuf, tiles: &[Tile]) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	std::fs::write(path, serde_json::to_string(tiles)?).with_context(|| format!("writing {}", path.display()))
}

pub fn read_tiles(path: &PathBuf) -> Result<Vec<Tile>> {
	let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	serde_json::from_str(&raw).with_context(|| format!("parsing tiles from {}", path.display()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tile_writes_nonempty_set() {
		let dir = tempfile::tempdir().unwrap();
		let region_path = dir.path().join("region.geojson");
		std::fs::write(
			&region_path,
			r#"{"type":"Polygon","coordinates":[[[11.0,48.0],[11.01,48.0],[11.01,48.01],[11.0,48.01],[11.0,48.0]]]}"#,
		)
		.unwrap();

		let config_path = dir.path().join("config.yml");
		std::fs::write(
			&config_path,
			format!(
				r"
project: satex-demo
user_id: alice
dataset_name: demo
storage_root: {0}/archive
start_date: 2024-01-01
end_date: 2024-02-01
constellations: [sentinel-2]
gpd_input: {1}
item_collection: {0}/items.json
tiles: {0}/tiles.json
extraction_tasks: {0}/tasks.json
tiler: {{ bbox_size: 1000.0 }}
scheduler: {{ split_m: 10000.0, interval_days: 5, overwrite: false }}
preparer: {{ patch_size: 1000.0, chunk_size: 256 }}
",
				dir.path().display(),
				region_path.display()
			),
		)
		.unwrap();

		run(&Subcommand { config: config_path.clone() }).unwrap();

		let cfg = PipelineConfig::load(&config_path).unwrap();
		let tiles = read_tiles(&cfg.tiles).unwrap();
		assert!(!tiles.is_empty());
	}
}
