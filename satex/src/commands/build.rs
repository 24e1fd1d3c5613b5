//! `build`: runs `stac`, `tile`, `schedule`, and `prepare` in sequence
//! against one config, so a fresh dataset can be brought from "nothing on
//! disk" to "archive ready for extraction tasks to be dispatched" in one
//! invocation.
//!
//! The original's `builder(cfg)` task delegates to a separately configured,
//! pluggable `cfg.builder._target_` whose responsibilities are never pinned
//! down anywhere else in that codebase; this implementation resolves that
//! open question by making `build` the composite of the other offline
//! stages, since the CLI's tasks are meant to be runnable singly or
//! composed.

use super::{prepare, schedule, stac, tile};
use anyhow::Result;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Path to the pipeline configuration file.
	#[arg(short, long)]
	pub config: PathBuf,

	/// Path to a JSON array of catalog items, forwarded to `stac` if the
	/// item collection doesn't already exist.
	#[arg(long)]
	pub items: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	stac::run(&stac::Subcommand { config: arguments.config.clone(), items: arguments.items.clone() })?;
	tile::run(&tile::Subcommand { config: arguments.config.clone() })?;
	schedule::run(&schedule::Subcommand { config: arguments.config.clone(), concurrency: num_cpus::get() })?;
	prepare::run(&prepare::Subcommand { config: arguments.config.clone(), concurrency: num_cpus::get() })?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use satex_core::PipelineConfig;

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

	/// Every stage short-circuits when its output already exists, so a
	/// `build` over an already-built (here: trivially empty) dataset is a
	/// single pass that touches nothing and still succeeds.
	#[test]
	fn test_build_is_a_noop_once_every_stage_output_exists() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path());
		let cfg = PipelineConfig::load(&config_path).unwrap();

		std::fs::write(&cfg.item_collection, "[]").unwrap();
		std::fs::write(&cfg.tiles, "[]").unwrap();
		std::fs::write(&cfg.extraction_tasks, "[]").unwrap();

		run(&Subcommand { config: config_path, items: None }).unwrap();
	}
}
