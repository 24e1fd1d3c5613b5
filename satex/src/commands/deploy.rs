//! `deploy`: serializes extraction tasks into dispatch envelopes ready for a
//! message bus to push to workers.
//!
//! The message bus itself is out of scope here; this command's job
//! ends at producing the envelopes the bus would publish — one JSON object
//! per line, matching the wire schema `satex_worker::DispatchServer` expects
//! on `POST /tasks`.

use super::schedule::read_tasks;
use anyhow::{Context, Result};
use satex_core::PipelineConfig;
use satex_core::types::DispatchEnvelope;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Path to the pipeline configuration file.
	#[arg(short, long)]
	pub config: PathBuf,

	/// Where to write the newline-delimited JSON envelopes. Defaults to
	/// `{dataset_name}_envelopes.jsonl` next to the extraction tasks file.
	#[arg(long)]
	pub out: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let cfg = PipelineConfig::load(&arguments.config)?;
	let tasks = read_tasks(&cfg.extraction_tasks)?;

	let out_path = arguments
		.out
		.clone()
		.unwrap_or_else(|| cfg.extraction_tasks.with_file_name(format!("{}_envelopes.jsonl", cfg.dataset_name)));

	let job_id = format!("{}-{}", cfg.project, cfg.dataset_name);
	let storage_gs_path = cfg.archive_root().display().to_string();
	let chunk_size = cfg.preparer.chunk_size;

	let mut lines = String::new();
	for task in tasks {
		let bands = task.constellation.bands().into_iter().map(|b| b.name).collect();
		let envelope = DispatchEnvelope {
			storage_gs_path: storage_gs_path.clone(),
			job_id: job_id.clone(),
			extraction_task: task,
			bands,
			chunks: [1, 1, chunk_size, chunk_size],
		};
		lines.push_str(&serde_json::to_string(&envelope)?);
		lines.push('\n');
	}

	if let Some(parent) = out_path.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	std::fs::write(&out_path, lines).with_context(|| format!("writing {}", out_path.display()))?;

	log::info!("wrote dispatch envelopes to {}", out_path.display());
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use satex_core::types::{CatalogItem, Constellation, ExtractionTask, Tile};
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

	fn sample_task() -> ExtractionTask {
		let tile = Tile::new(32, 'U', 32632, 500_000.0, 5_000_000.0, 501_000.0, 5_001_000.0).unwrap();
		let item = CatalogItem {
			id: "scene-1".into(),
			constellation: Constellation::Sentinel2,
			sensing_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
			footprint: (9.0, 44.0, 11.0, 46.0),
			epsg: 32632,
			cloud_cover: None,
			assets: HashMap::new(),
			properties: None,
		};
		ExtractionTask::new("0", vec![tile], vec![item], "B02", Constellation::Sentinel2, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()).unwrap()
	}

	#[test]
	fn test_deploy_writes_one_envelope_per_line() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path());
		let cfg = PipelineConfig::load(&config_path).unwrap();

		super::super::schedule::write_tasks(&cfg.extraction_tasks, &[sample_task(), sample_task()]).unwrap();

		run(&Subcommand { config: config_path, out: None }).unwrap();

		let out_path = cfg.extraction_tasks.with_file_name("demo_envelopes.jsonl");
		let contents = std::fs::read_to_string(out_path).unwrap();
		assert_eq!(contents.lines().count(), 2);
		let first: DispatchEnvelope = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
		assert_eq!(first.chunks, [1, 1, 128, 128]);
	}

	#[test]
	fn test_deploy_respects_explicit_out_path() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path());
		let cfg = PipelineConfig::load(&config_path).unwrap();
		super::super::schedule::write_tasks(&cfg.extraction_tasks, &[sample_task()]).unwrap();

		let out_path = dir.path().join("custom.jsonl");
		run(&Subcommand { config: config_path, out: Some(out_path.clone()) }).unwrap();
		assert!(out_path.exists());
	}
}
