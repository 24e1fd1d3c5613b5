//! `serve`: launches the Worker's HTTP dispatch server.
//!
//! Not one of the original `build | stac | tile | schedule | prepare |
//! deploy` task names — that list describes the offline pipeline stages,
//! not how the always-on Worker process gets started. Repurposes the same
//! `serve` subcommand shape VersaTiles uses to launch
//! `satex_worker::DispatchServer` instead of a tile server.

use anyhow::Result;
use satex_core::PipelineConfig;
use satex_extractor::MosaicMethod;
use satex_worker::{DispatchServer, HttpMonitorSink, LogDeadLetterSink, LogMonitorSink, MonitorSink};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Path to the pipeline configuration file.
	#[arg(short, long)]
	pub config: PathBuf,

	/// Serve via socket ip.
	#[arg(short = 'i', long, default_value = "0.0.0.0")]
	pub ip: String,

	/// Serve via port.
	#[arg(short, long, default_value_t = 8080)]
	pub port: u16,

	/// Resolution (ground sample distance, in meters) extraction runs at.
	#[arg(long, default_value_t = 10.0)]
	pub resolution: f64,

	/// Mosaic merge method for overlapping source assets.
	#[arg(long, default_value = "first")]
	pub mosaic: String,

	/// HTTP endpoint status events are posted to. Falls back to logging
	/// when unset, matching the `MONITOR_TABLE` env var's absence.
	#[arg(long, env = "MONITOR_TABLE")]
	pub monitor_endpoint: Option<String>,

	/// Shut down automatically after this many milliseconds (tests only).
	#[arg(long)]
	pub auto_shutdown: Option<u64>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let cfg = PipelineConfig::load(&arguments.config)?;
	let method = MosaicMethod::parse(&arguments.mosaic)?;
	let monitor: Arc<dyn MonitorSink> = match &arguments.monitor_endpoint {
		Some(endpoint) => Arc::new(HttpMonitorSink::new(endpoint.clone())),
		None => Arc::new(LogMonitorSink),
	};

	let mut server = DispatchServer::new(
		arguments.ip.clone(),
		arguments.port,
		cfg.archive_root(),
		arguments.resolution,
		method,
		monitor,
		Arc::new(LogDeadLetterSink),
	);
	server.start().await?;
	log::info!("worker dispatch server listening on {}:{}", arguments.ip, server.port());

	if let Some(milliseconds) = arguments.auto_shutdown {
		sleep(Duration::from_millis(milliseconds)).await;
	} else {
		loop {
			sleep(Duration::from_secs(60)).await;
		}
	}

	server.stop().await;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

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

	#[test]
	fn test_serve_starts_and_shuts_down_automatically() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path());

		run(&Subcommand {
			config: config_path,
			ip: "127.0.0.1".into(),
			port: 0,
			resolution: 10.0,
			mosaic: "first".into(),
			monitor_endpoint: None,
			auto_shutdown: Some(20),
		})
		.unwrap();
	}

	#[test]
	fn test_serve_rejects_unknown_mosaic_method() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = write_config(dir.path());

		let err = run(&Subcommand {
			config: config_path,
			ip: "127.0.0.1".into(),
			port: 0,
			resolution: 10.0,
			mosaic: "nope".into(),
			monitor_endpoint: None,
			auto_shutdown: Some(0),
		})
		.unwrap_err();
		assert!(err.to_string().contains("nope"));
	}
}
