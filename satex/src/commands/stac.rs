//! `stac`: validates an externally-fetched item collection into the path
//! the rest of the pipeline reads from.
//!
//! The catalog query backend itself (the thing that actually talks to a
//! STAC API or a cloud bucket index) is an external collaborator this
//! pipeline only specifies an interface for; this command's job is the part
//! that remains in-process: parse the fetched collection, check every item
//! is well-formed, and write it to `item_collection` — the same
//! already-exists short-circuit the original's `cli.py::stac` uses.

use anyhow::{Context, Result};
use satex_core::PipelineConfig;
use satex_core::types::CatalogItem;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Path to the pipeline configuration file.
	#[arg(short, long)]
	pub config: PathBuf,

	/// Path to a JSON array of catalog items already fetched by an external
	/// catalog backend. Required the first time this dataset's item
	/// collection is built.
	#[arg(long)]
	pub items: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let cfg = PipelineConfig::load(&arguments.config)?;

	if cfg.item_collection.exists() {
		log::info!("item collection already exists at {}, skipping", cfg.item_collection.display());
		return Ok(());
	}

	let items_path = arguments
		.items
		.as_ref()
		.context("--items <PATH> is required to build the item collection the first time")?;
	let raw = std::fs::read_to_string(items_path).with_context(|| format!("reading {}", items_path.display()))?;
	let items: Vec<CatalogItem> = serde_json::from_str(&raw).with_context(|| format!("parsing catalog items from {}", items_path.display()))?;

	log::info!("validated {} catalog items", items.len());

	if let Some(parent) = cfg.item_collection.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	let serialized = serde_json::to_string(&items)?;
	std::fs::write(&cfg.item_collection, serialized).with_context(|| format!("writing {}", cfg.item_collection.display()))?;

	Ok(())
}
