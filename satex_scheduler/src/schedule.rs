//! Extraction task creation and idempotent filtering.
//!
//! Grounded in `create_tasks_by_splits`/`get_cluster_items_indexes`/
//! `filter_already_extracted_tasks`: for every `(constellation, revisit
//! bucket, cluster)`, narrow the bucket's items to those intersecting the
//! cluster's tiles, keep the tiles fully covered by the union of that
//! narrowed set, and emit one [`ExtractionTask`] per band from them. Tasks
//! never span more than one cluster, bounding how many tiles and items a
//! single task carries.

use crate::cluster::{cluster_tiles_in_utm, tile_bbox_wgs84};
use crate::dates::get_dates_in_range;
use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use satex_core::cache::TransformCache;
use satex_core::concurrency::parallel_map;
use satex_core::types::{CatalogItem, Constellation, ExtractionTask, Tile};
use std::collections::BTreeMap;

/// Looks up sensing timestamps already present in the archive for a tile's
/// constellation, so the Scheduler can skip tasks already extracted.
///
/// Implemented by the archive crate (the owner of the on-disk layout); kept
/// here as a trait so the Scheduler doesn't depend on the archive's storage
/// backend, mirroring the `DataReaderTrait`-style seam between a consumer
/// and its storage implementation.
pub trait ExtractedTimestamps {
	fn existing_timestamps(&self, tile_id: &str, constellation: Constellation) -> Result<Vec<chrono::DateTime<Utc>>>;
}

/// Parameters for a single scheduling run.
pub struct ScheduleParams<'a> {
	pub tiles: &'a [Tile],
	pub items: &'a [CatalogItem],
	pub constellations: &'a [Constellation],
	pub split_m: f64,
	pub interval_days: i64,
	pub overwrite: bool,
	pub io_concurrency: usize,
}

/// Builds the full set of extraction tasks for a scheduling run.
pub fn create_tasks_by_splits(params: &ScheduleParams, cache: &TransformCache, archive: Option<&dyn ExtractedTimestamps>) -> Result<Vec<ExtractionTask>> {
	let clustered = cluster_tiles_in_utm(params.tiles, params.split_m, cache).context("clustering tiles")?;
	let clusters = group_by_cluster(&clustered);

	let mut tasks = Vec::new();
	let mut task_tracker: u64 = 0;

	for &constellation in params.constellations {
		let constellation_items: Vec<&CatalogItem> = params.items.iter().filter(|item| item.constellation == constellation).collect();
		let Some((min, max)) = sensing_time_bounds(&constellation_items) else {
			log::warn!("no catalog items for constellation {constellation}, skipping");
			continue;
		};
		let buckets = get_dates_in_range(min, max, params.interval_days)?;
		let bands: Vec<String> = constellation.bands().into_iter().map(|b| b.name).collect();

		for (start, end) in buckets {
			let bucket_items: Vec<&CatalogItem> = constellation_items
				.iter()
				.filter(|item| {
					let day = item.sensing_time.date_naive();
					day >= start && day < end
				})
				.copied()
				.collect();
			if bucket_items.is_empty() {
				continue;
			}

			let sensing_time = Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap());

			for cluster_tiles in clusters.values() {
				let cluster_items = items_intersecting_tiles(cluster_tiles, &bucket_items, cache)?;
				if cluster_items.is_empty() {
					continue;
				}

				let region_tiles = tiles_fully_covered(cluster_tiles, &cluster_items, cache)?;
				if region_tiles.is_empty() {
					continue;
				}

				let item_collection: Vec<CatalogItem> = cluster_items.into_iter().cloned().collect();

				for band in &bands {
					tasks.push(ExtractionTask::new(
						task_tracker.to_string(),
						region_tiles.clone(),
						item_collection.clone(),
						band.clone(),
						constellation,
						sensing_time,
					)?);
					task_tracker += 1;
				}
			}
		}
	}

	log::info!("{} tasks created", tasks.len());

	if !params.overwrite {
		let Some(archive) = archive else {
			anyhow::bail!(satex_core::error::SatexError::InvalidArgument(
				"overwrite=false requires an archive to check for already-extracted tasks".into()
			));
		};
		let before = tasks.len();
		tasks = filter_already_extracted_tasks(tasks, archive, params.io_concurrency);
		log::info!("{} tasks filtered because they already exist in storage", before - tasks.len());
	}

	Ok(tasks)
}

fn sensing_time_bounds(items: &[&CatalogItem]) -> Option<(NaiveDate, NaiveDate)> {
	let dates = items.iter().map(|item| item.sensing_time.date_naive());
	dates.clone().min().zip(dates.max())
}

/// Groups tiles by `cluster_id`, preserving `None` (unclustered) as its own
/// group — mirrors `get_cluster_items_indexes` grouping tiles per cluster
/// before the per-cluster item/task pass.
fn group_by_cluster(tiles: &[Tile]) -> BTreeMap<Option<u64>, Vec<Tile>> {
	let mut groups: BTreeMap<Option<u64>, Vec<Tile>> = BTreeMap::new();
	for tile in tiles {
		groups.entry(tile.cluster_id).or_default().push(tile.clone());
	}
	groups
}

/// The subset of a bucket's items whose footprint intersects at least one of
/// the cluster's tiles — the per-cluster `item_collection` a task is built
/// from, not the whole bucket's items.
fn items_intersecting_tiles<'a>(tiles: &[Tile], items: &[&'a CatalogItem], cache: &TransformCache) -> Result<Vec<&'a CatalogItem>> {
	let mut tile_bboxes = Vec::with_capacity(tiles.len());
	for tile in tiles {
		tile_bboxes.push(tile_bbox_wgs84(tile, cache)?);
	}
	Ok(items.iter().copied().filter(|item| tile_bboxes.iter().any(|&bbox| item.intersects(bbox))).collect())
}

/// Tiles whose footprint lies fully within the union of the cluster's items
/// — every band of an extraction task must be covered by the union of item
/// footprints, not by any single item alone.
fn tiles_fully_covered(tiles: &[Tile], items: &[&CatalogItem], cache: &TransformCache) -> Result<Vec<Tile>> {
	let footprints: Vec<(f64, f64, f64, f64)> = items.iter().map(|item| item.footprint).collect();
	let mut covered = Vec::new();
	for tile in tiles {
		let bbox_wgs84 = tile_bbox_wgs84(tile, cache)?;
		if bbox_covered_by_union(bbox_wgs84, &footprints) {
			covered.push(tile.clone());
		}
	}
	Ok(covered)
}

/// Whether `bbox` is fully covered by the union of `footprints`, without
/// building any polygon geometry: overlay the grid of x/y cut lines induced
/// by `bbox` and every footprint, then check that the midpoint of every
/// overlay cell inside `bbox` falls within at least one footprint. Any gap
/// in the union must leave some overlay cell uncovered, since the cut lines
/// already separate the footprints' boundaries from each other.
fn bbox_covered_by_union(bbox: (f64, f64, f64, f64), footprints: &[(f64, f64, f64, f64)]) -> bool {
	let (x0, y0, x1, y1) = bbox;
	if x0 >= x1 || y0 >= y1 {
		return false;
	}
	let relevant: Vec<&(f64, f64, f64, f64)> = footprints.iter().filter(|f| rects_intersect(bbox, **f)).collect();
	if relevant.is_empty() {
		return false;
	}

	let mut xs: Vec<f64> = vec![x0, x1];
	let mut ys: Vec<f64> = vec![y0, y1];
	for &(fx0, fy0, fx1, fy1) in &relevant {
		for x in [fx0, fx1] {
			if x > x0 && x < x1 {
				xs.push(x);
			}
		}
		for y in [fy0, fy1] {
			if y > y0 && y < y1 {
				ys.push(y);
			}
		}
	}
	xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
	xs.dedup();
	ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
	ys.dedup();

	for xi in 0..xs.len().saturating_sub(1) {
		let mx = (xs[xi] + xs[xi + 1]) / 2.0;
		for yi in 0..ys.len().saturating_sub(1) {
			let my = (ys[yi] + ys[yi + 1]) / 2.0;
			if !relevant.iter().any(|&&(fx0, fy0, fx1, fy1)| mx >= fx0 && mx <= fx1 && my >= fy0 && my <= fy1) {
				return false;
			}
		}
	}
	true
}

fn rects_intersect(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
	let (a_x0, a_y0, a_x1, a_y1) = a;
	let (b_x0, b_y0, b_x1, b_y1) = b;
	a_x0 < b_x1 && a_x1 > b_x0 && a_y0 < b_y1 && a_y1 > b_y0
}

/// Drops tasks whose `sensing_time` is already recorded for their tiles.
fn filter_already_extracted_tasks(tasks: Vec<ExtractionTask>, archive: &dyn ExtractedTimestamps, concurrency: usize) -> Vec<ExtractionTask> {
	let checked = parallel_map(tasks, concurrency, |task| {
		let first_tile = &task.tiles[0];
		let already_extracted = archive
			.existing_timestamps(&first_tile.id, task.constellation)
			.map(|dates| dates.contains(&task.sensing_time))
			.unwrap_or(false);
		(task, already_extracted)
	});
	checked.into_iter().filter_map(|(task, done)| (!done).then_some(task)).collect()
}
