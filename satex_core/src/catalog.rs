//! The Catalog collaborator: "discovers which source scenes cover the
//! region" is explicitly an external concern, so this crate only fixes
//! the interface and ships one reference implementation that reads a
//! pre-fetched item collection from disk — the same fallback path the
//! original's `scheduler.py`/`cli.py` take when no live STAC API is
//! configured (`pystac.ItemCollection.from_file`).

use crate::error::SatexError;
use crate::types::{CatalogItem, Constellation};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Queries scenes covering a region and time range. Implementations may hit
/// a live STAC API, a local file, or anything else — the pipeline only
/// depends on this contract.
pub trait Catalog {
	/// Returns every item of `constellation` whose footprint intersects
	/// `region` (WGS84 `(min_lon, min_lat, max_lon, max_lat)`) and whose
	/// `sensing_time` falls within `[start, end]`.
	fn query(&self, region: (f64, f64, f64, f64), start: DateTime<Utc>, end: DateTime<Utc>, constellation: Constellation) -> Result<Vec<CatalogItem>>;
}

/// A `Catalog` backed by a STAC-like GeoJSON `ItemCollection` file, already
/// materialized on disk by an external fetch step.
pub struct StacCatalog {
	items: Vec<CatalogItem>,
}

impl StacCatalog {
	/// Loads an item collection from a JSON file holding a bare array of
	/// [`CatalogItem`] values (the shape this pipeline's `stac` task writes).
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).with_context(|| format!("reading item collection {}", path.display()))?;
		let items: Vec<CatalogItem> =
			serde_json::from_str(&raw).with_context(|| format!("parsing item collection {}", path.display()))?;
		Ok(Self { items })
	}

	#[must_use]
	pub fn from_items(items: Vec<CatalogItem>) -> Self {
		Self { items }
	}
}

impl Catalog for StacCatalog {
	fn query(&self, region: (f64, f64, f64, f64), start: DateTime<Utc>, end: DateTime<Utc>, constellation: Constellation) -> Result<Vec<CatalogItem>> {
		let matches: Vec<CatalogItem> = self
			.items
			.iter()
			.filter(|item| item.constellation == constellation)
			.filter(|item| item.sensing_time >= start && item.sensing_time <= end)
			.filter(|item| item.intersects(region))
			.cloned()
			.collect();

		if matches.is_empty() {
			return Err(SatexError::CatalogEmpty(format!(
				"no {constellation:?} items intersect region {region:?} in [{start}, {end}]"
			))
			.into());
		}
		Ok(matches)
	}
}
