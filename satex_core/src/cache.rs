//! A small cache of CRS transform handles.
//!
//! Constructing a [`proj::Proj`] re-parses PROJ's database of coordinate
//! system definitions, which is measurably expensive when the same
//! `(from, to)` pair is requested thousands of times (every Tile's
//! WGS84-round-trip, every Extractor window transform). This mirrors the
//! pipeline's `get_transform_function`/`projection` caches, but backed by a
//! bounded concurrent cache instead of an unbounded one so long-running
//! Worker processes can't grow it without limit.

use anyhow::{Context, Result};
use moka::sync::Cache;
use proj::Proj;
use std::sync::Arc;

/// Caches [`proj::Proj`] transform handles keyed by `(from_crs, to_crs)`.
#[derive(Clone)]
pub struct TransformCache {
	inner: Cache<(String, String), Arc<Proj>>,
}

impl TransformCache {
	/// Creates a cache holding at most `capacity` distinct transform pairs.
	#[must_use]
	pub fn new(capacity: u64) -> Self {
		Self {
			inner: Cache::new(capacity),
		}
	}

	/// Returns a cached transform from `from_crs` to `to_crs`, creating and
	/// caching one if this is the first request for that pair.
	///
	/// CRS identifiers are anything `proj` accepts: `"EPSG:4326"`, `"WGS84"`,
	/// or a PROJ string.
	pub fn get_or_create(&self, from_crs: &str, to_crs: &str) -> Result<Arc<Proj>> {
		let key = (from_crs.to_string(), to_crs.to_string());
		if let Some(proj) = self.inner.get(&key) {
			return Ok(proj);
		}
		let proj = Arc::new(
			Proj::new_known_crs(from_crs, to_crs, None)
				.with_context(|| format!("building transform {from_crs} -> {to_crs}"))?,
		);
		self.inner.insert(key, proj.clone());
		Ok(proj)
	}
}

impl Default for TransformCache {
	/// Five entries by default — matches the number of distinct CRS pairs a
	/// single pipeline run typically needs (one UTM zone in, one out, plus a
	/// couple of asset reprojections).
	fn default() -> Self {
		Self::new(5)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_same_pair_returns_same_instance() {
		let cache = TransformCache::default();
		let a = cache.get_or_create("EPSG:4326", "EPSG:32632").unwrap();
		let b = cache.get_or_create("EPSG:4326", "EPSG:32632").unwrap();
		assert!(Arc::ptr_eq(&a, &b));
	}

	#[test]
	fn test_different_pairs_are_distinct() {
		let cache = TransformCache::default();
		let a = cache.get_or_create("EPSG:4326", "EPSG:32632").unwrap();
		let b = cache.get_or_create("EPSG:4326", "EPSG:32633").unwrap();
		assert!(!Arc::ptr_eq(&a, &b));
	}

	#[test]
	fn test_invalid_crs_errors() {
		let cache = TransformCache::default();
		assert!(cache.get_or_create("not-a-crs", "EPSG:4326").is_err());
	}
}
