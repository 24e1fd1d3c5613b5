//! The object-store filesystem abstraction: `open`, `get_mapper`, `exists`,
//! `copy`, backed by any HTTPS-addressable blob store or the local
//! filesystem.
//!
//! Adapted from `DataReaderTrait` (an async-trait interface over byte
//! sources) and generalized to the full contract this pipeline needs,
//! using the `object_store` crate for the actual backend I/O instead of
//! hand-rolled readers per source type.

mod object_store_fs;
mod object_store_http;

pub use object_store_fs::FsObjectStore;
pub use object_store_http::HttpObjectStore;

use crate::Blob;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// A handle scoped to a prefix within an [`ObjectStore`], used to hand the
/// Archive Preparer/Storer a root path for the zarr-backed archive without
/// exposing the whole store.
#[derive(Debug, Clone)]
pub struct StoreMapper {
	pub root: String,
}

impl StoreMapper {
	/// Joins a relative path onto this mapper's root.
	#[must_use]
	pub fn join(&self, relative: &str) -> String {
		format!("{}/{}", self.root.trim_end_matches('/'), relative.trim_start_matches('/'))
	}
}

/// An abstraction over a blob store: local filesystem, HTTP(S), or (via the
/// `object_store` crate's optional backends) cloud object storage.
#[async_trait]
pub trait ObjectStore: Debug + Send + Sync {
	/// Downloads the full contents of `url`.
	async fn open(&self, url: &str) -> Result<Blob>;

	/// Returns a handle scoped to `prefix`, for components (like the zarr
	/// archive) that need a root path rather than single-blob access.
	fn get_mapper(&self, prefix: &str) -> StoreMapper {
		StoreMapper { root: prefix.to_string() }
	}

	/// Whether `url` names an existing object.
	async fn exists(&self, url: &str) -> Result<bool>;

	/// Copies an object from `src` to `dst` within this store.
	async fn copy(&self, src: &str, dst: &str) -> Result<()>;

	/// A short name for logging (e.g. `"fs"`, `"http"`).
	fn get_name(&self) -> &str;
}
