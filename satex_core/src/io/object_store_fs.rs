//! A local-filesystem-backed [`ObjectStore`], for archives and catalogs that
//! live on disk or a mounted network share.

use super::ObjectStore;
use crate::Blob;
use crate::error::SatexError;
use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// An [`ObjectStore`] rooted at a directory on the local filesystem.
///
/// Matches `DataReaderFile`'s precondition that sources be absolute,
/// existing paths — the pipeline never guesses a relative root.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
	root: PathBuf,
}

impl FsObjectStore {
	/// Opens a filesystem store rooted at `root`.
	///
	/// # Errors
	/// Returns [`SatexError::InvalidArgument`] if `root` is not an absolute,
	/// existing directory.
	pub fn open(root: impl AsRef<Path>) -> Result<Self> {
		let root = root.as_ref();
		ensure!(
			root.is_absolute(),
			SatexError::InvalidArgument(format!("fs object store root must be absolute: {}", root.display()))
		);
		ensure!(
			root.is_dir(),
			SatexError::InvalidArgument(format!("fs object store root does not exist: {}", root.display()))
		);
		Ok(Self { root: root.to_path_buf() })
	}

	fn resolve(&self, url: &str) -> PathBuf {
		let relative = url.strip_prefix("file://").unwrap_or(url);
		self.root.join(relative.trim_start_matches('/'))
	}
}

#[async_trait]
impl ObjectStore for FsObjectStore {
	async fn open(&self, url: &str) -> Result<Blob> {
		let path = self.resolve(url);
		let bytes = tokio::fs::read(&path)
			.await
			.map_err(|e| SatexError::TransientIO(format!("reading {}: {e}", path.display())))?;
		Ok(Blob::from(bytes))
	}

	async fn exists(&self, url: &str) -> Result<bool> {
		Ok(tokio::fs::try_exists(self.resolve(url)).await.unwrap_or(false))
	}

	async fn copy(&self, src: &str, dst: &str) -> Result<()> {
		let src_path = self.resolve(src);
		let dst_path = self.resolve(dst);
		if let Some(parent) = dst_path.parent() {
			tokio::fs::create_dir_all(parent)
				.await
				.with_context(|| format!("creating parent dir for {}", dst_path.display()))?;
		}
		tokio::fs::copy(&src_path, &dst_path)
			.await
			.map_err(|e| SatexError::TransientIO(format!("copying {} -> {}: {e}", src_path.display(), dst_path.display())))?;
		Ok(())
	}

	fn get_name(&self) -> &str {
		"fs"
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_open_and_exists() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
		let store = FsObjectStore::open(dir.path()).unwrap();

		assert!(store.exists("a.txt").await.unwrap());
		assert!(!store.exists("missing.txt").await.unwrap());

		let blob = store.open("a.txt").await.unwrap();
		assert_eq!(blob.as_slice(), b"hello");
	}

	#[tokio::test]
	async fn test_copy_creates_parent_dirs() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
		let store = FsObjectStore::open(dir.path()).unwrap();

		store.copy("a.txt", "nested/b.txt").await.unwrap();
		assert!(store.exists("nested/b.txt").await.unwrap());
	}

	#[test]
	fn test_rejects_relative_root() {
		assert!(FsObjectStore::open("relative/path").is_err());
	}
}
