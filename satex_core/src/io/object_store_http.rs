//! An HTTP(S)-backed [`ObjectStore`], for catalog and archive endpoints
//! exposed over plain HTTPS rather than a cloud SDK.
//!
//! Adapted from `DataReaderHttp`, trimmed to the whole-object download this
//! pipeline needs (per-asset range reads happen inside the Extractor via
//! GDAL's own `/vsicurl/` driver, not through this trait).

use super::ObjectStore;
use crate::Blob;
use crate::error::SatexError;
use anyhow::{Result, ensure};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

/// An [`ObjectStore`] that reads from HTTP(S) URLs.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
	client: Client,
}

impl HttpObjectStore {
	/// Builds an HTTP object store with a sensible connect/read timeout.
	pub fn new() -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_secs(60))
			.build()
			.map_err(|e| SatexError::TransientIO(format!("building HTTP client: {e}")))?;
		Ok(Self { client })
	}

	fn parse(url: &str) -> Result<Url> {
		let parsed = Url::parse(url).map_err(|e| SatexError::InvalidArgument(format!("invalid URL '{url}': {e}")))?;
		ensure!(
			matches!(parsed.scheme(), "http" | "https"),
			SatexError::InvalidArgument(format!("unsupported URL scheme in '{url}'"))
		);
		Ok(parsed)
	}
}

impl Default for HttpObjectStore {
	fn default() -> Self {
		Self::new().expect("default reqwest client configuration is always valid")
	}
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
	async fn open(&self, url: &str) -> Result<Blob> {
		let parsed = Self::parse(url)?;
		let response = self
			.client
			.get(parsed)
			.send()
			.await
			.map_err(|e| SatexError::TransientIO(format!("GET {url}: {e}")))?;
		let status = response.status();
		ensure!(
			status.is_success(),
			SatexError::TransientIO(format!("GET {url} returned HTTP {status}"))
		);
		let bytes = response
			.bytes()
			.await
			.map_err(|e| SatexError::TransientIO(format!("reading body of {url}: {e}")))?;
		Ok(Blob::from(bytes.to_vec()))
	}

	async fn exists(&self, url: &str) -> Result<bool> {
		let parsed = Self::parse(url)?;
		let response = self
			.client
			.head(parsed)
			.send()
			.await
			.map_err(|e| SatexError::TransientIO(format!("HEAD {url}: {e}")))?;
		Ok(response.status().is_success())
	}

	async fn copy(&self, _src: &str, _dst: &str) -> Result<()> {
		Err(SatexError::InvalidArgument("HttpObjectStore is read-only; copy is not supported".into()).into())
	}

	fn get_name(&self) -> &str {
		"http"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[tokio::test]
	async fn test_open_success() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/asset.tif"))
			.respond_with(ResponseTemplate::new(200).set_body_bytes(b"raster-bytes".to_vec()))
			.mount(&server)
			.await;

		let store = HttpObjectStore::new().unwrap();
		let blob = store.open(&format!("{}/asset.tif", server.uri())).await.unwrap();
		assert_eq!(blob.as_slice(), b"raster-bytes");
	}

	#[tokio::test]
	async fn test_exists() {
		let server = MockServer::start().await;
		Mock::given(method("HEAD"))
			.and(path("/asset.tif"))
			.respond_with(ResponseTemplate::new(200))
			.mount(&server)
			.await;

		let store = HttpObjectStore::new().unwrap();
		assert!(store.exists(&format!("{}/asset.tif", server.uri())).await.unwrap());
	}

	#[tokio::test]
	async fn test_open_404_is_transient_io() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/missing.tif"))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;

		let store = HttpObjectStore::new().unwrap();
		let err = store.open(&format!("{}/missing.tif", server.uri())).await.unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "TransientIO");
	}

	#[tokio::test]
	async fn test_rejects_non_http_scheme() {
		let store = HttpObjectStore::new().unwrap();
		let err = store.open("ftp://example.com/x").await.unwrap_err();
		assert_eq!(SatexError::downcast(&err).unwrap().kind(), "InvalidArgument");
	}

	#[tokio::test]
	async fn test_copy_unsupported() {
		let store = HttpObjectStore::new().unwrap();
		assert!(store.copy("https://a", "https://b").await.is_err());
	}
}
