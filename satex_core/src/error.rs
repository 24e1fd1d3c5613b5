//! The pipeline's error taxonomy.
//!
//! Every public function returns `anyhow::Result<T>`; call sites that need to
//! branch on *kind* (the Worker's HTTP status mapping, the Scheduler's
//! "not an error" handling of an empty catalog) downcast with
//! [`SatexError::downcast`] or `error.downcast_ref::<SatexError>()` directly.

use thiserror::Error;

/// The pipeline's typed error taxonomy.
#[derive(Error, Debug)]
pub enum SatexError {
	/// Caller-supplied configuration violates a precondition: a non-square
	/// `bbox_size`, an unknown constellation/band, `overwrite=false` with no
	/// `archive_root`, and similar.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// A network read or write failed. Recoverable by retry at the task level.
	#[error("transient I/O error: {0}")]
	TransientIO(String),

	/// A source asset or an archive array is malformed.
	#[error("data corruption: {0}")]
	DataCorruption(String),

	/// The Storer could not locate an expected band or timestamp slot — the
	/// Preparer was skipped or the archive was mutated out-of-band.
	#[error("archive inconsistency: {0}")]
	ArchiveInconsistency(String),

	/// The Scheduler found no catalog items intersecting the region for some
	/// `(constellation, bucket)`. Not fatal — callers should treat this as
	/// "zero tasks for this bucket", not propagate it as a failure.
	#[error("catalog empty: {0}")]
	CatalogEmpty(String),
}

impl SatexError {
	/// A short, stable tag for this error kind, used in log lines and the
	/// Worker's status payloads.
	#[must_use]
	pub fn kind(&self) -> &'static str {
		match self {
			SatexError::InvalidArgument(_) => "InvalidArgument",
			SatexError::TransientIO(_) => "TransientIO",
			SatexError::DataCorruption(_) => "DataCorruption",
			SatexError::ArchiveInconsistency(_) => "ArchiveInconsistency",
			SatexError::CatalogEmpty(_) => "CatalogEmpty",
		}
	}

	/// Whether this error kind should trigger bus-level redelivery (maps to
	/// HTTP 5xx in the Worker) as opposed to a permanent failure (4xx/dead-letter).
	#[must_use]
	pub fn is_retryable(&self) -> bool {
		matches!(self, SatexError::TransientIO(_))
	}

	/// Finds a `SatexError` anywhere in an `anyhow::Error`'s cause chain.
	#[must_use]
	pub fn downcast(err: &anyhow::Error) -> Option<&SatexError> {
		err.chain().find_map(|cause| cause.downcast_ref::<SatexError>())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kind_tags() {
		assert_eq!(SatexError::InvalidArgument("x".into()).kind(), "InvalidArgument");
		assert_eq!(SatexError::CatalogEmpty("x".into()).kind(), "CatalogEmpty");
	}

	#[test]
	fn test_retryable() {
		assert!(SatexError::TransientIO("timeout".into()).is_retryable());
		assert!(!SatexError::DataCorruption("bad header".into()).is_retryable());
	}

	#[test]
	fn test_downcast_through_anyhow_context() {
		let err: anyhow::Error = anyhow::Error::new(SatexError::ArchiveInconsistency("missing band".into()))
			.context("while storing patch");
		let found = SatexError::downcast(&err).expect("should find SatexError in chain");
		assert_eq!(found.kind(), "ArchiveInconsistency");
	}
}
