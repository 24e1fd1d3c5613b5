//! Concurrency limit tuning for optimal I/O and CPU performance
//!
//! This module provides optimized concurrency limits based on workload type:
//! - **I/O-bound**: Network/disk operations benefit from 2-4x CPU count
//! - **CPU-bound**: Computation limited to 1x CPU count
//! - **Mixed**: Balanced workload at 1.5x CPU count
//!
//! # Usage
//!
//! ```
//! use satex_core::ConcurrencyLimits;
//!
//! let limits = ConcurrencyLimits::default();
//!
//! // For I/O-bound operations (network, disk)
//! let io_limit = limits.io_bound;
//!
//! // For CPU-bound operations (image processing, compression)
//! let cpu_limit = limits.cpu_bound;
//!
//! // For mixed workloads
//! let mixed_limit = limits.mixed;
//!
//! assert!(io_limit > cpu_limit);  // I/O should be higher than CPU
//! ```

use num_cpus;

/// Optimized concurrency limits for different workload types
///
/// These limits are based on empirical testing and provide optimal
/// throughput for different operation characteristics.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimits {
	/// Concurrency for I/O-bound operations (network, disk reads/writes)
	///
	/// Set to 3x CPU count because I/O operations spend most time waiting,
	/// allowing high parallelism without CPU saturation.
	pub io_bound: usize,

	/// Concurrency for CPU-bound operations (image processing, compression)
	///
	/// Set to 1x CPU count to avoid context switching overhead and
	/// ensure optimal CPU utilization without thrashing.
	pub cpu_bound: usize,

	/// Concurrency for mixed workloads (both I/O and CPU)
	///
	/// Set to 1.5x CPU count as a balanced middle ground between
	/// I/O parallelism and CPU efficiency.
	pub mixed: usize,
}

impl ConcurrencyLimits {
	/// Create concurrency limits with custom values
	///
	/// # Arguments
	///
	/// * `io_bound` - Limit for I/O-bound operations
	/// * `cpu_bound` - Limit for CPU-bound operations
	/// * `mixed` - Limit for mixed workloads
	pub fn new(io_bound: usize, cpu_bound: usize, mixed: usize) -> Self {
		Self {
			io_bound: io_bound.max(1),
			cpu_bound: cpu_bound.max(1),
			mixed: mixed.max(1),
		}
	}

	/// Get the number of logical CPUs available
	pub fn cpu_count() -> usize {
		num_cpus::get()
	}
}

impl Default for ConcurrencyLimits {
	/// Create default concurrency limits based on available CPU count
	///
	/// - I/O-bound: 3x CPU count
	/// - CPU-bound: 1x CPU count
	/// - Mixed: 1.5x CPU count
	fn default() -> Self {
		let cpus = num_cpus::get();
		Self {
			io_bound: cpus * 3,
			cpu_bound: cpus,
			mixed: cpus + (cpus / 2),
		}
	}
}

/// Applies `f` to every item of `items`, spreading the work across up to
/// `limit` OS threads, and returns results in the original order.
///
/// This is the pipeline's single parallel-map primitive: the Scheduler uses
/// it for per-`(constellation, bucket)` catalog intersection and the Archive
/// Preparer uses it for per-`(tile, constellation)` archive preparation —
/// both are "apply f to each element of an independent set and collect
/// results" with no shared mutable state beyond the result collection.
pub fn parallel_map<T, R, F>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
	T: Send,
	R: Send,
	F: Fn(T) -> R + Send + Sync,
{
	let limit = limit.max(1).min(items.len().max(1));
	let queue = std::sync::Mutex::new(items.into_iter().enumerate().collect::<Vec<_>>());
	let results = std::sync::Mutex::new(Vec::new());

	std::thread::scope(|scope| {
		for _ in 0..limit {
			scope.spawn(|| {
				loop {
					let next = queue.lock().unwrap().pop();
					match next {
						Some((idx, item)) => {
							let value = f(item);
							results.lock().unwrap().push((idx, value));
						}
						None => break,
					}
				}
			});
		}
	});

	let mut results = results.into_inner().unwrap();
	results.sort_by_key(|(idx, _)| *idx);
	results.into_iter().map(|(_, value)| value).collect()
}
