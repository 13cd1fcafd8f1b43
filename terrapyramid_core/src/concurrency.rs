//! Concurrency limit tuning for the Scheduler's bounded worker pool (spec §4.7, §5).

use num_cpus;

/// Worker-count limits for different kinds of pipeline work, sized from the host's CPU count.
///
/// Aggregation and downsampling units are CPU-bound (warp, Gaussian filter, encode), so the
/// Scheduler sizes its pool from `cpu_bound` rather than the I/O-bound multiplier a network
/// fetcher would use.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimits {
	/// Concurrency for I/O-bound work (plan/sentinel filesystem scans).
	pub io_bound: usize,

	/// Concurrency for CPU-bound work (reproject, merge, encode, downsample).
	pub cpu_bound: usize,

	/// Concurrency for mixed workloads.
	pub mixed: usize,
}

impl ConcurrencyLimits {
	pub fn new(io_bound: usize, cpu_bound: usize, mixed: usize) -> Self {
		Self { io_bound: io_bound.max(1), cpu_bound: cpu_bound.max(1), mixed: mixed.max(1) }
	}

	pub fn cpu_count() -> usize {
		num_cpus::get()
	}
}

impl Default for ConcurrencyLimits {
	/// `W` defaults to the host's CPU count (spec §4.7: "a worker pool of size `W` (typically
	/// CPU count)").
	fn default() -> Self {
		let cpus = num_cpus::get();
		Self { io_bound: cpus * 3, cpu_bound: cpus, mixed: cpus + (cpus / 2) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_worker_count_matches_cpu_count() {
		let limits = ConcurrencyLimits::default();
		assert_eq!(limits.cpu_bound, num_cpus::get());
	}

	#[test]
	fn custom_limits_are_respected() {
		let limits = ConcurrencyLimits::new(12, 4, 8);
		assert_eq!(limits.io_bound, 12);
		assert_eq!(limits.cpu_bound, 4);
		assert_eq!(limits.mixed, 8);
	}

	#[test]
	fn limits_clamp_to_at_least_one() {
		let limits = ConcurrencyLimits::new(0, 0, 0);
		assert_eq!(limits.io_bound, 1);
		assert_eq!(limits.cpu_bound, 1);
		assert_eq!(limits.mixed, 1);
	}
}
