//! Bounded dispatch of dirty work units onto `tokio::task::spawn_blocking` workers (spec §4.7
//! "Concurrency model", §11 "Process-vs-thread worker pool"): each unit is self-contained on
//! disk, so workers share no in-process mutable state beyond the semaphore bounding how many
//! run at once.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use terrapyramid_core::{TileId, is_interrupted};
use terrapyramid_pipeline::run_aggregation;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::diff::DirtyUnit;

/// Outcome of dispatching one work unit: failures are logged and counted, never panicked on,
/// so one bad macrotile doesn't take down the run (spec §4.7 "Cancellation / interruption").
pub struct DispatchReport {
	pub succeeded: usize,
	pub failed: usize,
	pub interrupted: bool,
}

/// Runs Aggregation for every unit in `dirty`, at most `workers` concurrently. Stops
/// launching new units once `cancel` is observed set (e.g. from a SIGINT handler), letting
/// in-flight units finish so their sentinels stay consistent.
pub async fn dispatch_aggregation(
	dirty: Vec<DirtyUnit>,
	store_dir: PathBuf,
	sources_root: PathBuf,
	snapshot_dir: PathBuf,
	workers: usize,
	cancel: Arc<AtomicBool>,
) -> Result<DispatchReport> {
	let semaphore = Arc::new(Semaphore::new(workers.max(1)));
	let mut tasks = JoinSet::new();
	let mut report = DispatchReport { succeeded: 0, failed: 0, interrupted: false };

	for unit in dirty {
		if cancel.load(Ordering::SeqCst) {
			report.interrupted = true;
			break;
		}

		let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
		let store_dir = store_dir.clone();
		let sources_root = sources_root.clone();
		let snapshot_dir = snapshot_dir.clone();

		tasks.spawn_blocking(move || {
			let _permit = permit;
			let result = run_aggregation(&snapshot_dir, &store_dir, &sources_root, &unit.key);
			(unit, result)
		});
	}

	while let Some(joined) = tasks.join_next().await {
		let (unit, result) = joined.expect("aggregation worker task panicked");
		match result {
			Ok(()) => {
				report.succeeded += 1;
				log::info!("{}: aggregation complete", unit.key.stem());
			}
			Err(err) if is_interrupted(&err) => {
				report.interrupted = true;
				log::warn!("{}: aggregation interrupted", unit.key.stem());
			}
			Err(err) => {
				report.failed += 1;
				log::error!("{}: aggregation failed: {err:#}", unit.key.stem());
			}
		}
	}

	Ok(report)
}

/// Runs Downsampling level by level (finest to coarsest), each level's tiles dispatched
/// concurrently up to `workers`, so every tile at a level already has its four children on
/// disk before it is attempted (spec §4.7 "Ordering guarantees").
pub async fn dispatch_downsampling(
	levels: Vec<Vec<TileId>>,
	store_dir: PathBuf,
	snapshot_dir: PathBuf,
	workers: usize,
	cancel: Arc<AtomicBool>,
) -> Result<DispatchReport> {
	let semaphore = Arc::new(Semaphore::new(workers.max(1)));
	let mut report = DispatchReport { succeeded: 0, failed: 0, interrupted: false };

	for level in levels {
		if cancel.load(Ordering::SeqCst) {
			report.interrupted = true;
			break;
		}

		let mut tasks = JoinSet::new();
		for tile in level {
			let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
			let store_dir = store_dir.clone();
			let snapshot_dir = snapshot_dir.clone();
			tasks.spawn_blocking(move || {
				let _permit = permit;
				let result = terrapyramid_pipeline::downsample_tile(&store_dir, &snapshot_dir, tile);
				(tile, result)
			});
		}

		while let Some(joined) = tasks.join_next().await {
			let (tile, result) = joined.expect("downsampling worker task panicked");
			match result {
				Ok(()) => report.succeeded += 1,
				Err(err) if is_interrupted(&err) => report.interrupted = true,
				Err(err) => {
					report.failed += 1;
					log::error!("{tile}: downsampling failed: {err:#}");
				}
			}
		}

		if report.interrupted {
			break;
		}
	}

	Ok(report)
}

/// Installs a `cancel` flag that flips on `SIGINT`, used to short-circuit dispatch loops
/// between units rather than tearing down in-flight work (spec §5 "timeouts ... equivalent
/// to interruption").
pub fn install_interrupt_handler() -> Arc<AtomicBool> {
	let cancel = Arc::new(AtomicBool::new(false));
	let flag = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			flag.store(true, Ordering::SeqCst);
		}
	});
	cancel
}
