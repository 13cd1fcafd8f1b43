//! `terrapyramid aggregate`: the Scheduler's aggregation half (spec §4.7 steps 1-4). Diffs a
//! snapshot against an optional previous one, then dispatches every dirty macrotile through
//! Reproject -> Merge -> Encode on a bounded worker pool.

use anyhow::{Context, Result};
use std::path::PathBuf;
use terrapyramid_core::ConcurrencyLimits;
use terrapyramid_raster::RasterConfig;
use terrapyramid_scheduler::{SnapshotDiff, dispatch_aggregation, install_interrupt_handler};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory holding the current snapshot's `*-aggregation.csv` plan files
	#[arg(long, value_name = "DIR")]
	snapshot_dir: PathBuf,

	/// directory holding the previous snapshot's plan files, for dirty-set diffing
	#[arg(long, value_name = "DIR")]
	previous_snapshot_dir: Option<PathBuf>,

	/// directory source rasters are resolved from (`<sources_root>/<source>/<filename>`)
	#[arg(long, value_name = "DIR")]
	sources_root: PathBuf,

	/// directory per-macrotile `.tpyr` archives are written into
	#[arg(long, value_name = "DIR")]
	store_dir: PathBuf,

	/// number of concurrent workers; defaults to the host's CPU count
	#[arg(long, value_name = "int")]
	workers: Option<usize>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	RasterConfig::from_env().apply().context("applying GDAL configuration")?;
	std::fs::create_dir_all(&arguments.store_dir)
		.with_context(|| format!("creating {}", arguments.store_dir.display()))?;

	let dirty = SnapshotDiff::compute(&arguments.snapshot_dir, arguments.previous_snapshot_dir.as_deref())?;
	log::info!("{} dirty macrotile(s) to aggregate", dirty.len());

	let workers = arguments.workers.unwrap_or_else(ConcurrencyLimits::cpu_count);
	let cancel = install_interrupt_handler();

	let report = dispatch_aggregation(
		dirty,
		arguments.store_dir.clone(),
		arguments.sources_root.clone(),
		arguments.snapshot_dir.clone(),
		workers,
		cancel,
	)
	.await?;

	log::info!("aggregation complete: {} succeeded, {} failed", report.succeeded, report.failed);
	if report.interrupted {
		log::warn!("run interrupted; rerun to resume from the last consistent checkpoint");
	}
	if report.failed > 0 {
		anyhow::bail!("{} macrotile(s) failed aggregation; rerun to retry", report.failed);
	}
	Ok(())
}
