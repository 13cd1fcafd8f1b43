//! `terrapyramid downsample`: the Scheduler's downsampling half (spec §4.7 step 5, §4.5).
//! Stages work level by level from the finest zoom needing an overview down to `min_zoom`, so
//! every tile dispatched at a level already has its four children's archives on disk.

use anyhow::{Context, Result};
use std::path::PathBuf;
use terrapyramid_core::ConcurrencyLimits;
use terrapyramid_scheduler::{DownsamplePlan, dispatch_downsampling, install_interrupt_handler};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory holding the snapshot's aggregation sentinels
	#[arg(long, value_name = "DIR")]
	snapshot_dir: PathBuf,

	/// directory holding per-macrotile `.tpyr` archives, both read and written
	#[arg(long, value_name = "DIR")]
	store_dir: PathBuf,

	/// coarsest zoom level to downsample down to
	#[arg(long, value_name = "int", default_value_t = 0)]
	min_zoom: u8,

	/// number of concurrent workers; defaults to the host's CPU count
	#[arg(long, value_name = "int")]
	workers: Option<usize>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let plan = DownsamplePlan::discover(&arguments.store_dir, arguments.min_zoom)
		.with_context(|| format!("discovering downsampling work under {}", arguments.store_dir.display()))?;
	let total: usize = plan.levels.iter().map(Vec::len).sum();
	log::info!("{} parent tile(s) to downsample across {} zoom level(s)", total, plan.levels.len());

	let workers = arguments.workers.unwrap_or_else(ConcurrencyLimits::cpu_count);
	let cancel = install_interrupt_handler();

	let report =
		dispatch_downsampling(plan.levels, arguments.store_dir.clone(), arguments.snapshot_dir.clone(), workers, cancel)
			.await?;

	log::info!("downsampling complete: {} succeeded, {} failed", report.succeeded, report.failed);
	if report.interrupted {
		log::warn!("run interrupted; rerun to resume from the last consistent checkpoint");
	}
	if report.failed > 0 {
		anyhow::bail!("{} parent tile(s) failed downsampling; rerun to retry", report.failed);
	}
	Ok(())
}
