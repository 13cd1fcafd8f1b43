//! The Aggregation Engine (spec §4.4): Reproject → Merge → Encode for one macrotile work unit,
//! structurally grounded on how `versatiles_pipeline`'s operations modules separate read/
//! transform concerns into one file per operation under a shared directory.

pub mod encode;
pub mod merge;
pub mod reproject;

use anyhow::Result;
use std::path::Path;
use terrapyramid_catalog::load_plan;

use crate::sentinel::MacrotileKey;

/// Runs the full Aggregation pipeline for one macrotile work unit, short-circuiting at
/// whichever sentinel already exists (spec §4.4 "Failure semantics").
pub fn run_aggregation(snapshot_dir: &Path, store_dir: &Path, sources_root: &Path, key: &MacrotileKey) -> Result<()> {
	if key.aggregation_done_path(snapshot_dir).exists() {
		log::debug!("{}: aggregation.done already present, skipping", key.stem());
		return Ok(());
	}

	let plan = load_plan(key.plan_path(snapshot_dir))?;
	let record = reproject::reproject(snapshot_dir, sources_root, key, &plan)?;
	merge::merge(snapshot_dir, key, &record, record.tiff_dataset_ids.len())?;
	encode::encode(snapshot_dir, store_dir, key, &record)?;
	Ok(())
}
