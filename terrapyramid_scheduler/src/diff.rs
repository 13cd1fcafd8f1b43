//! Dirty-set discovery (spec §4.7 steps 1-3): enumerates plan files in a snapshot directory and
//! compares them byte-for-byte against the previous snapshot to find units needing (re)work.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use terrapyramid_core::TileId;
use terrapyramid_pipeline::MacrotileKey;

/// One dirty work unit: its key and the plan file path to pass to Aggregation.
#[derive(Debug, Clone)]
pub struct DirtyUnit {
	pub key: MacrotileKey,
	pub plan_path: PathBuf,
}

/// Computes the dirty set for `current_snapshot_dir` against an optional
/// `previous_snapshot_dir` (spec §4.7 "Algorithm" steps 1-3).
///
/// With no previous snapshot, every plan not already `-aggregation.done` is dirty. With a
/// previous snapshot, a plan is dirty if its key is new or its bytes differ from the
/// same-keyed plan in the previous snapshot, again excluding units already done.
pub struct SnapshotDiff;

impl SnapshotDiff {
	pub fn compute(current_snapshot_dir: &Path, previous_snapshot_dir: Option<&Path>) -> Result<Vec<DirtyUnit>> {
		let current_plans = enumerate_plans(current_snapshot_dir)?;
		let mut dirty = Vec::new();

		for (key, plan_path) in current_plans {
			if key.aggregation_done_path(current_snapshot_dir).exists() {
				continue;
			}

			let is_dirty = match previous_snapshot_dir {
				None => true,
				Some(previous_dir) => {
					let previous_path = key.plan_path(previous_dir);
					if !previous_path.exists() {
						true
					} else {
						let current_bytes = std::fs::read(&plan_path).with_context(|| format!("reading {}", plan_path.display()))?;
						let previous_bytes =
							std::fs::read(&previous_path).with_context(|| format!("reading {}", previous_path.display()))?;
						current_bytes != previous_bytes
					}
				}
			};

			if is_dirty {
				dirty.push(DirtyUnit { key, plan_path });
			}
		}

		Ok(dirty)
	}
}

fn enumerate_plans(snapshot_dir: &Path) -> Result<Vec<(MacrotileKey, PathBuf)>> {
	let mut out = Vec::new();
	let entries = std::fs::read_dir(snapshot_dir).with_context(|| format!("reading {}", snapshot_dir.display()))?;
	for entry in entries {
		let entry = entry?;
		let path = entry.path();
		let Some(filename) = path.file_name().and_then(|n| n.to_str()) else { continue };
		let Some(stem) = filename.strip_suffix("-aggregation.csv") else { continue };
		if let Some(key) = parse_plan_stem(stem) {
			out.push((key, path));
		}
	}
	Ok(out)
}

fn parse_plan_stem(stem: &str) -> Option<MacrotileKey> {
	let parts: Vec<&str> = stem.split('-').collect();
	if parts.len() != 4 {
		return None;
	}
	let z: u8 = parts[0].parse().ok()?;
	let x: u32 = parts[1].parse().ok()?;
	let y: u32 = parts[2].parse().ok()?;
	let child_z: u8 = parts[3].parse().ok()?;
	let tile = TileId::new(z, x, y).ok()?;
	Some(MacrotileKey::new(tile, child_z))
}
