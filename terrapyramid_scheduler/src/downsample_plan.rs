//! Downsampling dependency enforcement (spec §4.7 "Ordering guarantees": "downsampling of `P`
//! requires that all four children of `P` have `aggregation.done` or `downsampling.done`").
//!
//! The Scheduler enforces this by staged invocation: one level at a time, strictly from the
//! finest zoom needing an overview down to `z_min`, so every tile dispatched at a level already
//! has its four children available on disk.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use terrapyramid_core::TileId;

/// One staged level of downsampling work: all distinct parent tiles at `zoom` that need a
/// Downsampling archive, ordered so that dispatching level `i` before level `i+1` guarantees
/// `i`'s children are already on disk.
pub struct DownsamplePlan {
	pub levels: Vec<Vec<TileId>>,
}

impl DownsamplePlan {
	/// Scans `store_dir` for aggregation archive roots and builds the ancestor chain from each
	/// root up to `min_zoom`, skipping any ancestor tile that is itself an aggregation root
	/// (already covered directly by Aggregation, spec §4.5 "not itself ... produced by
	/// Aggregation at that zoom").
	pub fn discover(store_dir: &Path, min_zoom: u8) -> Result<Self> {
		let roots = list_aggregation_roots(store_dir)?;
		let root_set: HashSet<TileId> = roots.iter().map(|(root, _)| *root).collect();

		let max_root_z = roots.iter().map(|(root, _)| root.z).max().unwrap_or(min_zoom);
		let mut levels = Vec::new();

		for z in (min_zoom..max_root_z).rev() {
			let mut level: HashSet<TileId> = HashSet::new();
			for (root, _) in &roots {
				if root.z <= z {
					continue;
				}
				let ancestor = root.parent(z)?;
				if !root_set.contains(&ancestor) {
					level.insert(ancestor);
				}
			}
			if !level.is_empty() {
				levels.push(level.into_iter().collect());
			}
		}

		Ok(Self { levels })
	}
}

fn list_aggregation_roots(store_dir: &Path) -> Result<Vec<(TileId, u8)>> {
	let mut out = Vec::new();
	let entries = std::fs::read_dir(store_dir).with_context(|| format!("reading {}", store_dir.display()))?;
	for entry in entries {
		let entry = entry?;
		let path = entry.path();
		if path.extension().and_then(|e| e.to_str()) != Some("tpyr") {
			continue;
		}
		let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
		if let Some(parsed) = terrapyramid_pipeline::downsample::parse_archive_stem(stem) {
			out.push(parsed);
		}
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn single_root_produces_one_level_per_zoom_up_to_min() {
		let dir = tempdir().unwrap();
		std::fs::write(dir.path().join("6-3-2-12.tpyr"), b"x").unwrap();
		let plan = DownsamplePlan::discover(dir.path(), 0).unwrap();
		assert_eq!(plan.levels.len(), 6);
		assert_eq!(plan.levels[0], vec![TileId::new(5, 1, 1).unwrap()]);
		assert_eq!(plan.levels.last().unwrap(), &vec![TileId::new(0, 0, 0).unwrap()]);
	}

	#[test]
	fn two_siblings_share_the_same_parent_level_entry() {
		let dir = tempdir().unwrap();
		std::fs::write(dir.path().join("6-2-2-12.tpyr"), b"x").unwrap();
		std::fs::write(dir.path().join("6-3-2-12.tpyr"), b"x").unwrap();
		let plan = DownsamplePlan::discover(dir.path(), 5).unwrap();
		assert_eq!(plan.levels.len(), 1);
		assert_eq!(plan.levels[0].len(), 1);
	}

	#[test]
	fn empty_store_produces_no_levels() {
		let dir = tempdir().unwrap();
		let plan = DownsamplePlan::discover(dir.path(), 0).unwrap();
		assert!(plan.levels.is_empty());
	}
}
