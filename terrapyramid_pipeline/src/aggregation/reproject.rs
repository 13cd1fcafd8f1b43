//! The Reproject operation (spec §4.4 "Operation: Reproject"): assembles each source group's
//! virtual mosaic, warps it into the macrotile's haloed extent, and translates it to a tiled
//! scratch tiff, stopping early once a group's output has no remaining SENTINEL pixel.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use terrapyramid_catalog::{Plan, SourceItem};
use terrapyramid_core::constants::HALO_METERS;
use terrapyramid_core::geo::{resolution, tile_bounds_merc};
use terrapyramid_core::SENTINEL;
use terrapyramid_raster::{TranslateOptions, VirtualMosaic, is_complete, translate_to_tiled, warp_to_mercator};

use crate::sentinel::{MacrotileKey, write_atomic};

const COMPLETENESS_BLOCK: usize = 512;

/// Persisted at `reprojection.json`: the guard buffer applied and the dataset ids of the
/// groups actually warped, in priority order (spec §3 sentinel contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReprojectionRecord {
	pub buffer_pixels: u32,
	pub tiff_dataset_ids: Vec<String>,
}

/// Resolves a plan's `SourceItem` to a file path on disk. Source items name a `source`
/// subdirectory and a `filename` within it; this implementation assumes sources live under
/// `<sources_root>/<source>/<filename>`, the layout the Source Catalog's own fixtures use.
fn source_path(sources_root: &Path, item: &SourceItem) -> PathBuf {
	sources_root.join(&item.source).join(&item.filename)
}

/// Runs the Reproject step for `key` against `plan`, writing scratch tiffs and
/// `reprojection.json` under `key.tmp_dir(snapshot_dir)`. Returns the already-persisted
/// record without redoing any work if `reprojection.json` already exists (spec §4.4
/// "Failure semantics": "absence of `reprojection.json` ⇒ Reproject reruns from scratch").
pub fn reproject(snapshot_dir: &Path, sources_root: &Path, key: &MacrotileKey, plan: &Plan) -> Result<ReprojectionRecord> {
	let json_path = key.reprojection_json_path(snapshot_dir);
	if json_path.exists() {
		let bytes = std::fs::read(&json_path).with_context(|| format!("reading {}", json_path.display()))?;
		return serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", json_path.display()));
	}

	let tmp_dir = key.tmp_dir(snapshot_dir);
	std::fs::create_dir_all(&tmp_dir).with_context(|| format!("creating {}", tmp_dir.display()))?;

	let r = resolution(key.child_z)?;
	let multi = plan.groups.len() > 1 || plan.groups.first().is_some_and(|g| g.items.len() > 1);
	let buffer_3857 = if multi { (HALO_METERS / r).round() * r } else { 0.0 };
	let buffer_pixels = (buffer_3857 / r).round() as u32;

	let base_bounds = tile_bounds_merc(key.tile)?;
	let expanded = base_bounds.expand(buffer_3857);

	let mut dataset_ids = Vec::new();
	for (index, group) in plan.groups.iter().enumerate() {
		let sources: Vec<PathBuf> = group.items.iter().map(|item| source_path(sources_root, item)).collect();
		let mosaic = VirtualMosaic::assemble(&sources)?;
		let warped = warp_to_mercator(mosaic.dataset(), expanded, r, SENTINEL)?;
		let dst_path = key.reprojected_tiff_path(snapshot_dir, index);
		let translated = translate_to_tiled(&warped, &dst_path, TranslateOptions::default())?;

		dataset_ids.push(group.items.first().map(|item| item.dataset_id.clone()).unwrap_or_default());
		log::debug!("{}: reprojected group {index} ({} source file(s)) to {}", key.stem(), sources.len(), dst_path.display());

		if plan.groups.len() > 1 && is_complete(&translated, COMPLETENESS_BLOCK)? {
			log::debug!("{}: group {index} has full coverage; later groups are unnecessary", key.stem());
			break;
		}
	}

	let record = ReprojectionRecord { buffer_pixels, tiff_dataset_ids: dataset_ids };
	let bytes = serde_json::to_vec_pretty(&record).context("serializing reprojection.json")?;
	write_atomic(&json_path, &bytes).with_context(|| format!("writing {}", json_path.display()))?;
	Ok(record)
}

#[cfg(test)]
mod tests {
	use super::*;
	use terrapyramid_catalog::SourceGroup;
	use terrapyramid_core::TileId;

	fn plan_with_groups(groups: usize, items_per_group: usize) -> Plan {
		let mut groups_vec = Vec::new();
		for g in 0..groups {
			let items = (0..items_per_group)
				.map(|i| SourceItem {
					source: "usgs".to_string(),
					filename: format!("g{g}-{i}.tif"),
					dataset_id: format!("usgs-{g}"),
					maxzoom: 17,
				})
				.collect();
			groups_vec.push(SourceGroup { priority: g as u32, items });
		}
		Plan { child_z: 17, groups: groups_vec }
	}

	#[test]
	fn buffer_is_zero_for_a_single_file_single_group_plan() {
		let plan = plan_with_groups(1, 1);
		let multi = plan.groups.len() > 1 || plan.groups.first().is_some_and(|g| g.items.len() > 1);
		assert!(!multi);
	}

	#[test]
	fn buffer_is_nonzero_for_multi_group_plans() {
		let plan = plan_with_groups(2, 1);
		let multi = plan.groups.len() > 1 || plan.groups.first().is_some_and(|g| g.items.len() > 1);
		assert!(multi);
	}

	#[test]
	fn source_path_joins_source_and_filename() {
		let item = SourceItem { source: "usgs".to_string(), filename: "a.tif".to_string(), dataset_id: "x".to_string(), maxzoom: 17 };
		let path = source_path(Path::new("/data/sources"), &item);
		assert_eq!(path, Path::new("/data/sources/usgs/a.tif"));
	}

	#[test]
	fn macrotile_key_paths_are_consistent() {
		let key = MacrotileKey::new(TileId::new(12, 2130, 1459).unwrap(), 17);
		assert_eq!(key.child_z, 17);
	}
}
