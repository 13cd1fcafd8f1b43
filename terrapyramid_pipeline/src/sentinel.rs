//! Filesystem sentinel layout for one macrotile's lifecycle (spec §3 "Sentinels", §6
//! "Filesystem layout"). A [`MacrotileKey`] names every path a macrotile's aggregation or
//! downsampling unit touches; the Scheduler and Aggregation/Downsampling Engines share this one
//! naming convention so neither side can drift from the other.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use terrapyramid_core::TileId;

/// The `(z, x, y, child_z)` key identifying one work unit, and the stem (`"{z}-{x}-{y}-{cz}"`)
/// every sentinel and scratch file for that unit is named from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacrotileKey {
	pub tile: TileId,
	pub child_z: u8,
}

impl MacrotileKey {
	pub fn new(tile: TileId, child_z: u8) -> Self {
		Self { tile, child_z }
	}

	pub fn stem(&self) -> String {
		format!("{}-{}-{}-{}", self.tile.z, self.tile.x, self.tile.y, self.child_z)
	}

	pub fn plan_path(&self, snapshot_dir: &Path) -> PathBuf {
		snapshot_dir.join(format!("{}-aggregation.csv", self.stem()))
	}

	pub fn aggregation_done_path(&self, snapshot_dir: &Path) -> PathBuf {
		snapshot_dir.join(format!("{}-aggregation.done", self.stem()))
	}

	pub fn tmp_dir(&self, snapshot_dir: &Path) -> PathBuf {
		snapshot_dir.join(format!("{}-tmp", self.stem()))
	}

	pub fn reprojection_json_path(&self, snapshot_dir: &Path) -> PathBuf {
		self.tmp_dir(snapshot_dir).join("reprojection.json")
	}

	pub fn merge_done_path(&self, snapshot_dir: &Path) -> PathBuf {
		self.tmp_dir(snapshot_dir).join("merge-done")
	}

	pub fn reprojected_tiff_path(&self, snapshot_dir: &Path, group_index: usize) -> PathBuf {
		self.tmp_dir(snapshot_dir).join(format!("{group_index}-3857.tiff"))
	}

	pub fn merged_tiff_path(&self, snapshot_dir: &Path, group_count: usize) -> PathBuf {
		self.tmp_dir(snapshot_dir).join(format!("{group_count}-3857.tiff"))
	}

	/// The downsampling stage's analogous sentinels (spec §3: "The analogous `-downsampling.*`
	/// sentinels govern the downsampling stage").
	pub fn downsampling_done_path(&self, snapshot_dir: &Path) -> PathBuf {
		snapshot_dir.join(format!("{}-downsampling.done", self.stem()))
	}

	pub fn archive_path(&self, store_dir: &Path, extension: &str) -> PathBuf {
		store_dir.join(format!("{}.{extension}", self.stem()))
	}
}

/// The unit's lifecycle state, derived by probing sentinels on disk (spec §9 "Dynamic typing /
/// duck typing": "the sentinel-based unit state machine is a sum type").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
	Planned,
	Reprojected,
	Merged,
	Done,
}

/// Reads the sentinel files under `snapshot_dir` for `key` and reports which stage has already
/// completed, so Reproject/Merge/Encode can resume from the right point (spec §4.4 "Failure
/// semantics").
pub fn probe_aggregation_state(snapshot_dir: &Path, key: &MacrotileKey) -> UnitState {
	if key.aggregation_done_path(snapshot_dir).exists() {
		return UnitState::Done;
	}
	if key.merge_done_path(snapshot_dir).exists() {
		return UnitState::Merged;
	}
	if key.reprojection_json_path(snapshot_dir).exists() {
		return UnitState::Reprojected;
	}
	UnitState::Planned
}

/// Removes the unit's scratch directory. Called only after `aggregation.done` has been written
/// (spec §3: "`tmp/` has been removed" is part of what `-aggregation.done` certifies).
pub fn cleanup_tmp_dir(snapshot_dir: &Path, key: &MacrotileKey) -> Result<()> {
	let dir = key.tmp_dir(snapshot_dir);
	if dir.exists() {
		fs::remove_dir_all(&dir).with_context(|| format!("removing scratch dir {}", dir.display()))?;
	}
	Ok(())
}

/// Atomically marks a sentinel file as present by writing to a temp path in the same directory
/// and renaming over the target (spec §5: "implementations should fsync or write-temp-then-
/// rename"). The sentinel's content is not meaningful; only its existence is.
pub fn touch_sentinel(path: &Path) -> Result<()> {
	write_atomic(path, b"")
}

/// Writes `bytes` to `path` atomically by writing to a sibling temp file first and renaming it
/// into place, so a crash mid-write never leaves a corrupt file at `path` for a later run to
/// mistake for a complete artifact (spec §4.7 "Cancellation / interruption": "write-temp-then-
/// rename"). Used both by [`touch_sentinel`] and by any artifact whose *presence* at `path` is
/// trusted unconditionally, such as `reprojection.json`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	let tmp_path = path.with_extension("tmp-sentinel");
	fs::write(&tmp_path, bytes).with_context(|| format!("writing {}", tmp_path.display()))?;
	fs::rename(&tmp_path, path).with_context(|| format!("renaming {} into place", tmp_path.display()))?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	fn key() -> MacrotileKey {
		MacrotileKey::new(TileId::new(12, 2130, 1459).unwrap(), 17)
	}

	#[test]
	fn stem_matches_the_documented_convention() {
		assert_eq!(key().stem(), "12-2130-1459-17");
	}

	#[test]
	fn paths_are_named_from_the_stem() {
		let dir = PathBuf::from("/pipeline-root/aggregation-store/snap-1");
		let k = key();
		assert_eq!(k.plan_path(&dir), dir.join("12-2130-1459-17-aggregation.csv"));
		assert_eq!(k.aggregation_done_path(&dir), dir.join("12-2130-1459-17-aggregation.done"));
		assert_eq!(k.tmp_dir(&dir), dir.join("12-2130-1459-17-tmp"));
		assert_eq!(k.reprojection_json_path(&dir), dir.join("12-2130-1459-17-tmp/reprojection.json"));
	}

	#[test]
	fn probe_reports_planned_with_no_sentinels() {
		let dir = tempdir().unwrap();
		assert_eq!(probe_aggregation_state(dir.path(), &key()), UnitState::Planned);
	}

	#[test]
	fn probe_escalates_through_the_state_machine() {
		let dir = tempdir().unwrap();
		let k = key();

		fs::create_dir_all(k.tmp_dir(dir.path())).unwrap();
		fs::write(k.reprojection_json_path(dir.path()), "{}").unwrap();
		assert_eq!(probe_aggregation_state(dir.path(), &k), UnitState::Reprojected);

		fs::write(k.merge_done_path(dir.path()), "").unwrap();
		assert_eq!(probe_aggregation_state(dir.path(), &k), UnitState::Merged);

		touch_sentinel(&k.aggregation_done_path(dir.path())).unwrap();
		assert_eq!(probe_aggregation_state(dir.path(), &k), UnitState::Done);
	}

	#[test]
	fn cleanup_removes_the_scratch_dir() {
		let dir = tempdir().unwrap();
		let k = key();
		fs::create_dir_all(k.tmp_dir(dir.path())).unwrap();
		fs::write(k.tmp_dir(dir.path()).join("stray.tiff"), b"x").unwrap();
		cleanup_tmp_dir(dir.path(), &k).unwrap();
		assert!(!k.tmp_dir(dir.path()).exists());
	}

	#[test]
	fn touch_sentinel_creates_an_empty_durable_file() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("a-b-c.done");
		touch_sentinel(&path).unwrap();
		assert!(path.exists());
		assert_eq!(fs::metadata(&path).unwrap().len(), 0);
	}
}
