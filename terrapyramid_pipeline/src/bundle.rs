//! The Bundle Assembler (spec §4.8), directly grounded on `pipelines/bundle.py`'s
//! `get_parent_to_filepaths`/`read_full_archive`/`create_archive` structure: joins the
//! per-macrotile archives under a coarser parent boundary into one regional archive by
//! concatenating their tile streams in ascending `tile_id` order.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use terrapyramid_archive::{ArchiveBeginFields, ArchiveReader, ArchiveWriter, TileCompression, TileType};
use terrapyramid_core::{GeoBBox, HilbertIndex};

use crate::bbox::macrotile_geo_bbox;
use crate::downsample::parse_archive_stem;

/// Joins every `*.tpyr` archive under `store_dir` into `out_path`, attributing
/// `attribution` as the bundle's metadata (spec §4.8 steps 1-5). Archives are loaded
/// fully once each, in first-touch order of the sorted tile-id list, then streamed into
/// the bundle writer (spec step 4: "Load-once amortizes open cost").
pub fn assemble_bundle(store_dir: &Path, out_path: &Path, attribution: &str) -> Result<String> {
	let archive_paths = list_archives(store_dir)?;
	if archive_paths.is_empty() {
		bail!("no archives found under {}", store_dir.display());
	}

	let mut tile_ids_and_paths: Vec<(u64, PathBuf)> = Vec::new();
	let mut bbox: Option<GeoBBox> = None;
	let mut min_zoom = u8::MAX;
	let mut max_zoom = 0u8;

	for path in &archive_paths {
		let stem = path.file_stem().and_then(|s| s.to_str()).context("archive filename has no stem")?;
		let (root, child_z) = parse_archive_stem(stem).with_context(|| format!("{}: not a well-formed archive stem", path.display()))?;

		for tile in root.descendants_through(child_z)? {
			tile_ids_and_paths.push((tile.hilbert_index()?, path.clone()));
		}

		min_zoom = min_zoom.min(root.z);
		max_zoom = max_zoom.max(child_z);
		let tile_bbox = macrotile_geo_bbox(root)?;
		match &mut bbox {
			Some(b) => b.extend(&tile_bbox),
			None => bbox = Some(tile_bbox),
		}
	}

	tile_ids_and_paths.sort_unstable_by_key(|(id, _)| *id);
	let bbox = bbox.context("no bounds accumulated")?;

	let fields = ArchiveBeginFields {
		tile_type: TileType::Png,
		tile_compression: TileCompression::None,
		min_zoom,
		max_zoom,
		bbox,
		center_zoom: (min_zoom + max_zoom) / 2,
	};
	let mut metadata = Map::new();
	metadata.insert("attribution".to_string(), Value::String(attribution.to_string()));
	let mut writer = ArchiveWriter::begin(out_path, fields, &metadata)?;

	let mut cache: Option<(PathBuf, HashMap<u64, Vec<u8>>)> = None;
	for (tile_id, path) in tile_ids_and_paths {
		if cache.as_ref().map(|(p, _)| p != &path).unwrap_or(true) {
			let reader = ArchiveReader::load_fully(&path).with_context(|| format!("loading {}", path.display()))?;
			let mut tiles = HashMap::with_capacity(reader.entries.len());
			for entry in &reader.entries {
				if let Some(bytes) = reader.read_tile(entry.tile_id)? {
					tiles.insert(entry.tile_id, bytes);
				}
			}
			cache = Some((path.clone(), tiles));
		}
		let (_, tiles) = cache.as_ref().unwrap();
		let bytes = tiles.get(&tile_id).with_context(|| format!("tile {tile_id} missing from {}", path.display()))?;
		writer.write_tile(tile_id, bytes)?;
	}

	writer.finalize()
}

fn list_archives(store_dir: &Path) -> Result<Vec<PathBuf>> {
	let mut paths: Vec<PathBuf> = std::fs::read_dir(store_dir)
		.with_context(|| format!("reading {}", store_dir.display()))?
		.filter_map(|entry| entry.ok())
		.map(|entry| entry.path())
		.filter(|path| path.extension().and_then(|e| e.to_str()) == Some("tpyr"))
		.collect();
	paths.sort();
	Ok(paths)
}
