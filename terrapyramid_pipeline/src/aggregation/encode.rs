//! The Encode operation (spec §4.4 "Operation: Encode"): reads each descendant tile's window
//! out of the macrotile's final raster, terrarium-encodes it to RGBA, and streams the whole
//! `(z, x, y)` range down to `child_z` into the macrotile's tile archive in Hilbert order
//! (spec §11 "Overview strategy", re-resolved: Encode owns its own full zoom range).

use anyhow::{Context, Result};
use gdal::Dataset;
use serde_json::Map;
use std::path::Path;
use terrapyramid_archive::{ArchiveBeginFields, ArchiveWriter, TileCompression, TileType};
use terrapyramid_core::{HilbertIndex, TileId};
use terrapyramid_raster::{Window, read_window};

use super::reproject::ReprojectionRecord;
use crate::bbox::macrotile_geo_bbox;
use crate::reduce::reduce_to;
use crate::sentinel::{MacrotileKey, cleanup_tmp_dir, touch_sentinel};
use crate::terrarium::encode as encode_terrarium;
use crate::tile_codec::encode_png;

/// Runs the Encode step for `key`, writing the macrotile's archive to
/// `store_dir/{stem}.tpyr` and finishing the unit by removing `tmp/` and touching
/// `aggregation.done`. No-op if `aggregation.done` already exists.
pub fn encode(snapshot_dir: &Path, store_dir: &Path, key: &MacrotileKey, record: &ReprojectionRecord) -> Result<()> {
	let done_path = key.aggregation_done_path(snapshot_dir);
	if done_path.exists() {
		return Ok(());
	}

	let group_count = record.tiff_dataset_ids.len().max(1);
	let source_path = if group_count <= 1 {
		key.reprojected_tiff_path(snapshot_dir, 0)
	} else {
		key.merged_tiff_path(snapshot_dir, group_count)
	};
	let dataset = Dataset::open(&source_path).with_context(|| format!("opening {}", source_path.display()))?;

	let archive_path = key.archive_path(store_dir, "tpyr");
	let fields = ArchiveBeginFields {
		tile_type: TileType::Png,
		tile_compression: TileCompression::None,
		min_zoom: key.tile.z,
		max_zoom: key.child_z,
		bbox: macrotile_geo_bbox(key.tile)?,
		center_zoom: key.child_z,
	};
	let mut writer = ArchiveWriter::begin(&archive_path, fields, &Map::new())?;

	let descendants = key.tile.descendants_through(key.child_z)?;
	let mut tile_order: Vec<(u64, TileId)> = descendants
		.into_iter()
		.map(|t| Ok((t.hilbert_index()?, t)))
		.collect::<Result<Vec<_>>>()?;
	tile_order.sort_unstable_by_key(|(id, _)| *id);

	for (tile_id, tile) in tile_order {
		let elevation = read_tile_elevation(&dataset, key, tile, record.buffer_pixels)?;
		let mut rgba = Vec::with_capacity(elevation.len() * 4);
		for &h in elevation.iter() {
			rgba.extend_from_slice(&encode_terrarium(h));
		}
		let png = encode_png(&rgba)?;
		writer.write_tile(tile_id, &png)?;
	}

	writer.finalize()?;
	log::info!("{}: wrote archive {}", key.stem(), archive_path.display());

	cleanup_tmp_dir(snapshot_dir, key)?;
	touch_sentinel(&done_path)?;
	Ok(())
}

/// Reads the pixel window for descendant `tile` out of the macrotile's final raster and
/// reduces it to a 512x512 elevation grid, accounting for the `buffer_pixels` halo margin
/// the raster carries on every side (spec §4.4: "at `z' < child_z` it is
/// `2^(child_z-z')*512` per side, to be averaged in 2x2 reductions").
fn read_tile_elevation(dataset: &Dataset, key: &MacrotileKey, tile: TileId, buffer_pixels: u32) -> Result<ndarray::Array2<f32>> {
	let span_shift = key.child_z - tile.z;
	let span = terrapyramid_core::TILE_SIZE as usize * (1usize << span_shift);

	let local_shift = tile.z - key.tile.z;
	let dx = tile.x - (key.tile.x << local_shift);
	let dy = tile.y - (key.tile.y << local_shift);

	let origin_x = buffer_pixels as isize + dx as isize * span as isize;
	let origin_y = buffer_pixels as isize + dy as isize * span as isize;

	let window = Window::new(origin_x, origin_y, span, span);
	let raw = read_window(dataset, window)?;
	Ok(reduce_to(raw, terrapyramid_core::TILE_SIZE as usize))
}
