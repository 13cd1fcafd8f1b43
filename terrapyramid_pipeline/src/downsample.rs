//! The Downsampling Engine (spec §4.5): for a parent tile not itself produced by Aggregation,
//! builds it from its four children's elevation grids by a single SENTINEL-aware 2x2 mean,
//! sharing the terrarium codec with [`crate::aggregation::encode`].
//!
//! Each call to [`downsample_tile`] computes exactly one output tile from its four children at
//! the next-finer zoom; the Scheduler repeats this bottom-up across a macrotile boundary's
//! zoom range (spec §4.5 "repeat recursively from `z_p` upward to `z_min`").

use anyhow::{Context, Result};
use ndarray::{Array2, s};
use serde_json::Map;
use std::path::{Path, PathBuf};
use terrapyramid_archive::{ArchiveBeginFields, ArchiveReader, ArchiveWriter, TileCompression, TileType};
use terrapyramid_core::{HilbertIndex, SENTINEL, TILE_SIZE, TileId};

use crate::bbox::macrotile_geo_bbox;
use crate::reduce::mean_reduce_2x2;
use crate::sentinel::{MacrotileKey, touch_sentinel};
use crate::terrarium::{decode as decode_terrarium, encode as encode_terrarium};
use crate::tile_codec::{decode_png, encode_png};

/// Produces the tile archive for `parent_tile` by combining its four children's tiles, and
/// touches `downsampling.done` for it. No-op if that sentinel already exists.
pub fn downsample_tile(store_dir: &Path, snapshot_dir: &Path, parent_tile: TileId) -> Result<()> {
	let key = MacrotileKey::new(parent_tile, parent_tile.z);
	let done_path = key.downsampling_done_path(snapshot_dir);
	if done_path.exists() {
		return Ok(());
	}

	let children = parent_tile.children(parent_tile.z + 1)?;
	let size = TILE_SIZE as usize;
	let mut stitched = Array2::from_elem((2 * size, 2 * size), SENTINEL);

	for child in &children {
		let dx = (child.x - (parent_tile.x << 1)) as usize;
		let dy = (child.y - (parent_tile.y << 1)) as usize;
		let grid = read_child_elevation(store_dir, *child)?;
		stitched.slice_mut(s![dy * size..(dy + 1) * size, dx * size..(dx + 1) * size]).assign(&grid);
	}

	let reduced = mean_reduce_2x2(&stitched);

	let mut rgba = Vec::with_capacity(reduced.len() * 4);
	for &h in reduced.iter() {
		rgba.extend_from_slice(&encode_terrarium(h));
	}
	let png = encode_png(&rgba)?;

	let archive_path = key.archive_path(store_dir, "tpyr");
	let fields = ArchiveBeginFields {
		tile_type: TileType::Png,
		tile_compression: TileCompression::None,
		min_zoom: parent_tile.z,
		max_zoom: parent_tile.z,
		bbox: macrotile_geo_bbox(parent_tile)?,
		center_zoom: parent_tile.z,
	};
	let mut writer = ArchiveWriter::begin(&archive_path, fields, &Map::new())?;
	writer.write_tile(parent_tile.hilbert_index()?, &png)?;
	writer.finalize()?;
	log::info!("{}: downsampled from children into {}", key.stem(), archive_path.display());

	touch_sentinel(&done_path)?;
	Ok(())
}

/// Reads `tile`'s 512x512 elevation grid out of whichever archive already contains it
/// (an Aggregation archive covering `tile.z` in its own range, or a prior one-tile
/// Downsampling archive), decoding its terrarium RGBA back to elevation.
fn read_child_elevation(store_dir: &Path, tile: TileId) -> Result<Array2<f32>> {
	let archive_path = find_archive_for_tile(store_dir, tile)?
		.with_context(|| format!("no archive contains tile {tile} (child not yet produced)"))?;
	let reader = ArchiveReader::open(&archive_path).with_context(|| format!("opening {}", archive_path.display()))?;
	let tile_id = tile.hilbert_index()?;
	let bytes = reader
		.read_tile(tile_id)?
		.with_context(|| format!("tile {tile} missing from archive {}", archive_path.display()))?;
	let rgba = decode_png(&bytes)?;

	let size = TILE_SIZE as usize;
	let mut grid = Array2::from_elem((size, size), SENTINEL);
	for y in 0..size {
		for x in 0..size {
			let i = (y * size + x) * 4;
			let pixel = [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]];
			grid[(y, x)] = decode_terrarium(pixel);
		}
	}
	Ok(grid)
}

/// Scans `store_dir` for a `"{z}-{x}-{y}-{child_z}.tpyr"` archive whose macrotile covers
/// `tile`: either a one-tile Downsampling archive at exactly `tile`, or an Aggregation
/// archive whose root is an ancestor of `tile` within `[root.z, child_z]`.
fn find_archive_for_tile(store_dir: &Path, tile: TileId) -> Result<Option<PathBuf>> {
	let exact = store_dir.join(format!("{}-{}-{}-{}.tpyr", tile.z, tile.x, tile.y, tile.z));
	if exact.exists() {
		return Ok(Some(exact));
	}

	let dir = std::fs::read_dir(store_dir).with_context(|| format!("reading {}", store_dir.display()))?;
	for entry in dir {
		let entry = entry?;
		let path = entry.path();
		let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
		if path.extension().and_then(|e| e.to_str()) != Some("tpyr") {
			continue;
		}
		let Some((root, child_z)) = parse_archive_stem(stem) else { continue };
		if tile.z < root.z || tile.z > child_z {
			continue;
		}
		if tile.parent(root.z).map(|p| p == root).unwrap_or(false) {
			return Ok(Some(path));
		}
	}
	Ok(None)
}

pub fn parse_archive_stem(stem: &str) -> Option<(TileId, u8)> {
	let parts: Vec<&str> = stem.split('-').collect();
	if parts.len() != 4 {
		return None;
	}
	let z: u8 = parts[0].parse().ok()?;
	let x: u32 = parts[1].parse().ok()?;
	let y: u32 = parts[2].parse().ok()?;
	let child_z: u8 = parts[3].parse().ok()?;
	let root = TileId::new(z, x, y).ok()?;
	Some((root, child_z))
}
