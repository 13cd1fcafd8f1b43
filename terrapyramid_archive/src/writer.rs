//! The streaming archive writer (spec §4.6): `begin` → repeated `write_tile` in strictly
//! ascending `tile_id` → `finalize`, grounded on the teacher's `PMTilesWriter`
//! (`versatiles_container::container::pmtiles::writer`) control flow — reserve header space,
//! stream tile bytes, then backfill the header once the directory and metadata sections are
//! known.

use crate::entry::{TileEntry, serialize_directory};
use crate::header::{ArchiveHeader, ByteRange, HEADER_LEN};
use crate::tile_type::{TileCompression, TileType};
use anyhow::{Context, Result, bail};
use md5::{Digest, Md5};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use terrapyramid_core::{ErrorKind, GeoBBox, PipelineError};

/// Header-level fields fixed for the lifetime of one archive, supplied to `begin`.
#[derive(Debug, Clone)]
pub struct ArchiveBeginFields {
	pub tile_type: TileType,
	pub tile_compression: TileCompression,
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub bbox: GeoBBox,
	pub center_zoom: u8,
}

/// A single-file tiled archive under construction. Owns the destination file for the writer's
/// lifetime; `finalize` is the only point at which the file becomes a valid, readable archive.
pub struct ArchiveWriter {
	path: PathBuf,
	file: File,
	fields: ArchiveBeginFields,
	metadata_range: ByteRange,
	tile_data_start: u64,
	entries: Vec<TileEntry>,
	last_tile_id: Option<u64>,
	finalized: bool,
}

impl ArchiveWriter {
	/// Creates `path`, reserves the fixed-size header, and writes the metadata blob. No tile
	/// data section exists yet; `write_tile` appends starting right after the metadata.
	pub fn begin(path: impl Into<PathBuf>, fields: ArchiveBeginFields, metadata: &Map<String, Value>) -> Result<Self> {
		let path = path.into();
		let mut file = File::create(&path).with_context(|| format!("creating archive at {}", path.display()))?;

		file.write_all(&vec![0u8; HEADER_LEN as usize]).context("reserving archive header space")?;

		let metadata_bytes = serde_json::to_vec(metadata).context("serializing archive metadata")?;
		let metadata_offset = file.stream_position()?;
		file.write_all(&metadata_bytes).context("writing archive metadata")?;
		let metadata_range = ByteRange::new(metadata_offset, metadata_bytes.len() as u64);

		let tile_data_start = file.stream_position()?;

		log::debug!("archive {} begun: tile_type={:?} zoom=[{},{}]", path.display(), fields.tile_type, fields.min_zoom, fields.max_zoom);

		Ok(Self { path, file, fields, metadata_range, tile_data_start, entries: Vec::new(), last_tile_id: None, finalized: false })
	}

	/// Appends one tile's bytes. `tile_id` must be strictly greater than every previously
	/// written tile id in this archive.
	pub fn write_tile(&mut self, tile_id: u64, bytes: &[u8]) -> Result<()> {
		if let Some(last) = self.last_tile_id {
			if tile_id == last {
				bail!(PipelineError::new(ErrorKind::Duplicate, format!("duplicate tile_id {tile_id}")));
			}
			if tile_id < last {
				bail!(PipelineError::new(ErrorKind::OrderViolation, format!("tile_id {tile_id} out of order after {last}")));
			}
		}

		let absolute_offset = self.file.stream_position().map_err(|e| PipelineError::new(ErrorKind::IoError, e.to_string()))?;
		self
			.file
			.write_all(bytes)
			.map_err(|e| PipelineError::new(ErrorKind::IoError, format!("writing tile {tile_id}: {e}")))?;

		self.entries.push(TileEntry { tile_id, offset: absolute_offset - self.tile_data_start, length: bytes.len() as u64 });
		self.last_tile_id = Some(tile_id);
		Ok(())
	}

	/// Writes the directory, backfills the header, flushes, and returns the archive's MD5
	/// checksum. Also writes the `<archive>.md5` sidecar (spec §4.6 "side effect").
	pub fn finalize(mut self) -> Result<String> {
		let directory_bytes = serialize_directory(&self.entries)?;
		let directory_offset = self.file.stream_position()?;
		self.file.write_all(&directory_bytes).context("writing archive directory")?;
		let directory_range = ByteRange::new(directory_offset, directory_bytes.len() as u64);
		let tile_data_range = ByteRange::new(self.tile_data_start, directory_offset - self.tile_data_start);

		let header = ArchiveHeader {
			directory: directory_range,
			metadata: self.metadata_range,
			tile_data: tile_data_range,
			tile_entries_count: self.entries.len() as u64,
			tile_type: self.fields.tile_type,
			tile_compression: self.fields.tile_compression,
			min_zoom: self.fields.min_zoom,
			max_zoom: self.fields.max_zoom,
			bbox: self.fields.bbox,
			center_zoom: self.fields.center_zoom,
		};
		let header_bytes = header.serialize()?;

		self.file.seek(SeekFrom::Start(0)).context("seeking to header position")?;
		self.file.write_all(&header_bytes).context("writing final archive header")?;
		self.file.sync_all().map_err(|e| PipelineError::new(ErrorKind::IoError, e.to_string()))?;
		self.finalized = true;

		let checksum = hash_file(&self.path)?;
		write_md5_sidecar(&self.path, &checksum)?;
		log::debug!("archive {} finalized: {} tiles, md5={checksum}", self.path.display(), header.tile_entries_count);
		Ok(checksum)
	}
}

impl Drop for ArchiveWriter {
	/// If a writer is dropped without `finalize`, the partial file it began is removed so a
	/// future reader never mistakes it for a complete archive (spec §4.6: "no artifact
	/// partially written beyond `begin`").
	fn drop(&mut self) {
		if !self.finalized {
			let _ = fs::remove_file(&self.path);
		}
	}
}

fn hash_file(path: &Path) -> Result<String> {
	let bytes = fs::read(path).with_context(|| format!("reading {} to checksum", path.display()))?;
	let digest = Md5::digest(&bytes);
	Ok(hex_encode(&digest))
}

fn write_md5_sidecar(archive_path: &Path, checksum: &str) -> Result<()> {
	let basename = archive_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
	let mut sidecar_name = archive_path.as_os_str().to_owned();
	sidecar_name.push(".md5");
	let sidecar_path = PathBuf::from(sidecar_name);
	fs::write(&sidecar_path, format!("{checksum} {basename}\n"))
		.with_context(|| format!("writing checksum sidecar {}", sidecar_path.display()))
}

fn hex_encode(bytes: &[u8]) -> String {
	bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	fn fields() -> ArchiveBeginFields {
		ArchiveBeginFields {
			tile_type: TileType::Png,
			tile_compression: TileCompression::None,
			min_zoom: 12,
			max_zoom: 13,
			bbox: GeoBBox::new(-1.0, -1.0, 1.0, 1.0).unwrap(),
			center_zoom: 12,
		}
	}

	fn metadata() -> Map<String, Value> {
		let mut m = Map::new();
		m.insert("attribution".to_string(), Value::String("Mapterhorn contributors".to_string()));
		m
	}

	#[test]
	fn writes_tiles_in_order_and_finalizes() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("12-0-0-13.tpyr");
		let mut writer = ArchiveWriter::begin(&path, fields(), &metadata()).unwrap();
		writer.write_tile(0, b"root").unwrap();
		writer.write_tile(1, b"child-a").unwrap();
		writer.write_tile(4, b"child-b").unwrap();
		let checksum = writer.finalize().unwrap();
		assert_eq!(checksum.len(), 32);
		assert!(path.exists());
		let sidecar = fs::read_to_string(format!("{}.md5", path.display())).unwrap();
		assert!(sidecar.starts_with(&checksum));
	}

	#[test]
	fn rejects_duplicate_tile_id() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("a.tpyr");
		let mut writer = ArchiveWriter::begin(&path, fields(), &metadata()).unwrap();
		writer.write_tile(0, b"x").unwrap();
		let err = writer.write_tile(0, b"y").unwrap_err();
		assert!(err.to_string().contains("Duplicate"));
	}

	#[test]
	fn rejects_out_of_order_tile_id() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("b.tpyr");
		let mut writer = ArchiveWriter::begin(&path, fields(), &metadata()).unwrap();
		writer.write_tile(5, b"x").unwrap();
		let err = writer.write_tile(3, b"y").unwrap_err();
		assert!(err.to_string().contains("OrderViolation"));
	}

	#[test]
	fn dropping_without_finalize_removes_the_partial_file() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("c.tpyr");
		{
			let mut writer = ArchiveWriter::begin(&path, fields(), &metadata()).unwrap();
			writer.write_tile(0, b"x").unwrap();
		}
		assert!(!path.exists());
	}
}
