//! Random-access reads of a finalized archive (spec §4.6: "range-read of individual tiles"),
//! used by the `probe` CLI command and by the Bundle Assembler (spec §4.8 step 4: "load it
//! fully into memory once").

use crate::entry::{TileEntry, deserialize_directory};
use crate::header::ArchiveHeader;
use anyhow::{Context, Result, ensure};
use serde_json::{Map, Value};
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A fully-loaded archive: header, metadata, and the ordered directory. Tile bytes are read
/// lazily from `path` by [`ArchiveReader::read_tile`], except when the reader was built via
/// [`ArchiveReader::load_fully`], which inlines every tile's bytes for the Bundle Assembler's
/// "load once" contract.
pub struct ArchiveReader {
	path: PathBuf,
	pub header: ArchiveHeader,
	pub metadata: Map<String, Value>,
	pub entries: Vec<TileEntry>,
	tile_data: Option<Vec<u8>>,
}

impl ArchiveReader {
	/// Opens `path` and reads only the header, metadata and directory; tile bytes are fetched
	/// on demand via [`Self::read_tile`].
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let mut file = fs::File::open(&path).with_context(|| format!("opening archive {}", path.display()))?;

		let mut header_bytes = vec![0u8; crate::header::HEADER_LEN as usize];
		file.read_exact(&mut header_bytes).context("reading archive header")?;
		let header = ArchiveHeader::deserialize(&header_bytes)?;

		let metadata = read_section(&mut file, header.metadata.offset, header.metadata.length)?;
		let metadata: Map<String, Value> = serde_json::from_slice(&metadata).context("parsing archive metadata JSON")?;

		let directory_bytes = read_section(&mut file, header.directory.offset, header.directory.length)?;
		let entries = deserialize_directory(&directory_bytes)?;

		Ok(Self { path, header, metadata, entries, tile_data: None })
	}

	/// Like [`Self::open`], but also reads the entire tile-data section into memory up front
	/// (spec §4.8 step 4: "load it fully into memory once, then stream its tiles").
	pub fn load_fully(path: impl Into<PathBuf>) -> Result<Self> {
		let mut reader = Self::open(path)?;
		let mut file = fs::File::open(&reader.path)?;
		let data = read_section(&mut file, reader.header.tile_data.offset, reader.header.tile_data.length)?;
		reader.tile_data = Some(data);
		Ok(reader)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns the bytes for `tile_id`, or `None` if it is not present in this archive.
	pub fn read_tile(&self, tile_id: u64) -> Result<Option<Vec<u8>>> {
		let Ok(idx) = self.entries.binary_search_by_key(&tile_id, |e| e.tile_id) else {
			return Ok(None);
		};
		let entry = self.entries[idx];
		if let Some(data) = &self.tile_data {
			ensure!((entry.offset + entry.length) as usize <= data.len(), "directory entry points past loaded tile data");
			return Ok(Some(data[entry.offset as usize..(entry.offset + entry.length) as usize].to_vec()));
		}
		let mut file = fs::File::open(&self.path)?;
		let absolute_offset = self.header.tile_data.offset + entry.offset;
		let bytes = read_section(&mut file, absolute_offset, entry.length)?;
		Ok(Some(bytes))
	}
}

fn read_section(file: &mut fs::File, offset: u64, length: u64) -> Result<Vec<u8>> {
	file.seek(SeekFrom::Start(offset)).context("seeking to archive section")?;
	let mut buf = vec![0u8; length as usize];
	file.read_exact(&mut buf).context("reading archive section")?;
	Ok(buf)
}
