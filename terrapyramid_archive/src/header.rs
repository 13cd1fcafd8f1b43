//! The archive's fixed-size header (spec §4.6, §6), grounded directly on the teacher's
//! `HeaderV3` (`versatiles_container::container::pmtiles::types::header_v3`): a magic,
//! byte-range pointers to the directory/metadata/tile-data sections, and the zoom/bbox/center
//! fields a tile archive header carries.

use crate::tile_type::{TileCompression, TileType};
use anyhow::{Result, bail};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};
use terrapyramid_core::GeoBBox;

const MAGIC: &[u8; 8] = b"TPYRMD01";

/// A half-open `[offset, offset+length)` byte range within the archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteRange {
	pub offset: u64,
	pub length: u64,
}

impl ByteRange {
	pub fn new(offset: u64, length: u64) -> Self {
		Self { offset, length }
	}
}

/// The archive header: one fixed-size record at offset 0, written twice (a zeroed placeholder
/// at `begin`, the real values at `finalize`) per spec §4.6's "no artifact partially written
/// beyond `begin`" contract — the placeholder bytes are never a readable header until the
/// second write overwrites them.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveHeader {
	pub directory: ByteRange,
	pub metadata: ByteRange,
	pub tile_data: ByteRange,
	pub tile_entries_count: u64,
	pub tile_type: TileType,
	pub tile_compression: TileCompression,
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub bbox: GeoBBox,
	pub center_zoom: u8,
}

/// Serialized header length in bytes, fixed regardless of field values.
pub const HEADER_LEN: u64 = 96;

impl ArchiveHeader {
	pub fn serialize(&self) -> Result<Vec<u8>> {
		let mut buf: Vec<u8> = Vec::with_capacity(HEADER_LEN as usize);
		buf.write_all(MAGIC)?;
		buf.write_u8(1)?; // format version

		buf.write_u64::<LittleEndian>(self.directory.offset)?;
		buf.write_u64::<LittleEndian>(self.directory.length)?;
		buf.write_u64::<LittleEndian>(self.metadata.offset)?;
		buf.write_u64::<LittleEndian>(self.metadata.length)?;
		buf.write_u64::<LittleEndian>(self.tile_data.offset)?;
		buf.write_u64::<LittleEndian>(self.tile_data.length)?;
		buf.write_u64::<LittleEndian>(self.tile_entries_count)?;

		buf.write_u8(self.tile_type as u8)?;
		buf.write_u8(self.tile_compression as u8)?;
		buf.write_u8(self.min_zoom)?;
		buf.write_u8(self.max_zoom)?;

		let [min_lon_e7, min_lat_e7, max_lon_e7, max_lat_e7] = self.bbox.as_e7();
		buf.write_i32::<LittleEndian>(min_lon_e7)?;
		buf.write_i32::<LittleEndian>(min_lat_e7)?;
		buf.write_i32::<LittleEndian>(max_lon_e7)?;
		buf.write_i32::<LittleEndian>(max_lat_e7)?;

		buf.write_u8(self.center_zoom)?;
		let (center_lon, center_lat) = self.bbox.center();
		buf.write_i32::<LittleEndian>((center_lon * 1e7).round() as i32)?;
		buf.write_i32::<LittleEndian>((center_lat * 1e7).round() as i32)?;

		if buf.len() as u64 > HEADER_LEN {
			bail!("archive header grew past its fixed length ({} > {HEADER_LEN})", buf.len());
		}
		buf.resize(HEADER_LEN as usize, 0);
		Ok(buf)
	}

	pub fn deserialize(bytes: &[u8]) -> Result<Self> {
		if bytes.len() < HEADER_LEN as usize {
			bail!("archive header truncated: expected {HEADER_LEN} bytes, got {}", bytes.len());
		}
		let mut cursor = Cursor::new(bytes);
		let mut magic = [0u8; 8];
		cursor.read_exact(&mut magic)?;
		if &magic != MAGIC {
			bail!("not a terrapyramid archive: bad magic bytes");
		}
		let version = cursor.read_u8()?;
		if version != 1 {
			bail!("unsupported archive format version {version}");
		}

		let directory = ByteRange::new(cursor.read_u64::<LittleEndian>()?, cursor.read_u64::<LittleEndian>()?);
		let metadata = ByteRange::new(cursor.read_u64::<LittleEndian>()?, cursor.read_u64::<LittleEndian>()?);
		let tile_data = ByteRange::new(cursor.read_u64::<LittleEndian>()?, cursor.read_u64::<LittleEndian>()?);
		let tile_entries_count = cursor.read_u64::<LittleEndian>()?;

		let tile_type = TileType::from_u8(cursor.read_u8()?)?;
		let tile_compression = TileCompression::from_u8(cursor.read_u8()?)?;
		let min_zoom = cursor.read_u8()?;
		let max_zoom = cursor.read_u8()?;

		let min_lon_e7 = cursor.read_i32::<LittleEndian>()?;
		let min_lat_e7 = cursor.read_i32::<LittleEndian>()?;
		let max_lon_e7 = cursor.read_i32::<LittleEndian>()?;
		let max_lat_e7 = cursor.read_i32::<LittleEndian>()?;
		let bbox = GeoBBox::new(
			f64::from(min_lon_e7) / 1e7,
			f64::from(min_lat_e7) / 1e7,
			f64::from(max_lon_e7) / 1e7,
			f64::from(max_lat_e7) / 1e7,
		)?;

		let center_zoom = cursor.read_u8()?;
		// center_lon_e7/center_lat_e7 are derived from bbox on read; still consumed here so the
		// cursor stays aligned with `serialize`'s layout.
		let _center_lon_e7 = cursor.read_i32::<LittleEndian>()?;
		let _center_lat_e7 = cursor.read_i32::<LittleEndian>()?;

		Ok(Self { directory, metadata, tile_data, tile_entries_count, tile_type, tile_compression, min_zoom, max_zoom, bbox, center_zoom })
	}
}
