//! The archive's tile directory (spec §4.6): a flat, ascending list of `(tile_id, offset,
//! length)` entries, grounded on the teacher's `EntriesV3`/`EntryV3`
//! (`versatiles_container::container::pmtiles::types::directory_v3`) but without that format's
//! root/leaf-directory split — this pipeline's archives are per-macrotile or per-region, small
//! enough that a single flat directory never needs to spill into leaves.

use anyhow::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// One directory entry: the tile's monotone id, its byte offset relative to the start of the
/// tile-data section, and its length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEntry {
	pub tile_id: u64,
	pub offset: u64,
	pub length: u64,
}

const ENTRY_LEN: usize = 8 + 8 + 8;

/// Serializes entries in the order given (callers are expected to have already enforced
/// ascending `tile_id`; this function does not re-validate order).
pub fn serialize_directory(entries: &[TileEntry]) -> Result<Vec<u8>> {
	let mut buf = Vec::with_capacity(entries.len() * ENTRY_LEN);
	for entry in entries {
		buf.write_u64::<LittleEndian>(entry.tile_id)?;
		buf.write_u64::<LittleEndian>(entry.offset)?;
		buf.write_u64::<LittleEndian>(entry.length)?;
	}
	Ok(buf)
}

pub fn deserialize_directory(bytes: &[u8]) -> Result<Vec<TileEntry>> {
	anyhow::ensure!(bytes.len() % ENTRY_LEN == 0, "directory length {} is not a multiple of entry size {ENTRY_LEN}", bytes.len());
	let mut cursor = Cursor::new(bytes);
	let mut entries = Vec::with_capacity(bytes.len() / ENTRY_LEN);
	while (cursor.position() as usize) < bytes.len() {
		let tile_id = cursor.read_u64::<LittleEndian>()?;
		let offset = cursor.read_u64::<LittleEndian>()?;
		let length = cursor.read_u64::<LittleEndian>()?;
		entries.push(TileEntry { tile_id, offset, length });
	}
	Ok(entries)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_a_list_of_entries() {
		let entries = vec![
			TileEntry { tile_id: 0, offset: 0, length: 40 },
			TileEntry { tile_id: 1, offset: 40, length: 55 },
			TileEntry { tile_id: 5, offset: 95, length: 12 },
		];
		let bytes = serialize_directory(&entries).unwrap();
		let parsed = deserialize_directory(&bytes).unwrap();
		assert_eq!(parsed, entries);
	}

	#[test]
	fn rejects_misaligned_byte_length() {
		assert!(deserialize_directory(&[0u8; 5]).is_err());
	}

	#[test]
	fn empty_directory_round_trips() {
		let bytes = serialize_directory(&[]).unwrap();
		assert!(deserialize_directory(&bytes).unwrap().is_empty());
	}
}
