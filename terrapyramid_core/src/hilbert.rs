//! Hilbert-curve tile indexing, the monotone `tile_id` function adopted for the archive
//! writer (spec §4.6, §11 "Tile-id function").

use crate::tile_id::TileId;
use anyhow::{Result, bail};

/// A bijection between a [`TileId`] and a `u64` that is monotone and Hilbert-ordered within
/// each zoom level, with a cumulative `4^z` offset so indices never collide across zooms.
pub trait HilbertIndex {
	fn hilbert_index(&self) -> Result<u64>;
	fn from_hilbert_index(index: u64) -> Result<Self>
	where
		Self: Sized;
}

impl HilbertIndex for TileId {
	fn hilbert_index(&self) -> Result<u64> {
		coord_to_index(self.x, self.y, self.z)
	}

	fn from_hilbert_index(index: u64) -> Result<Self> {
		index_to_coord(index)
	}
}

fn coord_to_index(x: u32, y: u32, z: u8) -> Result<u64> {
	if z >= 32 {
		bail!("tile zoom exceeds 64-bit Hilbert index limit");
	}
	let n = 1u32 << z;
	if x >= n || y >= n {
		bail!("tile x/y outside zoom level bounds");
	}

	let mut acc: i64 = 0;
	for t_z in 0..i64::from(z) {
		acc += 1i64 << (t_z * 2);
	}

	let mut tx = i64::from(x);
	let mut ty = i64::from(y);
	let mut d: i64 = 0;
	let mut s = i64::from(n) / 2;
	while s > 0 {
		let rx: u8 = u8::from((tx & s) > 0);
		let ry: u8 = u8::from((ty & s) > 0);
		d += s * s * i64::from((3 * rx) ^ ry);
		rotate(s, &mut tx, &mut ty, rx, ry);
		s /= 2;
	}

	Ok((acc + d) as u64)
}

fn rotate(s: i64, tx: &mut i64, ty: &mut i64, rx: u8, ry: u8) {
	if ry == 0 {
		if rx == 1 {
			*tx = s - 1 - *tx;
			*ty = s - 1 - *ty;
		}
		std::mem::swap(tx, ty);
	}
}

fn index_to_coord(index: u64) -> Result<TileId> {
	let mut acc: u64 = 0;
	for t_z in 0..32u8 {
		let num_tiles: u64 = (1u64 << t_z) * (1u64 << t_z);
		if acc + num_tiles > index {
			let n: i64 = 1i64 << t_z;
			let mut t = index - acc;
			let mut tx: i64 = 0;
			let mut ty: i64 = 0;

			let mut s: i64 = 1;
			while s < n {
				let rx = ((t / 2) & 1) as u8;
				let ry = ((t ^ u64::from(rx)) & 1) as u8;
				rotate(s, &mut tx, &mut ty, rx, ry);
				if rx == 1 {
					tx += s;
				}
				if ry == 1 {
					ty += s;
				}
				t /= 4;
				s *= 2;
			}

			return TileId::new(t_z, tx as u32, ty as u32);
		}
		acc += num_tiles;
	}
	bail!("tile zoom exceeds 64-bit Hilbert index limit")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn basic_coordinates() {
		assert_eq!(coord_to_index(1, 1, 1).unwrap(), 3);
		assert_eq!(coord_to_index(0, 0, 0).unwrap(), 0);
		assert_eq!(coord_to_index(2, 2, 2).unwrap(), 13);
		assert_eq!(coord_to_index(5, 3, 3).unwrap(), 73);
		assert_eq!(coord_to_index(7, 7, 3).unwrap(), 63);
	}

	#[test]
	fn rejects_zoom_at_the_64_bit_limit() {
		assert!(coord_to_index(1, 1, 32).is_err());
	}

	#[test]
	fn rejects_out_of_bounds_coordinates() {
		assert!(coord_to_index(1, 0, 0).is_err());
	}

	#[test]
	fn round_trips_through_tile_id() {
		let tile = TileId::new(12, 2130, 1459).unwrap();
		let index = tile.hilbert_index().unwrap();
		assert_eq!(TileId::from_hilbert_index(index).unwrap(), tile);
	}

	#[test]
	fn is_monotone_within_a_zoom_across_children_order() {
		let parent = TileId::new(10, 3, 7).unwrap();
		let children = parent.children(11).unwrap();
		let mut indices: Vec<u64> = children.iter().map(|c| c.hilbert_index().unwrap()).collect();
		let mut sorted = indices.clone();
		sorted.sort_unstable();
		indices.sort_unstable();
		assert_eq!(indices, sorted);
	}

	#[test]
	fn indices_never_collide_across_zoom_levels() {
		let a = TileId::new(0, 0, 0).unwrap();
		let b = TileId::new(1, 0, 0).unwrap();
		assert_ne!(a.hilbert_index().unwrap(), b.hilbert_index().unwrap());
		assert_eq!(a.hilbert_index().unwrap(), 0);
		assert_eq!(b.hilbert_index().unwrap(), 1);
	}
}
