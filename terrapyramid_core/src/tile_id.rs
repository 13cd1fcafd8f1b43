use crate::constants::MAX_ZOOM_LEVEL;
use crate::error::{ErrorKind, PipelineError};
use anyhow::Result;
use std::fmt;

/// A Web Mercator tile coordinate `(z, x, y)` with standard XYZ indexing (`y` grows south).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
	pub z: u8,
	pub x: u32,
	pub y: u32,
}

impl TileId {
	/// Builds a tile id, failing if `z` is outside `[0, MAX_ZOOM_LEVEL]` or `x`/`y` are out of
	/// range for that zoom.
	pub fn new(z: u8, x: u32, y: u32) -> Result<Self> {
		if z > MAX_ZOOM_LEVEL {
			return Err(PipelineError::new(ErrorKind::InvalidArgument, format!("zoom {z} exceeds max zoom {MAX_ZOOM_LEVEL}")).into());
		}
		let size = 1u32 << z;
		if x >= size || y >= size {
			return Err(PipelineError::new(
				ErrorKind::InvalidArgument,
				format!("tile {z}/{x}/{y} outside zoom level bounds (size={size})"),
			)
			.into());
		}
		Ok(Self { z, x, y })
	}

	/// Number of tiles per axis at this tile's zoom level (`2^z`).
	pub fn axis_size(&self) -> u32 {
		1u32 << self.z
	}

	/// Returns the tile containing this tile's top-left corner at `parent_z <= self.z`.
	pub fn parent(&self, parent_z: u8) -> Result<TileId> {
		if parent_z > self.z {
			return Err(PipelineError::new(
				ErrorKind::InvalidArgument,
				format!("parent zoom {parent_z} must be <= tile zoom {}", self.z),
			)
			.into());
		}
		let shift = self.z - parent_z;
		TileId::new(parent_z, self.x >> shift, self.y >> shift)
	}

	/// Returns all `4^(target_z - z)` descendants of this tile at `target_z >= self.z`, in
	/// row-major order.
	pub fn children(&self, target_z: u8) -> Result<Vec<TileId>> {
		if target_z < self.z {
			return Err(PipelineError::new(
				ErrorKind::InvalidArgument,
				format!("target zoom {target_z} must be >= tile zoom {}", self.z),
			)
			.into());
		}
		if target_z > MAX_ZOOM_LEVEL {
			return Err(PipelineError::new(ErrorKind::InvalidArgument, format!("zoom {target_z} exceeds max zoom {MAX_ZOOM_LEVEL}")).into());
		}
		let shift = target_z - self.z;
		let span = 1u32 << shift;
		let x0 = self.x << shift;
		let y0 = self.y << shift;
		let mut out = Vec::with_capacity((span as usize) * (span as usize));
		for dy in 0..span {
			for dx in 0..span {
				out.push(TileId { z: target_z, x: x0 + dx, y: y0 + dy });
			}
		}
		Ok(out)
	}

	/// All descendants across the inclusive zoom range `[self.z, child_z]`, ordered by zoom then
	/// row-major within zoom. This is the tile set an aggregation macrotile's archive must contain.
	pub fn descendants_through(&self, child_z: u8) -> Result<Vec<TileId>> {
		let mut out = Vec::new();
		for z in self.z..=child_z {
			out.extend(self.children(z)?);
		}
		Ok(out)
	}
}

impl fmt::Display for TileId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}-{}", self.z, self.x, self.y)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn rejects_out_of_range_zoom() {
		assert!(TileId::new(MAX_ZOOM_LEVEL + 1, 0, 0).is_err());
	}

	#[test]
	fn rejects_out_of_range_xy() {
		assert!(TileId::new(2, 4, 0).is_err());
		assert!(TileId::new(2, 0, 4).is_err());
		assert!(TileId::new(2, 3, 3).is_ok());
	}

	#[rstest]
	#[case(0, 0, 0, 2, 16)]
	#[case(3, 2, 1, 5, 64)]
	fn children_count_is_4_pow_delta(#[case] z: u8, #[case] x: u32, #[case] y: u32, #[case] target_z: u8, #[case] expected: usize) {
		let tile = TileId::new(z, x, y).unwrap();
		assert_eq!(tile.children(target_z).unwrap().len(), expected);
	}

	#[test]
	fn children_then_parent_roundtrips() {
		let tile = TileId::new(5, 11, 22).unwrap();
		for child in tile.children(8).unwrap() {
			assert_eq!(child.parent(5).unwrap(), tile);
		}
	}

	#[test]
	fn descendants_through_matches_bijection_invariant() {
		let tile = TileId::new(12, 2130, 1459).unwrap();
		let descendants = tile.descendants_through(17).unwrap();
		// 4^0 + 4^1 + ... + 4^5 = 1365
		assert_eq!(descendants.len(), 1365);
	}

	#[test]
	fn display_matches_sentinel_filename_convention() {
		let tile = TileId::new(12, 2130, 1459).unwrap();
		assert_eq!(tile.to_string(), "12-2130-1459");
	}
}
