//! Web Mercator tile algebra (spec §4.1): tile ↔ projected bounds, resolution at zoom.
//!
//! All operations are pure and defined for `z` in `[0, MAX_ZOOM_LEVEL]`; the `TileId`
//! constructors already reject out-of-range coordinates, so this module assumes a valid
//! [`TileId`] and only validates the stray `z`-only entry points.

use crate::constants::{MAX_ZOOM_LEVEL, TILE_SIZE, X_MAX};
use crate::error::{ErrorKind, PipelineError};
use crate::tile_id::TileId;
use anyhow::Result;

/// Projected bounds `(left, bottom, right, top)` in Web Mercator meters (EPSG:3857).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorBounds {
	pub left: f64,
	pub bottom: f64,
	pub right: f64,
	pub top: f64,
}

impl MercatorBounds {
	/// Expands the bounds outward on all four sides by `buffer` projected units.
	pub fn expand(&self, buffer: f64) -> MercatorBounds {
		MercatorBounds { left: self.left - buffer, bottom: self.bottom - buffer, right: self.right + buffer, top: self.top + buffer }
	}

	pub fn width(&self) -> f64 {
		self.right - self.left
	}

	pub fn height(&self) -> f64 {
		self.top - self.bottom
	}
}

/// Converts Web Mercator meters to WGS84 degrees, the inverse of the projection the archive
/// header's bounding box is recorded in (spec §6: "integer-encoded bounding box").
pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
	let lon = x / X_MAX * 180.0;
	let lat_merc = y / X_MAX * 180.0;
	let lat = 180.0 / std::f64::consts::PI * (2.0 * (lat_merc * std::f64::consts::PI / 180.0).exp().atan() - std::f64::consts::PI / 2.0);
	(lon, lat)
}

/// Linear resolution in meters-per-pixel at zoom `z`, for the pipeline's fixed `TILE_SIZE`.
///
/// `R(z) = (2 * X_MAX) / (TILE_SIZE * 2^z)`
pub fn resolution(z: u8) -> Result<f64> {
	if z > MAX_ZOOM_LEVEL {
		return Err(PipelineError::new(ErrorKind::InvalidArgument, format!("zoom {z} exceeds max zoom {MAX_ZOOM_LEVEL}")).into());
	}
	Ok((2.0 * X_MAX) / (f64::from(TILE_SIZE) * f64::from(1u32 << z)))
}

/// Projected Web Mercator bounds of a tile, handling the standard XYZ convention where `y`
/// grows south (so `y=0` is the northernmost row).
pub fn tile_bounds_merc(tile: TileId) -> Result<MercatorBounds> {
	let size = tile.axis_size();
	let tile_span = (2.0 * X_MAX) / f64::from(size);
	let left = -X_MAX + f64::from(tile.x) * tile_span;
	let top = X_MAX - f64::from(tile.y) * tile_span;
	Ok(MercatorBounds { left, bottom: top - tile_span, right: left + tile_span, top })
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn resolution_halves_per_zoom_level() {
		let r0 = resolution(0).unwrap();
		let r1 = resolution(1).unwrap();
		assert!((r0 / 2.0 - r1).abs() < 1e-9);
	}

	#[test]
	fn resolution_rejects_out_of_range_zoom() {
		assert!(resolution(MAX_ZOOM_LEVEL + 1).is_err());
	}

	#[test]
	fn root_tile_covers_the_whole_mercator_plane() {
		let tile = TileId::new(0, 0, 0).unwrap();
		let bounds = tile_bounds_merc(tile).unwrap();
		assert!((bounds.left + X_MAX).abs() < 1e-6);
		assert!((bounds.right - X_MAX).abs() < 1e-6);
		assert!((bounds.top - X_MAX).abs() < 1e-6);
		assert!((bounds.bottom + X_MAX).abs() < 1e-6);
	}

	#[rstest]
	#[case(1, 0, 0)]
	#[case(1, 1, 0)]
	#[case(1, 0, 1)]
	#[case(1, 1, 1)]
	fn zoom1_quadrants_tile_the_plane_without_gaps(#[case] z: u8, #[case] x: u32, #[case] y: u32) {
		let tile = TileId::new(z, x, y).unwrap();
		let bounds = tile_bounds_merc(tile).unwrap();
		assert!((bounds.width() - X_MAX).abs() < 1e-6);
		assert!((bounds.height() - X_MAX).abs() < 1e-6);
	}

	#[test]
	fn children_bounds_partition_the_parent_bounds() {
		let parent = TileId::new(4, 3, 5).unwrap();
		let parent_bounds = tile_bounds_merc(parent).unwrap();
		let children = parent.children(5).unwrap();
		let mut min_left = f64::MAX;
		let mut max_right = f64::MIN;
		let mut min_bottom = f64::MAX;
		let mut max_top = f64::MIN;
		for child in children {
			let b = tile_bounds_merc(child).unwrap();
			min_left = min_left.min(b.left);
			max_right = max_right.max(b.right);
			min_bottom = min_bottom.min(b.bottom);
			max_top = max_top.max(b.top);
		}
		assert!((min_left - parent_bounds.left).abs() < 1e-6);
		assert!((max_right - parent_bounds.right).abs() < 1e-6);
		assert!((min_bottom - parent_bounds.bottom).abs() < 1e-6);
		assert!((max_top - parent_bounds.top).abs() < 1e-6);
	}

	#[test]
	fn mercator_to_lonlat_round_trips_the_root_tile_extent() {
		let (lon, lat) = mercator_to_lonlat(X_MAX, X_MAX);
		assert!((lon - 180.0).abs() < 1e-6);
		assert!((lat - 85.051_128_779_806_59).abs() < 1e-6);
	}

	#[test]
	fn mercator_to_lonlat_origin_is_null_island() {
		let (lon, lat) = mercator_to_lonlat(0.0, 0.0);
		assert!(lon.abs() < 1e-9);
		assert!(lat.abs() < 1e-9);
	}

	#[test]
	fn expand_grows_bounds_on_all_sides() {
		let tile = TileId::new(3, 2, 2).unwrap();
		let bounds = tile_bounds_merc(tile).unwrap();
		let expanded = bounds.expand(100.0);
		assert!((expanded.left - (bounds.left - 100.0)).abs() < 1e-9);
		assert!((expanded.right - (bounds.right + 100.0)).abs() < 1e-9);
		assert!((expanded.top - (bounds.top + 100.0)).abs() < 1e-9);
		assert!((expanded.bottom - (bounds.bottom - 100.0)).abs() < 1e-9);
	}
}
