//! WGS84 bounding box derivation for a macrotile, shared by the Encode and Downsampling
//! archive headers (spec §6: "header also carries ... integer-encoded bounding box").

use anyhow::Result;
use terrapyramid_core::geo::{mercator_to_lonlat, tile_bounds_merc};
use terrapyramid_core::{GeoBBox, TileId};

pub fn macrotile_geo_bbox(tile: TileId) -> Result<GeoBBox> {
	let bounds = tile_bounds_merc(tile)?;
	let (west, south) = mercator_to_lonlat(bounds.left, bounds.bottom);
	let (east, north) = mercator_to_lonlat(bounds.right, bounds.top);
	let mut bbox = GeoBBox::new(west, south, east, north)?;
	bbox.limit_to_mercator();
	Ok(bbox)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn root_tile_covers_the_full_mercator_extent() {
		let bbox = macrotile_geo_bbox(TileId::new(0, 0, 0).unwrap()).unwrap();
		assert!((bbox.x_min + 180.0).abs() < 1e-6);
		assert!((bbox.x_max - 180.0).abs() < 1e-6);
	}
}
