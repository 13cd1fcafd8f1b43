//! Tile completeness check (spec §4.2): scan a raster in blocks and report whether any pixel
//! equals SENTINEL. Used by the Reproject step's early-stop (§4.4 step 2d).

use crate::window::{Window, read_window};
use anyhow::Result;
use gdal::Dataset;
use terrapyramid_core::SENTINEL;

/// Returns `true` if `dataset`'s band 1 contains no SENTINEL pixel anywhere, scanning in
/// `block_size`-pixel chunks so the check works on rasters larger than memory.
pub fn is_complete(dataset: &Dataset, block_size: usize) -> Result<bool> {
	let (w, h) = dataset.raster_size();
	let mut y = 0usize;
	while y < h {
		let height = block_size.min(h - y);
		let mut x = 0usize;
		while x < w {
			let width = block_size.min(w - x);
			let window = Window::new(x as isize, y as isize, width, height);
			let block = read_window(dataset, window)?;
			if block.iter().any(|&v| v == SENTINEL) {
				return Ok(false);
			}
			x += width;
		}
		y += height;
	}
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use gdal::DriverManager;

	fn mem_dataset_filled(w: usize, h: usize, value: f32) -> Dataset {
		let driver = DriverManager::get_driver_by_name("MEM").unwrap();
		let ds = driver.create_with_band_type::<f32, _>("", w, h, 1).unwrap();
		let band = ds.rasterband(1).unwrap();
		let mut buffer = gdal::raster::Buffer::new((w, h), vec![value; w * h]);
		band.write((0, 0), (w, h), &mut buffer).unwrap();
		ds
	}

	#[test]
	fn complete_raster_has_no_sentinel() {
		let ds = mem_dataset_filled(16, 16, 100.0);
		assert!(is_complete(&ds, 8).unwrap());
	}

	#[test]
	fn raster_with_any_sentinel_pixel_is_incomplete() {
		let ds = mem_dataset_filled(16, 16, 100.0);
		let band = ds.rasterband(1).unwrap();
		let mut buffer = gdal::raster::Buffer::new((1, 1), vec![SENTINEL]);
		band.write((3, 3), (1, 1), &mut buffer).unwrap();
		assert!(!is_complete(&ds, 8).unwrap());
	}
}
