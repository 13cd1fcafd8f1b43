//! Windowed read/write on a tiled raster (spec §4.2), letting callers process rasters larger
//! than memory by operating one window at a time.

use anyhow::{Context, Result};
use gdal::Dataset;
use gdal::raster::Buffer;
use ndarray::Array2;

/// An `(x_off, y_off, width, height)` pixel window into a raster's band 1.
#[derive(Debug, Clone, Copy)]
pub struct Window {
	pub x_off: isize,
	pub y_off: isize,
	pub width: usize,
	pub height: usize,
}

impl Window {
	pub fn new(x_off: isize, y_off: isize, width: usize, height: usize) -> Self {
		Self { x_off, y_off, width, height }
	}

	/// Clamps this window to the raster's `(raster_w, raster_h)` bounds, shrinking width and
	/// height as needed (spec §4.4 "clamped to the raster bounds").
	pub fn clamp(&self, raster_w: usize, raster_h: usize) -> Window {
		let x0 = self.x_off.max(0);
		let y0 = self.y_off.max(0);
		let x1 = (self.x_off + self.width as isize).min(raster_w as isize);
		let y1 = (self.y_off + self.height as isize).min(raster_h as isize);
		Window { x_off: x0, y_off: y0, width: (x1 - x0).max(0) as usize, height: (y1 - y0).max(0) as usize }
	}
}

/// Reads band 1 of `window` into a row-major `(height, width)` array of `f32` elevations.
pub fn read_window(dataset: &Dataset, window: Window) -> Result<Array2<f32>> {
	let band = dataset.rasterband(1).context("opening band 1 for windowed read")?;
	let buffer: Buffer<f32> = band
		.read_as(
			(window.x_off, window.y_off),
			(window.width, window.height),
			(window.width, window.height),
			None,
		)
		.context("windowed read failed")?;
	Array2::from_shape_vec((window.height, window.width), buffer.data().to_vec()).context("reshaping windowed read buffer")
}

/// Writes a `(height, width)` array back into band 1 of `dataset` at `window`'s offset. Only
/// `array`'s own dimensions are written; `window.width`/`window.height` are not consulted for
/// the write extent, only the offset (callers write the interior sub-array of an expanded
/// read, per the merge block contract in §4.4).
pub fn write_window(dataset: &Dataset, window: Window, array: &Array2<f32>) -> Result<()> {
	let (height, width) = array.dim();
	let mut band = dataset.rasterband(1).context("opening band 1 for windowed write")?;
	let mut buffer = Buffer::new((width, height), array.iter().copied().collect());
	band.write((window.x_off, window.y_off), (width, height), &mut buffer).context("windowed write failed")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamp_shrinks_window_at_the_raster_edge() {
		let window = Window::new(-10, -10, 30, 30);
		let clamped = window.clamp(20, 20);
		assert_eq!((clamped.x_off, clamped.y_off), (0, 0));
		assert_eq!((clamped.width, clamped.height), (20, 20));
	}

	#[test]
	fn clamp_is_identity_for_interior_windows() {
		let window = Window::new(5, 5, 10, 10);
		let clamped = window.clamp(100, 100);
		assert_eq!((clamped.x_off, clamped.y_off, clamped.width, clamped.height), (5, 5, 10, 10));
	}
}
