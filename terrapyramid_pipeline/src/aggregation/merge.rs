//! The Merge operation (spec §4.4 "Operation: Merge"): seam-blends the `N` reprojected tiffs
//! produced by Reproject into one raster, processing it in `TILE_SIZE`-aligned blocks with a
//! haloed read window per block so the boundary between source groups never shows a visible
//! elevation step.

use anyhow::{Context, Result};
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, Zip, s};
use std::path::Path;
use terrapyramid_core::{SENTINEL, TILE_SIZE};
use terrapyramid_raster::{TranslateOptions, Window, binary_erosion, gaussian_filter, read_window, translate_to_tiled, write_window};

use super::reproject::ReprojectionRecord;
use crate::sentinel::{MacrotileKey, touch_sentinel};

/// Peak value of the continuous Gaussian kernel at its center, used to renormalize the blurred
/// boundary mask back to `[0, 1]` (spec §4.4 step 6: "divide by `1 / (√(2π)·sigma)`").
const SQRT_2PI: f64 = 2.506_628_274_631_000_7;

/// Runs the Merge step for `key`, given the `N` reprojected tiffs Reproject produced. No-op if
/// `merge-done` already exists. When `group_count <= 1` there is nothing to blend: the sentinel
/// is created immediately and tiff `0` remains the source Encode reads from directly.
pub fn merge(snapshot_dir: &Path, key: &MacrotileKey, record: &ReprojectionRecord, group_count: usize) -> Result<()> {
	let done_path = key.merge_done_path(snapshot_dir);
	if done_path.exists() {
		return Ok(());
	}

	if group_count <= 1 {
		touch_sentinel(&done_path)?;
		log::debug!("{}: single group, merge is a no-op", key.stem());
		return Ok(());
	}

	let tiffs: Vec<Dataset> = (0..group_count)
		.map(|i| Dataset::open(key.reprojected_tiff_path(snapshot_dir, i)).with_context(|| format!("opening reprojected group {i}")))
		.collect::<Result<_>>()?;

	let (width, height) = tiffs[0].raster_size();
	let driver = DriverManager::get_driver_by_name("MEM").context("MEM driver not available")?;
	let mut dst = driver.create_with_band_type::<f32, _>("", width, height, 1)?;
	dst.set_geo_transform(&tiffs[0].geo_transform()?)?;
	if let Ok(srs) = tiffs[0].spatial_ref() {
		dst.set_spatial_ref(&srs)?;
	}
	dst.rasterband(1)?.set_no_data_value(Some(f64::from(SENTINEL)))?;

	let overlap = record.buffer_pixels as isize;
	let block_size = TILE_SIZE as usize;

	let mut y = 0usize;
	while y < height {
		let block_h = block_size.min(height - y);
		let mut x = 0usize;
		while x < width {
			let block_w = block_size.min(width - x);

			let expanded = Window::new(
				x as isize - overlap,
				y as isize - overlap,
				block_w + 2 * overlap as usize,
				block_h + 2 * overlap as usize,
			)
			.clamp(width, height);

			let merged = merge_block(&tiffs, expanded, overlap)?;

			let inner_x = (x as isize - expanded.x_off) as usize;
			let inner_y = (y as isize - expanded.y_off) as usize;
			let interior = merged.slice(s![inner_y..inner_y + block_h, inner_x..inner_x + block_w]).to_owned();

			write_window(&dst, Window::new(x as isize, y as isize, block_w, block_h), &interior)?;
			x += block_w;
		}
		y += block_h;
	}

	let dst_path = key.merged_tiff_path(snapshot_dir, group_count);
	translate_to_tiled(&dst, &dst_path, TranslateOptions::default())?;
	touch_sentinel(&done_path)?;
	log::debug!("{}: merged {group_count} groups into {}", key.stem(), dst_path.display());
	Ok(())
}

/// Computes the merged elevations for one haloed block window (spec §4.4 step enumeration
/// under "Operation: Merge").
fn merge_block(tiffs: &[Dataset], window: Window, overlap: isize) -> Result<Array2<f32>> {
	let mut m = read_window(&tiffs[0], window)?;
	if !m.iter().any(|&v| v == SENTINEL) {
		return Ok(m);
	}

	let mask = m.mapv(|v| v != SENTINEL);
	let mut boundary = mask_boundary(&mask);

	for tiff in &tiffs[1..] {
		let c = read_window(tiff, window)?;
		Zip::from(&mut m).and(&c).for_each(|mv, &cv| {
			if *mv == SENTINEL && cv != SENTINEL {
				*mv = cv;
			}
		});

		let still_has_sentinel = m.iter().any(|&v| v == SENTINEL);
		let mask2 = m.mapv(|v| v != SENTINEL);
		boundary = &boundary | &mask_boundary(&mask2);
		if !still_has_sentinel {
			break;
		}
	}

	zero_outer_ring(&mut boundary);
	let valid = m.mapv(|v| v != SENTINEL);
	boundary = &boundary & &valid;

	if boundary.iter().any(|&b| b) {
		let sigma = (overlap as f64 / 4.0).floor() - 1.0;
		if sigma > 0.0 {
			let truncate = 4.0;
			let boundary_f = boundary.mapv(|b| if b { 1.0 } else { 0.0 });
			let mut bblur = gaussian_filter(&boundary_f, sigma, truncate);
			let peak = 1.0 / (SQRT_2PI * sigma);
			bblur.mapv_inplace(|v| (v / peak).clamp(0.0, 1.0));
			bblur.mapv_inplace(smoothstep);

			let m_f64 = m.mapv(f64::from);
			let mblur = gaussian_filter(&m_f64, sigma, truncate);

			Zip::from(&mut m).and(&bblur).and(&mblur).for_each(|mv, &b, &blurred| {
				*mv = (b * blurred + (1.0 - b) * f64::from(*mv)) as f32;
			});
		}
	}

	Ok(m)
}

fn mask_boundary(mask: &Array2<bool>) -> Array2<bool> {
	let eroded = binary_erosion(mask);
	Zip::from(mask).and(&eroded).map_collect(|&m, &e| m && !e)
}

fn zero_outer_ring(boundary: &mut Array2<bool>) {
	let (h, w) = boundary.dim();
	if h == 0 || w == 0 {
		return;
	}
	for x in 0..w {
		boundary[(0, x)] = false;
		boundary[(h - 1, x)] = false;
	}
	for y in 0..h {
		boundary[(y, 0)] = false;
		boundary[(y, w - 1)] = false;
	}
}

fn smoothstep(t: f64) -> f64 {
	3.0 * t * t - 2.0 * t * t * t
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn smoothstep_is_identity_at_the_endpoints() {
		assert_eq!(smoothstep(0.0), 0.0);
		assert_eq!(smoothstep(1.0), 1.0);
	}

	#[test]
	fn smoothstep_is_symmetric_around_one_half() {
		assert!((smoothstep(0.25) - (1.0 - smoothstep(0.75))).abs() < 1e-12);
	}

	#[test]
	fn zero_outer_ring_clears_only_the_border() {
		let mut boundary = Array2::from_elem((4, 4), true);
		zero_outer_ring(&mut boundary);
		assert!(boundary[(1, 1)]);
		assert!(!boundary[(0, 0)]);
		assert!(!boundary[(3, 3)]);
		assert!(!boundary[(0, 2)]);
	}

	#[test]
	fn mask_boundary_is_empty_for_a_single_interior_pixel() {
		let mut mask = Array2::from_elem((5, 5), false);
		mask[(2, 2)] = true;
		let boundary = mask_boundary(&mask);
		assert!(boundary[(2, 2)]);
	}
}
