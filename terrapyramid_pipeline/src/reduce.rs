//! Shared SENTINEL-aware 2x2 mean reduction (spec §4.4 "averaged in 2x2 reductions", §4.5
//! "2x2 mean over valid pixels"), used by both the Encode and Downsampling operations so the
//! averaging rule is defined exactly once.

use ndarray::Array2;
use terrapyramid_core::SENTINEL;

/// Halves `grid`'s dimensions by averaging each non-overlapping 2x2 block, treating SENTINEL
/// as missing: a block's output is the mean of its non-SENTINEL members, or SENTINEL if all
/// four are SENTINEL. `grid`'s dimensions must be even.
pub fn mean_reduce_2x2(grid: &Array2<f32>) -> Array2<f32> {
	let (h, w) = grid.dim();
	debug_assert!(h % 2 == 0 && w % 2 == 0, "mean_reduce_2x2 requires even dimensions");
	let mut out = Array2::from_elem((h / 2, w / 2), SENTINEL);
	for y in 0..h / 2 {
		for x in 0..w / 2 {
			let samples =
				[grid[(2 * y, 2 * x)], grid[(2 * y, 2 * x + 1)], grid[(2 * y + 1, 2 * x)], grid[(2 * y + 1, 2 * x + 1)]];
			let valid: Vec<f32> = samples.iter().copied().filter(|&v| v != SENTINEL).collect();
			if !valid.is_empty() {
				out[(y, x)] = valid.iter().sum::<f32>() / valid.len() as f32;
			}
		}
	}
	out
}

/// Repeatedly halves `grid` until it reaches `(target, target)`, applying [`mean_reduce_2x2`]
/// at each step (spec §4.4: "to be averaged in 2x2 reductions to the tile's 512x512 grid").
pub fn reduce_to(grid: Array2<f32>, target: usize) -> Array2<f32> {
	let mut current = grid;
	while current.dim().0 > target {
		current = mean_reduce_2x2(&current);
	}
	current
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn averages_four_valid_pixels() {
		let grid = Array2::from_shape_vec((2, 2), vec![10.0, 20.0, 30.0, 40.0]).unwrap();
		let out = mean_reduce_2x2(&grid);
		assert_eq!(out[(0, 0)], 25.0);
	}

	#[test]
	fn ignores_sentinel_pixels_in_the_mean() {
		let grid = Array2::from_shape_vec((2, 2), vec![10.0, SENTINEL, 30.0, SENTINEL]).unwrap();
		let out = mean_reduce_2x2(&grid);
		assert_eq!(out[(0, 0)], 20.0);
	}

	#[test]
	fn all_sentinel_block_stays_sentinel() {
		let grid = Array2::from_elem((2, 2), SENTINEL);
		let out = mean_reduce_2x2(&grid);
		assert_eq!(out[(0, 0)], SENTINEL);
	}

	#[test]
	fn reduce_to_halves_repeatedly_until_target() {
		let grid = Array2::from_elem((8, 8), 5.0);
		let out = reduce_to(grid, 2);
		assert_eq!(out.dim(), (2, 2));
		assert_eq!(out[(0, 0)], 5.0);
	}
}
