//! Morphology and filtering primitives on 2-D arrays (spec §4.2), matching `scipy.ndimage`
//! conventions closely enough for the merge blending contract (§4.4): `binary_erosion` with a
//! 3x3 cross structuring element, and `gaussian_filter` with reflect boundary handling.

use ndarray::Array2;

/// Erodes a boolean mask with scipy's default 3x3 cross structuring element
/// (`[[0,1,0],[1,1,1],[0,1,0]]`), treating out-of-bounds neighbors as `false` (scipy's
/// default `border_value=0` for `binary_erosion`).
pub fn binary_erosion(mask: &Array2<bool>) -> Array2<bool> {
	let (h, w) = mask.dim();
	let mut out = Array2::from_elem((h, w), false);
	for y in 0..h {
		for x in 0..w {
			if !mask[(y, x)] {
				continue;
			}
			let north = y > 0 && mask[(y - 1, x)];
			let south = y + 1 < h && mask[(y + 1, x)];
			let west = x > 0 && mask[(y, x - 1)];
			let east = x + 1 < w && mask[(y, x + 1)];
			out[(y, x)] = north && south && west && east;
		}
	}
	out
}

/// A separable Gaussian filter with reflect boundary handling (scipy's `mode="reflect"`,
/// i.e. `(d c b a | a b c d | d c b a)`), truncated at `truncate` standard deviations.
///
/// `sigma <= 0` is treated as a no-op (the input is returned unchanged), matching scipy's
/// behavior of skipping axes whose `sigma` is zero.
pub fn gaussian_filter(input: &Array2<f64>, sigma: f64, truncate: f64) -> Array2<f64> {
	if sigma <= 0.0 {
		return input.clone();
	}
	let kernel = gaussian_kernel(sigma, truncate);
	let horizontal = convolve_rows(input, &kernel);
	convolve_cols(&horizontal, &kernel)
}

fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
	let radius = (truncate * sigma + 0.5) as isize;
	let radius = radius.max(0);
	let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
	let mut sum = 0.0;
	for i in -radius..=radius {
		let x = i as f64;
		let v = (-0.5 * (x * x) / (sigma * sigma)).exp();
		kernel.push(v);
		sum += v;
	}
	for v in &mut kernel {
		*v /= sum;
	}
	kernel
}

/// Reflects an out-of-bounds index into `[0, len)` using scipy's `reflect` convention
/// (edge value duplicated: `d c b a | a b c d | d c b a`).
fn reflect_index(i: isize, len: usize) -> usize {
	if len == 1 {
		return 0;
	}
	let len = len as isize;
	let period = 2 * len;
	let mut m = i % period;
	if m < 0 {
		m += period;
	}
	if m < len { m as usize } else { (period - 1 - m) as usize }
}

fn convolve_rows(input: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
	let (h, w) = input.dim();
	let radius = (kernel.len() / 2) as isize;
	let mut out = Array2::zeros((h, w));
	for y in 0..h {
		for x in 0..w {
			let mut acc = 0.0;
			for (k, &weight) in kernel.iter().enumerate() {
				let dx = k as isize - radius;
				let xi = reflect_index(x as isize + dx, w);
				acc += input[(y, xi)] * weight;
			}
			out[(y, x)] = acc;
		}
	}
	out
}

fn convolve_cols(input: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
	let (h, w) = input.dim();
	let radius = (kernel.len() / 2) as isize;
	let mut out = Array2::zeros((h, w));
	for y in 0..h {
		for x in 0..w {
			let mut acc = 0.0;
			for (k, &weight) in kernel.iter().enumerate() {
				let dy = k as isize - radius;
				let yi = reflect_index(y as isize + dy, h);
				acc += input[(yi, x)] * weight;
			}
			out[(y, x)] = acc;
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn erosion_shrinks_a_solid_block_by_one_pixel_ring() {
		let mut mask = Array2::from_elem((5, 5), false);
		for y in 1..4 {
			for x in 1..4 {
				mask[(y, x)] = true;
			}
		}
		let eroded = binary_erosion(&mask);
		assert!(eroded[(2, 2)]);
		assert!(!eroded[(1, 1)]);
		assert_eq!(eroded.iter().filter(|&&v| v).count(), 1);
	}

	#[test]
	fn erosion_of_full_mask_respects_border_value_zero() {
		let mask = Array2::from_elem((3, 3), true);
		let eroded = binary_erosion(&mask);
		assert!(eroded[(1, 1)]);
		assert!(!eroded[(0, 0)]);
		assert!(!eroded[(0, 1)]);
	}

	#[test]
	fn gaussian_filter_is_a_no_op_for_zero_sigma() {
		let input = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
		let out = gaussian_filter(&input, 0.0, 4.0);
		assert_eq!(out, input);
	}

	#[test]
	fn gaussian_filter_preserves_a_constant_field() {
		let input = Array2::from_elem((9, 9), 5.0);
		let out = gaussian_filter(&input, 2.0, 4.0);
		for v in out.iter() {
			assert!((v - 5.0).abs() < 1e-9);
		}
	}

	#[test]
	fn gaussian_filter_smooths_an_impulse_symmetrically() {
		let mut input = Array2::zeros((9, 9));
		input[(4, 4)] = 1.0;
		let out = gaussian_filter(&input, 1.0, 4.0);
		assert!((out[(4, 3)] - out[(4, 5)]).abs() < 1e-12);
		assert!((out[(3, 4)] - out[(5, 4)]).abs() < 1e-12);
		assert!(out[(4, 4)] > out[(4, 3)]);
	}

	#[test]
	fn reflect_index_matches_scipy_reflect_convention() {
		assert_eq!(reflect_index(-1, 4), 0);
		assert_eq!(reflect_index(-2, 4), 1);
		assert_eq!(reflect_index(4, 4), 3);
		assert_eq!(reflect_index(5, 4), 2);
	}
}
