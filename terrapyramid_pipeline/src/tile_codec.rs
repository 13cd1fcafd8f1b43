//! Serializes one terrarium-encoded `TILE_SIZE x TILE_SIZE` RGBA elevation grid to the
//! archive's fixed tile media type (PNG) and back, grounded on the teacher's `img2png`/`png2img`
//! (`versatiles::utils::image`), specialized to a fixed-size RGBA buffer instead of a general
//! `DynamicImage`.

use anyhow::{Context, Result, ensure};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage, load_from_memory_with_format};
use terrapyramid_core::TILE_SIZE;

/// Encodes a `TILE_SIZE * TILE_SIZE` RGBA buffer (row-major, 4 bytes per pixel) as PNG bytes.
pub fn encode_png(rgba: &[u8]) -> Result<Vec<u8>> {
	let expected_len = (TILE_SIZE * TILE_SIZE * 4) as usize;
	ensure!(rgba.len() == expected_len, "expected {expected_len} RGBA bytes, got {}", rgba.len());

	let mut buffer = Vec::new();
	PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive)
		.write_image(rgba, TILE_SIZE, TILE_SIZE, ExtendedColorType::Rgba8)
		.context("encoding terrarium tile as PNG")?;
	Ok(buffer)
}

/// Decodes a PNG tile back into a `TILE_SIZE * TILE_SIZE` RGBA buffer.
pub fn decode_png(bytes: &[u8]) -> Result<Vec<u8>> {
	let image = load_from_memory_with_format(bytes, ImageFormat::Png).context("decoding PNG tile")?;
	ensure!(image.width() == TILE_SIZE && image.height() == TILE_SIZE, "tile has unexpected dimensions {}x{}", image.width(), image.height());
	let rgba: RgbaImage = image.to_rgba8();
	Ok(rgba.into_raw())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_a_flat_rgba_buffer() {
		let size = (TILE_SIZE * TILE_SIZE * 4) as usize;
		let mut rgba = vec![0u8; size];
		for (i, byte) in rgba.iter_mut().enumerate() {
			*byte = (i % 251) as u8;
		}
		let encoded = encode_png(&rgba).unwrap();
		let decoded = decode_png(&encoded).unwrap();
		assert_eq!(decoded, rgba);
	}

	#[test]
	fn rejects_wrong_sized_input() {
		assert!(encode_png(&[0u8; 4]).is_err());
	}
}
