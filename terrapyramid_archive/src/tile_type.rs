//! The tile payload media type an archive is fixed to at `begin` (spec §4.6, §6).

use anyhow::{Result, bail};

/// Media type of every tile payload stored in one archive. Set once at `begin` and recorded in
/// the header; mixing media types within an archive is not representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileType {
	Png = 0x1,
	WebP = 0x2,
}

impl TileType {
	pub fn from_u8(value: u8) -> Result<Self> {
		match value {
			0x1 => Ok(TileType::Png),
			0x2 => Ok(TileType::WebP),
			_ => bail!("unknown tile type byte {value}"),
		}
	}

	pub fn mime_type(&self) -> &'static str {
		match self {
			TileType::Png => "image/png",
			TileType::WebP => "image/webp",
		}
	}
}

/// Whether an archive's tile bytes carry an additional outer compression layer on top of their
/// own codec (spec §6: "the tile payload media type ... and its compression flag are set at
/// `begin`"). Terrarium tiles already carry the image codec's own compression, so this
/// pipeline always writes [`TileCompression::None`], but the field is part of the header
/// contract regardless.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileCompression {
	None = 0x1,
	Gzip = 0x2,
}

impl TileCompression {
	pub fn from_u8(value: u8) -> Result<Self> {
		match value {
			0x1 => Ok(TileCompression::None),
			0x2 => Ok(TileCompression::Gzip),
			_ => bail!("unknown tile compression byte {value}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_tile_type_bytes() {
		assert_eq!(TileType::from_u8(TileType::Png as u8).unwrap(), TileType::Png);
		assert_eq!(TileType::from_u8(TileType::WebP as u8).unwrap(), TileType::WebP);
		assert!(TileType::from_u8(0xFF).is_err());
	}

	#[test]
	fn round_trips_tile_compression_bytes() {
		assert_eq!(TileCompression::from_u8(TileCompression::None as u8).unwrap(), TileCompression::None);
		assert_eq!(TileCompression::from_u8(TileCompression::Gzip as u8).unwrap(), TileCompression::Gzip);
		assert!(TileCompression::from_u8(0xFF).is_err());
	}

	#[test]
	fn mime_type_matches_the_fixed_media_type() {
		assert_eq!(TileType::Png.mime_type(), "image/png");
	}
}
