//! A WGS84 geographical bounding box, used for tile-archive headers (spec §4.6, §6).

use crate::error::{ErrorKind, PipelineError};
use anyhow::Result;

const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
const MAX_MERCATOR_LNG: f64 = 180.0;

/// A geographical bounding box `[west, south, east, north]` in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl GeoBBox {
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Self> {
		if x_min > x_max || y_min > y_max {
			return Err(PipelineError::new(
				ErrorKind::InvalidArgument,
				format!("degenerate bbox ({x_min}, {y_min}, {x_max}, {y_max})"),
			)
			.into());
		}
		Ok(Self { x_min, y_min, x_max, y_max })
	}

	/// Expands this bbox in place so it covers `other` as well.
	pub fn extend(&mut self, other: &GeoBBox) {
		self.x_min = self.x_min.min(other.x_min);
		self.y_min = self.y_min.min(other.y_min);
		self.x_max = self.x_max.max(other.x_max);
		self.y_max = self.y_max.max(other.y_max);
	}

	/// Clamps latitude to the Web Mercator domain; longitude is already `[-180, 180]` by
	/// construction of the tile algebra this bbox is derived from.
	pub fn limit_to_mercator(&mut self) {
		self.x_min = self.x_min.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.x_max = self.x_max.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.y_min = self.y_min.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
		self.y_max = self.y_max.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
	}

	/// Integer-encodes the bbox at 1e-7 degree resolution, the format the archive header
	/// carries (spec §6: `min_lon_e7, min_lat_e7, max_lon_e7, max_lat_e7`).
	pub fn as_e7(&self) -> [i32; 4] {
		[to_e7(self.x_min), to_e7(self.y_min), to_e7(self.x_max), to_e7(self.y_max)]
	}

	/// The WGS84 centroid of this bbox.
	pub fn center(&self) -> (f64, f64) {
		((self.x_min + self.x_max) / 2.0, (self.y_min + self.y_max) / 2.0)
	}
}

fn to_e7(degrees: f64) -> i32 {
	(degrees * 1e7).round() as i32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_degenerate_bbox() {
		assert!(GeoBBox::new(10.0, 0.0, 5.0, 1.0).is_err());
	}

	#[test]
	fn extend_grows_to_cover_both() {
		let mut a = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		let b = GeoBBox::new(-12.0, -3.0, 8.0, 6.0).unwrap();
		a.extend(&b);
		assert_eq!((a.x_min, a.y_min, a.x_max, a.y_max), (-12.0, -5.0, 10.0, 6.0));
	}

	#[test]
	fn as_e7_round_trips_within_one_unit() {
		let bbox = GeoBBox::new(-122.4194, 37.7749, -122.0, 38.0).unwrap();
        let e7 = bbox.as_e7();
		assert_eq!(e7[0], -1224194000);
		assert!((f64::from(e7[2]) / 1e7 - (-122.0)).abs() < 1e-6);
	}

	#[test]
	fn limit_to_mercator_clamps_latitude() {
		let mut bbox = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
		bbox.limit_to_mercator();
		assert!((bbox.y_min - (-MAX_MERCATOR_LAT)).abs() < 1e-9);
		assert!((bbox.y_max - MAX_MERCATOR_LAT).abs() < 1e-9);
	}

	#[test]
	fn center_is_the_midpoint() {
		let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		assert_eq!(bbox.center(), (0.0, 0.0));
	}
}
