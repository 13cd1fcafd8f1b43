//! Process-wide constants that affect pipeline behavior (spec §6).

/// Side length, in pixels, of one tile and of one merge processing block.
pub const TILE_SIZE: u32 = 512;

/// Nodata value used throughout internal elevation rasters.
pub const SENTINEL: f32 = -9999.0;

/// Half-extent of the Web Mercator plane, in meters.
pub const X_MAX: f64 = 20_037_508.342_789_244;

/// Maximum zoom level supported by the tile algebra and the Hilbert index.
pub const MAX_ZOOM_LEVEL: u8 = 24;

/// Macrotile halo constant `B`, in meters, used to compute the reprojection guard buffer.
pub const HALO_METERS: f64 = 2048.0;
