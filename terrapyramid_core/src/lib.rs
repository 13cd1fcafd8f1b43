//! Shared geo primitives, error kinds, configuration and concurrency limits used by every
//! crate in the terrapyramid tile production pipeline.

pub mod concurrency;
pub mod constants;
pub mod error;
pub mod geo;
pub mod geo_bbox;
pub mod hilbert;
pub mod tile_id;

pub use concurrency::ConcurrencyLimits;
pub use constants::{SENTINEL, TILE_SIZE, X_MAX};
pub use error::{ErrorKind, PipelineError, is_interrupted};
pub use geo_bbox::GeoBBox;
pub use hilbert::HilbertIndex;
pub use tile_id::TileId;
