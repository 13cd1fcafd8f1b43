//! Re-exports the terrarium elevation codec so the Aggregation and Downsampling Engines share
//! one implementation (spec §4.5: "sharing the terrarium codec with `aggregation::encode`").

pub use terrapyramid_raster::terrarium::{TerrariumPixel, decode, encode};
