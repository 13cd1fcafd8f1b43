//! The Aggregation Engine, Downsampling Engine, Tile Archive encoding glue, and Bundle
//! Assembler: the tile-production stages the Scheduler drives for each dirty work unit
//! (spec §2 components 4, 5, 6, 8).

pub mod aggregation;
pub mod bbox;
pub mod bundle;
pub mod downsample;
pub mod reduce;
pub mod sentinel;
pub mod terrarium;
pub mod tile_codec;

pub use aggregation::run_aggregation;
pub use bundle::assemble_bundle;
pub use downsample::downsample_tile;
pub use sentinel::{MacrotileKey, UnitState, probe_aggregation_state};
