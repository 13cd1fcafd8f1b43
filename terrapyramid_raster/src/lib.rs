//! The Raster Toolkit Facade (spec §4.2): a thin capability layer wrapping GDAL for virtual
//! mosaic assembly, warping, translating, windowed I/O, completeness checks and the
//! morphology/filtering primitives the Aggregation Engine's merge step needs.
//!
//! Isolation between concurrently running units comes from the Scheduler's
//! `spawn_blocking`-per-unit dispatch (each unit's GDAL calls run on their own blocking
//! thread) plus [`RasterConfig::apply`], called once per worker process to size GDAL's
//! own process-wide cache; there is no per-dataset object pool (spec §9 "Global state").

pub mod completeness;
pub mod config;
pub mod mosaic;
pub mod morphology;
pub mod terrarium;
pub mod translate;
pub mod warp;
pub mod window;

pub use completeness::is_complete;
pub use config::{GdalThreads, RasterConfig, RasterConfigBuilder};
pub use mosaic::VirtualMosaic;
pub use morphology::{binary_erosion, gaussian_filter};
pub use translate::{TranslateOptions, translate_to_tiled};
pub use warp::warp_to_mercator;
pub use window::{Window, read_window, write_window};
