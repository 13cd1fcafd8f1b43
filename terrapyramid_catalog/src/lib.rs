//! The Source Catalog Interface (spec §4.3): reads a per-macrotile plan file describing the
//! ordered groups of source rasters to merge.

pub mod plan;

pub use plan::{Plan, SourceGroup, SourceItem, get_grouped_source_items, load_plan};
