//! The Scheduler & Idempotency Layer (spec §4.7): diffs two plan snapshots to find dirty
//! work units, dispatches them to a bounded worker pool, and stages Downsampling behind its
//! children's completion.

pub mod diff;
pub mod dispatch;
pub mod downsample_plan;

pub use diff::{DirtyUnit, SnapshotDiff};
pub use dispatch::{DispatchReport, dispatch_aggregation, dispatch_downsampling, install_interrupt_handler};
pub use downsample_plan::DownsamplePlan;
