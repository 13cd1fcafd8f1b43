//! The Tile Archive Writer (spec §4.6): a single-file tiled archive format keyed by a
//! deterministic `tile_id`, with a fixed header and a streaming writer enforcing strictly
//! ascending write order. Grounded on the teacher's PMTiles v3 format
//! (`versatiles_container::container::pmtiles`), simplified to a single flat directory since
//! this pipeline's archives (one per macrotile, or one per bundled region) never need the
//! teacher's root/leaf-directory split.

pub mod entry;
pub mod header;
pub mod reader;
pub mod tile_type;
pub mod writer;

pub use entry::TileEntry;
pub use header::{ArchiveHeader, ByteRange, HEADER_LEN};
pub use reader::ArchiveReader;
pub use tile_type::{TileCompression, TileType};
pub use writer::{ArchiveBeginFields, ArchiveWriter};
