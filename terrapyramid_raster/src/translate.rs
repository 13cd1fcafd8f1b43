//! Translate an in-memory raster to a tiled, sparse-capable output file (spec §4.2
//! "Translate"): `blocksize=512`, optionally with an alpha band, no overviews, sparse-OK, no
//! compression.

use anyhow::{Context, Result, bail};
use gdal::{Dataset, DriverManager};
use std::path::Path;
use terrapyramid_core::{ErrorKind, PipelineError};

#[derive(Debug, Clone, Copy)]
pub struct TranslateOptions {
	pub blocksize: u32,
	pub add_alpha: bool,
	pub sparse_ok: bool,
}

impl Default for TranslateOptions {
	fn default() -> Self {
		Self { blocksize: 512, add_alpha: false, sparse_ok: true }
	}
}

/// Writes `src` to `dst_path` as a tiled GeoTIFF per [`TranslateOptions`], with no
/// compression and no overview pyramid (spec §4.2: "no overviews").
pub fn translate_to_tiled(src: &Dataset, dst_path: &Path, options: TranslateOptions) -> Result<Dataset> {
	let driver = DriverManager::get_driver_by_name("GTiff").context("GTiff driver not available")?;

	let mut creation_options = vec![
		"TILED=YES".to_string(),
		format!("BLOCKXSIZE={}", options.blocksize),
		format!("BLOCKYSIZE={}", options.blocksize),
		"COMPRESS=NONE".to_string(),
	];
	if options.sparse_ok {
		creation_options.push("SPARSE_OK=YES".to_string());
	}
	if options.add_alpha {
		creation_options.push("ALPHA=YES".to_string());
	}
	let options_refs: Vec<&str> = creation_options.iter().map(String::as_str).collect();

	let dst = src
		.create_copy(&driver, dst_path, &options_refs)
		.map_err(|e| PipelineError::new(ErrorKind::TranslateFailed, e.to_string()))?;

	if !dst_path.exists() {
		bail!(PipelineError::new(ErrorKind::TranslateFailed, format!("translate produced no file at {}", dst_path.display())));
	}

	Ok(dst)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_options_match_the_spec_contract() {
		let options = TranslateOptions::default();
		assert_eq!(options.blocksize, 512);
		assert!(!options.add_alpha);
		assert!(options.sparse_ok);
	}
}
