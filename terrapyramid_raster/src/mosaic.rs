//! Virtual mosaic assembly from an ordered list of source files (spec §4.2 "Assemble virtual
//! mosaic", §4.4 reproject step 2a). One [`SourceGroup`]'s files, assumed co-registered, are
//! combined into a single virtual raster that the warp step then reprojects as a unit.

use anyhow::{Context, Result, bail, ensure};
use gdal::Dataset;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use terrapyramid_core::{ErrorKind, PipelineError};

/// A virtual mosaic built from a list of co-registered source files.
pub struct VirtualMosaic {
	dataset: Dataset,
	/// The source file list this mosaic was built from, preserved for diagnostics and for
	/// the `i-file-list.txt` / `i.vrt` scratch artifacts (spec §6 filesystem layout).
	pub sources: Vec<PathBuf>,
}

impl VirtualMosaic {
	/// Builds an in-memory VRT mosaic over `sources`, in the order given (first file wins
	/// where inputs overlap, matching GDAL's `BuildVRT` default z-order).
	pub fn assemble(sources: &[PathBuf]) -> Result<Self> {
		ensure_sources_exist(sources)?;

		let c_sources: Vec<CString> = sources
			.iter()
			.map(|p| CString::new(p.to_string_lossy().as_bytes()).context("source path contains NUL byte"))
			.collect::<Result<_>>()?;
		let mut source_ptrs: Vec<*const std::os::raw::c_char> = c_sources.iter().map(|s| s.as_ptr()).collect();

		// SAFETY: `source_ptrs` outlives the call; GDALBuildVRT copies what it needs
		// internally. The returned handle is wrapped into a `Dataset` immediately.
		let dataset = unsafe {
			let h = gdal_sys::GDALBuildVRT(
				std::ptr::null(),
				source_ptrs.len() as std::os::raw::c_int,
				std::ptr::null_mut(),
				source_ptrs.as_mut_ptr(),
				std::ptr::null_mut(),
				std::ptr::null_mut(),
			);
			if h.is_null() {
				bail!(PipelineError::new(ErrorKind::WarpFailed, "GDALBuildVRT returned a null dataset"));
			}
			Dataset::from_c_dataset(h)
		};

		Ok(Self { dataset, sources: sources.to_vec() })
	}

	pub fn dataset(&self) -> &Dataset {
		&self.dataset
	}
}

fn ensure_sources_exist(sources: &[PathBuf]) -> Result<()> {
	if sources.is_empty() {
		bail!(PipelineError::new(ErrorKind::SourceMissing, "source group has no files"));
	}
	for path in sources {
		if !Path::new(path).exists() {
			bail!(PipelineError::new(ErrorKind::SourceMissing, format!("source raster not found: {}", path.display())));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_empty_source_list() {
		let err = VirtualMosaic::assemble(&[]).unwrap_err();
		assert!(err.to_string().contains("SourceMissing"));
	}

	#[test]
	fn rejects_missing_file() {
		let err = VirtualMosaic::assemble(&[PathBuf::from("/nonexistent/path/to/a.tif")]).unwrap_err();
		assert!(err.to_string().contains("SourceMissing"));
	}
}
