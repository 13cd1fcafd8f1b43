//! Process-wide raster library configuration, built once per worker process and passed into
//! the Raster Toolkit Facade at initialization (spec §9 "Global state").

use gdal::config::set_config_option;

const DEFAULT_CACHE_MB: u32 = 512;

/// GDAL cache sizing and thread-count knobs, read from environment variables by the caller
/// (the Scheduler, once per worker process) and applied here via [`RasterConfig::apply`].
#[derive(Debug, Clone, Copy)]
pub struct RasterConfig {
	pub gdal_cache_mb: u32,
	pub gdal_threads: GdalThreads,
	pub silence_errors: bool,
}

/// How many threads GDAL's internal warp/IO machinery may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdalThreads {
	AllCpus,
	Fixed(u32),
}

impl RasterConfig {
	pub fn builder() -> RasterConfigBuilder {
		RasterConfigBuilder::new()
	}

    /// Reads `TERRAPYRAMID_GDAL_CACHE_MB` and `TERRAPYRAMID_GDAL_THREADS` from the process
    /// environment, falling back to the documented defaults.
	pub fn from_env() -> Self {
		let mut builder = RasterConfigBuilder::new();
		if let Ok(raw) = std::env::var("TERRAPYRAMID_GDAL_CACHE_MB")
			&& let Ok(mb) = raw.parse::<u32>()
		{
			builder = builder.gdal_cache_mb(mb);
		}
		if let Ok(raw) = std::env::var("TERRAPYRAMID_GDAL_THREADS") {
			builder = builder.gdal_threads(match raw.to_ascii_uppercase().as_str() {
				"ALL_CPUS" => GdalThreads::AllCpus,
				n => n.parse::<u32>().map(GdalThreads::Fixed).unwrap_or(GdalThreads::AllCpus),
			});
		}
		builder.build()
	}

	/// Applies this configuration to the current process's GDAL environment. Must be called
	/// once per worker process before any raster operation (spec §5 "Environment variables
	/// controlling raster library cache sizes are set per process").
	pub fn apply(&self) -> anyhow::Result<()> {
		set_config_option("GDAL_CACHEMAX", &self.gdal_cache_mb.to_string())?;
		let threads = match self.gdal_threads {
			GdalThreads::AllCpus => "ALL_CPUS".to_string(),
			GdalThreads::Fixed(n) => n.to_string(),
		};
		set_config_option("GDAL_NUM_THREADS", &threads)?;
		if self.silence_errors {
			set_config_option("CPL_LOG", "/dev/null")?;
		}
		log::trace!("RasterConfig applied: cache_mb={}, threads={threads}", self.gdal_cache_mb);
		Ok(())
	}
}

impl Default for RasterConfig {
	fn default() -> Self {
		Self { gdal_cache_mb: DEFAULT_CACHE_MB, gdal_threads: GdalThreads::AllCpus, silence_errors: false }
	}
}

pub struct RasterConfigBuilder {
	gdal_cache_mb: u32,
	gdal_threads: GdalThreads,
	silence_errors: bool,
}

impl RasterConfigBuilder {
	pub fn new() -> Self {
		let default = RasterConfig::default();
		Self { gdal_cache_mb: default.gdal_cache_mb, gdal_threads: default.gdal_threads, silence_errors: default.silence_errors }
	}

	pub fn gdal_cache_mb(mut self, mb: u32) -> Self {
		self.gdal_cache_mb = mb;
		self
	}

	pub fn gdal_threads(mut self, threads: GdalThreads) -> Self {
		self.gdal_threads = threads;
		self
	}

	pub fn silence_errors(mut self, silence: bool) -> Self {
		self.silence_errors = silence;
		self
	}

	pub fn build(self) -> RasterConfig {
		RasterConfig { gdal_cache_mb: self.gdal_cache_mb, gdal_threads: self.gdal_threads, silence_errors: self.silence_errors }
	}
}

impl Default for RasterConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config_uses_all_cpus() {
		let config = RasterConfig::default();
		assert_eq!(config.gdal_threads, GdalThreads::AllCpus);
		assert_eq!(config.gdal_cache_mb, DEFAULT_CACHE_MB);
	}

	#[test]
	fn builder_overrides_defaults() {
		let config = RasterConfig::builder().gdal_cache_mb(1024).gdal_threads(GdalThreads::Fixed(4)).build();
		assert_eq!(config.gdal_cache_mb, 1024);
		assert_eq!(config.gdal_threads, GdalThreads::Fixed(4));
	}

	#[test]
	fn from_env_reads_cache_mb() {
		unsafe {
			std::env::set_var("TERRAPYRAMID_GDAL_CACHE_MB", "256");
		}
		let config = RasterConfig::from_env();
		assert_eq!(config.gdal_cache_mb, 256);
		unsafe {
			std::env::remove_var("TERRAPYRAMID_GDAL_CACHE_MB");
		}
	}
}
