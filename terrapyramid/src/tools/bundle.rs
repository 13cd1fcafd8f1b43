//! `terrapyramid bundle`: the Bundle Assembler (spec §4.8). Joins every per-macrotile
//! archive under a store directory into one coarser regional archive.

use anyhow::{Context, Result};
use std::path::PathBuf;
use terrapyramid_pipeline::assemble_bundle;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory holding the per-macrotile `.tpyr` archives to join
	#[arg(long, value_name = "DIR")]
	store_dir: PathBuf,

	/// path the joined bundle archive is written to
	#[arg()]
	output_file: PathBuf,

	/// attribution string recorded in the bundle's metadata
	#[arg(long, value_name = "STRING", default_value = "")]
	attribution: String,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	log::info!("bundling archives under {} into {}", arguments.store_dir.display(), arguments.output_file.display());

	let checksum = assemble_bundle(&arguments.store_dir, &arguments.output_file, &arguments.attribution)
		.with_context(|| format!("assembling bundle at {}", arguments.output_file.display()))?;

	log::info!("bundle complete: md5 {checksum}");
	Ok(())
}
