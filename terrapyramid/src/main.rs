// Entry point for the terrapyramid CLI: the Scheduler's external driver (spec §6 "CLI/
// environment"). The core pipeline interprets no CLI arguments directly; this binary just
// wires snapshot/store directories and a worker count onto the Scheduler and Aggregation/
// Downsampling/Bundle entry points.
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Discover dirty macrotiles in a snapshot and run Aggregation for each
	Aggregate(tools::aggregate::Subcommand),

	/// Build parent tiles by 2x2 averaging from a snapshot's aggregation archives
	Downsample(tools::downsample::Subcommand),

	/// Join per-macrotile archives into one regional archive
	Bundle(tools::bundle::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).format_timestamp(None).init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Aggregate(arguments) => tools::aggregate::run(arguments),
		Commands::Downsample(arguments) => tools::downsample::run(arguments),
		Commands::Bundle(arguments) => tools::bundle::run(arguments),
	}
}

#[cfg(test)]
mod tests {
	use crate::{Cli, run};
	use anyhow::Result;
	use clap::Parser;

	pub fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{:?}", cli);
		run(cli)?;
		Ok(msg)
	}

	#[test]
	fn help() {
		let err = run_command(vec!["terrapyramid"]).unwrap_err().to_string();
		assert!(err.contains("\nUsage: terrapyramid [OPTIONS] <COMMAND>"));
	}

	#[test]
	fn version() {
		let err = run_command(vec!["terrapyramid", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("terrapyramid "));
	}

	#[test]
	fn aggregate_subcommand_requires_arguments() {
		let err = run_command(vec!["terrapyramid", "aggregate"]).unwrap_err().to_string();
		assert!(err.starts_with("error:"));
	}

	#[test]
	fn downsample_subcommand_requires_arguments() {
		let err = run_command(vec!["terrapyramid", "downsample"]).unwrap_err().to_string();
		assert!(err.starts_with("error:"));
	}

	#[test]
	fn bundle_subcommand_requires_arguments() {
		let err = run_command(vec!["terrapyramid", "bundle"]).unwrap_err().to_string();
		assert!(err.starts_with("error:"));
	}
}
