use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};
use satex::commands;

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
	/// Run stac, tile, schedule, and prepare in sequence
	Build(commands::build::Subcommand),

	/// Validate a fetched item collection into the dataset's catalog path
	Stac(commands::stac::Subcommand),

	/// Partition the region of interest into UTM tiles
	Tile(commands::tile::Subcommand),

	/// Build extraction tasks from tiles and the item collection
	Schedule(commands::schedule::Subcommand),

	/// Create the zarr archive skeleton for scheduled tasks
	Prepare(commands::prepare::Subcommand),

	/// Serialize extraction tasks into dispatch envelopes
	Deploy(commands::deploy::Subcommand),

	/// Run the Worker's HTTP dispatch server
	Serve(commands::serve::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).format_timestamp(None).init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Build(arguments) => commands::build::run(arguments),
		Commands::Stac(arguments) => commands::stac::run(arguments),
		Commands::Tile(arguments) => commands::tile::run(arguments),
		Commands::Schedule(arguments) => commands::schedule::run(arguments),
		Commands::Prepare(arguments) => commands::prepare::run(arguments),
		Commands::Deploy(arguments) => commands::deploy::run(arguments),
		Commands::Serve(arguments) => commands::serve::run(arguments),
	}
}
