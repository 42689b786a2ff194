#![allow(missing_docs)]

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "uaview", about = "OPC UA data type inspection tools")]
struct Cli {
	/// Raise log verbosity (`-v` debug, `-vv` trace); `RUST_LOG` takes precedence.
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// List the types of a schema.
	Types(cmd::types::Args),
	/// Show the member layout of one type.
	Layout(cmd::layout::Args),
	/// Construct, mutate and render a value.
	New(cmd::build::Args),
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "uaview=debug,uaview_cli=debug",
		_ => "uaview=trace,uaview_cli=trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(command: Commands) -> uaview::ua::Result<()> {
	match command {
		Commands::Types(args) => cmd::types::run(args),
		Commands::Layout(args) => cmd::layout::run(args),
		Commands::New(args) => cmd::build::run(args),
	}
}
