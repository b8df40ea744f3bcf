use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kalisko", about = "Dynamic module runtime host", version)]
pub struct Cli {
	/// Extra directories to search for module libraries, tried before the
	/// directory the config file points at.
	#[arg(long = "search-path", value_name = "DIR")]
	pub search_paths: Vec<PathBuf>,

	/// Path to a TOML config file. Defaults to `./kalisko.toml` if present.
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Request `seed` and run the event loop until no timers remain
	/// pending. This is the default when no subcommand is given.
	Run {
		/// Root module to request at startup.
		#[arg(default_value = "module_perform")]
		seed: String,
	},
	/// Module graph inspection and one-off lifecycle operations, without
	/// running the event loop.
	#[command(subcommand)]
	Module(ModuleCommand),
}

#[derive(Subcommand, Debug)]
pub enum ModuleCommand {
	/// List every module currently active in the graph, other than `core`.
	List,
	/// Request a module and its dependency subgraph, then immediately
	/// shut it back down.
	Request { name: String },
	/// Print a module's declared metadata after loading it.
	Info { name: String },
	/// Revoke a previously requested module, releasing the graph's own
	/// reference to it.
	Revoke { name: String },
	/// Unconditionally tear down a module and its dependents, regardless
	/// of remaining reference count.
	ForceUnload { name: String },
}

impl Default for Command {
	fn default() -> Self {
		Command::Run { seed: "module_perform".to_string() }
	}
}
