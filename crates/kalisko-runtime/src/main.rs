mod cli;
mod config;

use clap::Parser;
use cli::{Cli, Command, ModuleCommand};
use config::Config;
use kalisko_core::Runtime;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = match &cli.config {
		Some(path) => Config::load(path)?,
		None => Config::load_default_or_empty()?,
	};

	init_tracing(config.log_level.as_deref());

	let mut search_paths: Vec<PathBuf> = cli.search_paths.clone();
	search_paths.extend(config.search_paths.iter().cloned());
	if search_paths.is_empty() {
		search_paths.push(PathBuf::from("."));
	}

	let mut runtime = Runtime::new(search_paths);

	match cli.command.unwrap_or_default() {
		Command::Run { seed } => {
			let seed = if seed == "module_perform" { config.seed.clone().unwrap_or(seed) } else { seed };
			runtime.run(&seed)?;
		}
		Command::Module(ModuleCommand::List) => {
			for name in runtime.modules.active_modules() {
				println!("{name}");
			}
		}
		Command::Module(ModuleCommand::Request { name }) => {
			runtime.request_module(&name)?;
			runtime.shutdown();
		}
		Command::Module(ModuleCommand::Info { name }) => {
			runtime.request_module(&name)?;
			let metadata = runtime.modules.metadata(&name).expect("just requested");
			println!("{}: {} ({})", metadata.name, metadata.description, metadata.author);
			println!("version {} (compatible back to {})", metadata.version, metadata.bcversion);
			runtime.shutdown();
		}
		Command::Module(ModuleCommand::Revoke { name }) => {
			runtime.revoke_module(&name)?;
		}
		Command::Module(ModuleCommand::ForceUnload { name }) => {
			runtime.force_unload_module(&name)?;
		}
	}

	Ok(())
}

fn init_tracing(level: Option<&str>) {
	let filter = level
		.map(EnvFilter::new)
		.unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}
