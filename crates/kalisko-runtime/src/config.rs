use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
	#[serde(default)]
	pub search_paths: Vec<PathBuf>,
	pub seed: Option<String>,
	pub log_level: Option<String>,
}

impl Config {
	pub fn load(path: &Path) -> anyhow::Result<Config> {
		let text = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path:?}: {e}"))?;
		let config: Config = toml::from_str(&text).map_err(|e| anyhow::anyhow!("parsing {path:?}: {e}"))?;
		Ok(config)
	}

	/// `./kalisko.toml` if present, otherwise the defaults.
	pub fn load_default_or_empty() -> anyhow::Result<Config> {
		let default_path = PathBuf::from("kalisko.toml");
		if default_path.exists() {
			Config::load(&default_path)
		} else {
			Ok(Config::default())
		}
	}
}
