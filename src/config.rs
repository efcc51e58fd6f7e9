//! Daemon configuration.
//!
//! ```yaml
//! family: ipv6
//! backlog: 128
//! linger_secs: 1
//! binds:
//!   - port: 6667
//!   - port: "6697"
//!     address: 127.0.0.1
//!     type: clients
//!   - port: 7000
//!     type: servers   # not ours, ignored by the binder
//! deny:
//!   - 192.0.2.0/24
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use crate::addr::{Cidr, Family};
use crate::bind::BindEntry;
use crate::socket::ListenerOptions;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse YAML config")]
	Yaml(#[from] serde_yaml::Error),

	#[error("failed to parse JSON config")]
	Json(#[from] serde_json::Error),

	#[error("invalid config: {0}")]
	Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
	/// Family for wildcard binds.
	#[serde(default)]
	pub family: Family,
	#[serde(default = "default_backlog")]
	pub backlog: i32,
	/// `null` disables SO_LINGER.
	#[serde(default = "default_linger")]
	pub linger_secs: Option<u32>,
	/// Declared order is bind order.
	#[serde(default)]
	pub binds: Vec<BindEntry>,
	/// CIDR masks whose connections are dropped on accept.
	#[serde(default)]
	pub deny: Vec<String>,
}

fn default_backlog() -> i32 {
	128
}

fn default_linger() -> Option<u32> {
	Some(1)
}

impl Default for Config {
	fn default() -> Self {
		Self {
			family: Family::default(),
			backlog: default_backlog(),
			linger_secs: default_linger(),
			binds: Vec::new(),
			deny: Vec::new(),
		}
	}
}

impl Config {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.backlog <= 0 {
			return Err(ConfigError::Invalid(format!("backlog must be positive, got {}", self.backlog)));
		}
		if let Some(secs) = self.linger_secs {
			if libc::c_int::try_from(secs).is_err() {
				return Err(ConfigError::Invalid(format!("linger_secs {secs} is too large")));
			}
		}
		self.deny_list()?;
		Ok(())
	}

	pub fn listener_options(&self) -> ListenerOptions {
		ListenerOptions {
			family: self.family,
			backlog: self.backlog,
			linger_secs: self.linger_secs,
		}
	}

	pub fn deny_list(&self) -> Result<Vec<Cidr>, ConfigError> {
		self.deny
			.iter()
			.map(|mask| Cidr::parse(mask).map_err(|e| ConfigError::Invalid(e.to_string())))
			.collect()
	}
}

/// Load configuration from a file (YAML or JSON, by extension).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
	let path = path.as_ref();
	let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;

	let config: Config = match path.extension().and_then(|s| s.to_str()) {
		Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
		_ => serde_json::from_str(&contents)?,
	};

	config.validate()?;
	Ok(config)
}
