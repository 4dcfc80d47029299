//! Configuration for the ramp pipeline.
//!
//! Loaded from a single TOML file (or string) with `${ENV_VAR}` and
//! `${ENV_VAR:-default}` placeholders resolved against the process
//! environment. Validation runs at parse time so misconfiguration
//! surfaces before any network call is made.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// File I/O failure.
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	/// TOML parsing failure.
	#[error("configuration error: {0}")]
	Parse(String),
	/// Semantic validation failure.
	#[error("validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Payment-ledger network identity.
	pub stellar: StellarConfig,
	/// Substrate chain binding for extrinsic signing.
	pub substrate: SubstrateConfig,
	/// Base URLs of the external services.
	pub services: ServicesConfig,
	/// Poll and refresh cadence of the recurring operations.
	#[serde(default)]
	pub monitoring: MonitoringConfig,
}

/// Payment-ledger network identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StellarConfig {
	/// Network passphrase transactions are signed under.
	pub network_passphrase: String,
}

/// Substrate chain binding.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubstrateConfig {
	/// Genesis hash, 0x-prefixed 32-byte hex.
	pub genesis_hash: String,
	/// Runtime spec version the signature commits to.
	pub spec_version: u32,
	/// Transaction version the signature commits to.
	pub transaction_version: u32,
}

impl SubstrateConfig {
	/// Decodes the configured genesis hash.
	pub fn genesis_hash_bytes(&self) -> Result<[u8; 32], ConfigError> {
		let bytes = hex::decode(self.genesis_hash.trim_start_matches("0x"))
			.map_err(|e| ConfigError::Validation(format!("genesis_hash: {e}")))?;
		bytes
			.try_into()
			.map_err(|_| ConfigError::Validation("genesis_hash must be 32 bytes".into()))
	}
}

/// External service endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServicesConfig {
	/// Registration/execution service base URL.
	pub registrar_url: String,
	/// KYC status service base URL.
	pub kyc_url: String,
	/// Anchor base URL for redemption rails.
	pub anchor_url: String,
}

/// Cadence of the recurring operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
	/// Seconds between KYC status polls.
	pub kyc_poll_interval_secs: u64,
	/// Seconds between anchor interactive-URL refreshes.
	pub anchor_refresh_interval_secs: u64,
}

impl Default for MonitoringConfig {
	fn default() -> Self {
		Self {
			kyc_poll_interval_secs: 5,
			anchor_refresh_interval_secs: 20,
		}
	}
}

impl Config {
	/// Loads configuration from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.stellar.network_passphrase.is_empty() {
			return Err(ConfigError::Validation(
				"stellar.network_passphrase must not be empty".into(),
			));
		}
		self.substrate.genesis_hash_bytes()?;
		for (name, url) in [
			("services.registrar_url", &self.services.registrar_url),
			("services.kyc_url", &self.services.kyc_url),
			("services.anchor_url", &self.services.anchor_url),
		] {
			if !url.starts_with("http://") && !url.starts_with("https://") {
				return Err(ConfigError::Validation(format!(
					"{} must be an http(s) URL",
					name
				)));
			}
		}
		if self.monitoring.kyc_poll_interval_secs == 0
			|| self.monitoring.anchor_refresh_interval_secs == 0
		{
			return Err(ConfigError::Validation(
				"monitoring intervals must be non-zero".into(),
			));
		}
		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

/// Resolves `${VAR}` and `${VAR:-default}` placeholders.
fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("regex error: {e}")))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).expect("capture 0 always present");
		let var_name = cap.get(1).expect("capture 1 always present").as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"environment variable '{}' not found",
						var_name
					)))
				}
			},
		};
		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply in reverse order to keep byte positions valid.
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}
