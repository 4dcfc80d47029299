//! Wiring from configuration to pipeline components.
//!
//! The embedding application supplies the wallet capability and picks the
//! storage backend; everything that is plain configuration (network
//! identities, service endpoints, poll cadence) is assembled here.

use ramp_config::{Config, ConfigError};
use ramp_services::{HttpAnchor, HttpKycService, HttpRegistrar};
use ramp_signing::{
	EphemeralSigningService, EvmSigner, StellarSigner, SubstrateChainContext, SubstrateSigner,
};
use std::time::Duration;

/// Builds the ephemeral signing service bound to the configured network
/// identities.
pub fn signing_service(config: &Config) -> Result<EphemeralSigningService, ConfigError> {
	let context = SubstrateChainContext {
		genesis_hash: config.substrate.genesis_hash_bytes()?,
		spec_version: config.substrate.spec_version,
		transaction_version: config.substrate.transaction_version,
	};
	Ok(EphemeralSigningService::new(
		StellarSigner::new(&config.stellar.network_passphrase),
		SubstrateSigner::new(context),
		EvmSigner::new(),
	))
}

/// Builds the HTTP client for the registration/execution service.
pub fn registrar(config: &Config) -> HttpRegistrar {
	HttpRegistrar::new(config.services.registrar_url.clone())
}

/// Builds the HTTP client for the KYC status service.
pub fn kyc_service(config: &Config) -> HttpKycService {
	HttpKycService::new(config.services.kyc_url.clone())
}

/// Builds the HTTP client for the anchor, carrying the session token once
/// the login challenge has been signed.
pub fn anchor(config: &Config, auth_token: Option<String>) -> HttpAnchor {
	HttpAnchor::new(config.services.anchor_url.clone(), auth_token)
}

/// The configured cadence of the KYC status poll.
pub fn kyc_poll_interval(config: &Config) -> Duration {
	Duration::from_secs(config.monitoring.kyc_poll_interval_secs)
}

/// The configured cadence of the anchor URL refresh.
pub fn anchor_refresh_interval(config: &Config) -> Duration {
	Duration::from_secs(config.monitoring.anchor_refresh_interval_secs)
}
