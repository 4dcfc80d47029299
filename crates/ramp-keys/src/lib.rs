//! Ephemeral key factory for the ramp pipeline.
//!
//! Every ramp attempt is signed by single-use accounts created here, one
//! per chain family: an ed25519 keypair for the payment ledger, an sr25519
//! keypair for the substrate chains and a secp256k1 keypair for the EVM
//! chains. Generation is pure and local; the only failure mode is the
//! entropy source, which is fatal and never retried. Every call returns
//! fresh, unrelated material.

use alloy_signer_local::PrivateKeySigner;
use ramp_types::{EphemeralAccount, EphemeralAccountSet, SecretString};
use rand::rngs::OsRng;
use rand::RngCore;
use sp_core::crypto::{Ss58AddressFormat, Ss58Codec};
use sp_core::sr25519;
use sp_core::Pair as _;
use substrate_stellar_sdk::SecretKey as StellarSecretKey;
use thiserror::Error;

/// SS58 prefix the substrate ephemeral address is rendered under. The
/// registration service accepts any prefix; comparisons downstream are
/// prefix-agnostic.
const SUBSTRATE_SS58_PREFIX: u16 = 56;

/// Errors that can occur while generating ephemeral key material.
#[derive(Debug, Error)]
pub enum KeyError {
	/// The system entropy source failed. Fatal; do not retry.
	#[error("entropy source failure: {0}")]
	Entropy(String),
	/// Freshly drawn bytes were rejected by a key algorithm.
	#[error("invalid key material: {0}")]
	InvalidKey(String),
}

/// Draws 32 bytes from the system entropy source.
fn fresh_seed() -> Result<[u8; 32], KeyError> {
	let mut seed = [0u8; 32];
	OsRng
		.try_fill_bytes(&mut seed)
		.map_err(|e| KeyError::Entropy(e.to_string()))?;
	Ok(seed)
}

/// Creates a fresh payment-ledger (Stellar) ephemeral account.
///
/// The secret is the `S…` strkey seed, the address the `G…` strkey of the
/// derived public key.
pub fn create_stellar_ephemeral() -> Result<EphemeralAccount, KeyError> {
	let secret = StellarSecretKey::from_binary(fresh_seed()?);
	let address = String::from_utf8(secret.get_public().to_encoding())
		.map_err(|e| KeyError::InvalidKey(e.to_string()))?;
	let encoded = String::from_utf8(secret.to_encoding())
		.map_err(|e| KeyError::InvalidKey(e.to_string()))?;

	Ok(EphemeralAccount {
		secret: SecretString::new(encoded),
		address,
	})
}

/// Creates a fresh substrate ephemeral account.
///
/// The secret is the 0x-prefixed sr25519 mini secret, the address the SS58
/// encoding of the derived public key.
pub fn create_substrate_ephemeral() -> Result<EphemeralAccount, KeyError> {
	let seed = fresh_seed()?;
	let pair = sr25519::Pair::from_seed_slice(&seed)
		.map_err(|e| KeyError::InvalidKey(format!("{:?}", e)))?;
	let address = pair
		.public()
		.to_ss58check_with_version(Ss58AddressFormat::custom(SUBSTRATE_SS58_PREFIX));

	Ok(EphemeralAccount {
		secret: SecretString::new(format!("0x{}", hex::encode(seed))),
		address,
	})
}

/// Creates a fresh EVM ephemeral account.
///
/// The secret is the 0x-prefixed secp256k1 private key, the address the
/// checksummed 0x account address.
pub fn create_evm_ephemeral() -> Result<EphemeralAccount, KeyError> {
	let seed = fresh_seed()?;
	let signer =
		PrivateKeySigner::from_slice(&seed).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
	let address = signer.address().to_string();

	Ok(EphemeralAccount {
		secret: SecretString::new(format!("0x{}", hex::encode(seed))),
		address,
	})
}

/// Creates the full per-ramp ephemeral account set, one fresh account per
/// chain family.
pub fn create_ephemeral_set() -> Result<EphemeralAccountSet, KeyError> {
	Ok(EphemeralAccountSet {
		stellar: create_stellar_ephemeral()?,
		substrate: create_substrate_ephemeral()?,
		evm: create_evm_ephemeral()?,
	})
}
