//! Ephemeral account material generated per ramp attempt.
//!
//! Each ramp attempt gets exactly one fresh account per chain family. The
//! secrets live in memory for the duration of the attempt only; the
//! `SecretString` wrapper keeps them out of logs and persisted state.

use crate::{ChainFamily, Network, SecretString};
use serde::{Deserialize, Serialize};

/// Single-use key material for one chain family.
#[derive(Debug, Clone)]
pub struct EphemeralAccount {
	/// Family-specific secret encoding: an `S…` strkey seed, a 0x-prefixed
	/// sr25519 mini secret, or a 0x-prefixed EVM private key.
	pub secret: SecretString,
	/// Derived public address in the family's canonical encoding.
	pub address: String,
}

/// One ephemeral account per chain family involved in a ramp.
#[derive(Debug, Clone)]
pub struct EphemeralAccountSet {
	pub stellar: EphemeralAccount,
	pub substrate: EphemeralAccount,
	pub evm: EphemeralAccount,
}

/// A signing account advertised to the registration service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningAccount {
	pub address: String,
	pub network: Network,
}

impl EphemeralAccountSet {
	/// Returns the account for the given chain family.
	pub fn for_family(&self, family: ChainFamily) -> &EphemeralAccount {
		match family {
			ChainFamily::Stellar => &self.stellar,
			ChainFamily::Substrate => &self.substrate,
			ChainFamily::Evm => &self.evm,
		}
	}

	/// The signing-account list sent with a registration request, one
	/// entry per ephemeral chain.
	pub fn signing_accounts(&self) -> Vec<SigningAccount> {
		vec![
			SigningAccount {
				address: self.stellar.address.clone(),
				network: Network::Stellar,
			},
			SigningAccount {
				address: self.substrate.address.clone(),
				network: Network::Pendulum,
			},
			SigningAccount {
				address: self.evm.address.clone(),
				network: Network::Moonbeam,
			},
		]
	}
}
