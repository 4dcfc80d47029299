//! Networks and chain families.
//!
//! The registration service returns transactions tagged with the network
//! they execute on. Signing procedures, address formats and ordering rules
//! are decided per chain family, so every network maps to exactly one of
//! the three families handled by the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A blockchain network a ramp transaction can execute on.
///
/// Serialized as the lowercase wire name used by the registration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
	Stellar,
	Pendulum,
	Assethub,
	Moonbeam,
	Polygon,
	Ethereum,
	Arbitrum,
	Base,
	Avalanche,
	Bsc,
}

/// The signing procedure family a network belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
	/// Account-model payment ledger with XDR transaction envelopes and
	/// strictly ordered sequence numbers.
	Stellar,
	/// Substrate-style chains with SCALE-encoded extrinsics and SS58
	/// addresses.
	Substrate,
	/// EVM chains with EIP-1559 call descriptors.
	Evm,
}

impl Network {
	/// Returns the chain family that decides how transactions on this
	/// network are signed.
	pub fn family(&self) -> ChainFamily {
		match self {
			Network::Stellar => ChainFamily::Stellar,
			Network::Pendulum | Network::Assethub => ChainFamily::Substrate,
			Network::Moonbeam
			| Network::Polygon
			| Network::Ethereum
			| Network::Arbitrum
			| Network::Base
			| Network::Avalanche
			| Network::Bsc => ChainFamily::Evm,
		}
	}

	/// Returns the EVM chain id, or `None` for non-EVM networks.
	pub fn evm_chain_id(&self) -> Option<u64> {
		match self {
			Network::Ethereum => Some(1),
			Network::Bsc => Some(56),
			Network::Polygon => Some(137),
			Network::Moonbeam => Some(1284),
			Network::Base => Some(8453),
			Network::Arbitrum => Some(42161),
			Network::Avalanche => Some(43114),
			_ => None,
		}
	}

	/// Returns the SS58 address prefix, or `None` for non-substrate
	/// networks.
	pub fn ss58_prefix(&self) -> Option<u16> {
		match self {
			Network::Assethub => Some(0),
			Network::Pendulum => Some(56),
			_ => None,
		}
	}

	/// The lowercase wire name of this network.
	pub fn as_str(&self) -> &'static str {
		match self {
			Network::Stellar => "stellar",
			Network::Pendulum => "pendulum",
			Network::Assethub => "assethub",
			Network::Moonbeam => "moonbeam",
			Network::Polygon => "polygon",
			Network::Ethereum => "ethereum",
			Network::Arbitrum => "arbitrum",
			Network::Base => "base",
			Network::Avalanche => "avalanche",
			Network::Bsc => "bsc",
		}
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
