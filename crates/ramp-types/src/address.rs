//! Address normalization for cross-chain signer comparison.
//!
//! The registration service reports each transaction's signer in the
//! address encoding of its network, while the connected wallet reports its
//! address in whatever encoding the wallet uses. Substrate addresses in
//! particular differ per network prefix for the same public key, so both
//! sides are re-encoded to a canonical form before comparison. The
//! equivalence rule lives here, in one place, so it can be tested without
//! going through the partitioner.

use crate::{ChainFamily, Network};
use sp_core::crypto::{AccountId32, Ss58AddressFormat, Ss58Codec};

/// Canonical SS58 prefix used for comparisons across substrate networks.
const CANONICAL_SS58_PREFIX: u16 = 0;

/// A network-independent comparison key for an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedKey(String);

impl NormalizedKey {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Normalizes an address into the comparison key for the given network.
///
/// EVM addresses compare case-insensitively, substrate addresses are
/// re-encoded to a fixed SS58 prefix, payment-ledger addresses compare
/// verbatim (strkeys have a single canonical form). An address that does
/// not parse under its network's encoding keeps its verbatim form: it can
/// still equal an identically malformed counterpart but never a valid one.
pub fn normalized_signer_key(network: Network, address: &str) -> NormalizedKey {
	match network.family() {
		ChainFamily::Evm => NormalizedKey(address.to_ascii_lowercase()),
		ChainFamily::Substrate => NormalizedKey(reencode_ss58(address)),
		ChainFamily::Stellar => NormalizedKey(address.to_string()),
	}
}

/// Whether two addresses denote the same signer on the given network.
pub fn addresses_equivalent(network: Network, a: &str, b: &str) -> bool {
	normalized_signer_key(network, a) == normalized_signer_key(network, b)
}

fn reencode_ss58(address: &str) -> String {
	match AccountId32::from_ss58check_with_version(address) {
		Ok((account, _format)) => {
			account.to_ss58check_with_version(Ss58AddressFormat::custom(CANONICAL_SS58_PREFIX))
		}
		Err(_) => address.to_string(),
	}
}
