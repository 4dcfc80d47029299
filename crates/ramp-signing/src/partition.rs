//! Splits a registered ramp's transactions by signing owner.
//!
//! Every transaction declares the address that must sign it. Comparing
//! that address against the connected wallet decides whether the wallet or
//! the per-ramp ephemeral keys produce the signature. Comparison goes
//! through the network-aware normalization so a substrate wallet rendered
//! under a different SS58 prefix still matches.

use ramp_types::{addresses_equivalent, UnsignedTx};

/// The two signing-owner subsets of a registered ramp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitioned {
	/// Transactions the connected wallet must sign, ascending by nonce.
	pub user_txs: Vec<UnsignedTx>,
	/// Transactions the ephemeral keys sign, ascending by nonce.
	pub ephemeral_txs: Vec<UnsignedTx>,
}

/// Partitions transactions into user-owned and ephemeral-owned subsets.
///
/// With no wallet connected yet every transaction classifies as
/// ephemeral, so ephemeral-side preparation can start while the user
/// connects. With a wallet address present, classification is exact.
pub fn partition(txs: &[UnsignedTx], wallet_address: Option<&str>) -> Partitioned {
	let mut partitioned = Partitioned::default();

	for tx in txs {
		let user_owned = match wallet_address {
			Some(wallet) => addresses_equivalent(tx.network, &tx.signer, wallet),
			None => false,
		};
		if user_owned {
			partitioned.user_txs.push(tx.clone());
		} else {
			partitioned.ephemeral_txs.push(tx.clone());
		}
	}

	partitioned.user_txs.sort_by_key(|tx| tx.nonce);
	partitioned.ephemeral_txs.sort_by_key(|tx| tx.nonce);
	partitioned
}
