//! Chain-specific signing for the ramp pipeline.
//!
//! This crate turns the unsigned transactions returned by the registration
//! service into their signed encodings. Three signer variants cover the
//! three chain families (XDR envelopes on the payment ledger, SCALE
//! extrinsics on substrate chains, EIP-1559 descriptors on EVM chains),
//! the partitioner splits a flat transaction list into user-owned and
//! ephemeral-owned subsets, and the ephemeral signing service drives the
//! ephemeral side under the per-family ordering rules.

use async_trait::async_trait;
use ramp_types::{
	ChainFamily, EphemeralAccount, EphemeralAccountSet, Network, SignedTx, UnsignedTx,
};
use thiserror::Error;

pub mod evm;
pub mod partition;
pub mod stellar;
pub mod substrate;

pub use evm::EvmSigner;
pub use partition::{partition, Partitioned};
pub use stellar::StellarSigner;
pub use substrate::{SubstrateChainContext, SubstrateSigner};

/// Errors that can occur during signing operations.
///
/// A failure on any single transaction is fatal for the whole batch; the
/// orchestrator never submits a partially signed set.
#[derive(Debug, Error)]
pub enum SigningError {
	/// Decoding or signing a transaction failed.
	#[error("signing failed on {network} at nonce {nonce}: {reason}")]
	SigningFailed {
		network: Network,
		nonce: u64,
		reason: String,
	},
	/// A transaction was routed to a signer of the wrong family.
	#[error("transaction on {network} does not belong to the {family:?} family")]
	WrongFamily { network: Network, family: ChainFamily },
}

impl SigningError {
	/// Builds the batch-fatal failure for one transaction.
	pub fn failed(tx: &UnsignedTx, reason: impl Into<String>) -> Self {
		SigningError::SigningFailed {
			network: tx.network,
			nonce: tx.nonce,
			reason: reason.into(),
		}
	}
}

/// A signer for one chain family.
///
/// Implementations produce the signed encoding for a single transaction
/// given the matching ephemeral key material. Ordering constraints
/// (ascending sequence numbers on the payment ledger) are the caller's
/// responsibility, because signing mutates the signing account's sequence
/// state on chain, not in this process.
#[async_trait]
pub trait ChainSigner: Send + Sync {
	/// The chain family this signer covers.
	fn family(&self) -> ChainFamily;

	/// Signs one transaction with the given key material.
	async fn sign(
		&self,
		tx: &UnsignedTx,
		key: &EphemeralAccount,
	) -> Result<SignedTx, SigningError>;
}

/// Signs the ephemeral-owned side of a ramp.
///
/// Transactions are grouped by chain family. The payment-ledger subset is
/// signed strictly one at a time in ascending nonce order; the three
/// family groups run concurrently with respect to each other since they
/// touch unrelated accounts.
pub struct EphemeralSigningService {
	stellar: StellarSigner,
	substrate: SubstrateSigner,
	evm: EvmSigner,
}

impl EphemeralSigningService {
	pub fn new(stellar: StellarSigner, substrate: SubstrateSigner, evm: EvmSigner) -> Self {
		Self {
			stellar,
			substrate,
			evm,
		}
	}

	/// Signs every transaction in the ephemeral subset, returning the
	/// signed collection ordered by family and ascending nonce.
	pub async fn sign_all(
		&self,
		txs: &[UnsignedTx],
		ephemerals: &EphemeralAccountSet,
	) -> Result<Vec<SignedTx>, SigningError> {
		let mut stellar_txs = Vec::new();
		let mut substrate_txs = Vec::new();
		let mut evm_txs = Vec::new();
		for tx in txs {
			match tx.network.family() {
				ChainFamily::Stellar => stellar_txs.push(tx.clone()),
				ChainFamily::Substrate => substrate_txs.push(tx.clone()),
				ChainFamily::Evm => evm_txs.push(tx.clone()),
			}
		}

		// Sequence numbers on the payment ledger invalidate if signed out
		// of order; nonce order is kept on the other families as well.
		stellar_txs.sort_by_key(|tx| tx.nonce);
		substrate_txs.sort_by_key(|tx| tx.nonce);
		evm_txs.sort_by_key(|tx| tx.nonce);

		let stellar_signed = self.sign_family(&self.stellar, stellar_txs, &ephemerals.stellar);
		let substrate_signed =
			self.sign_family(&self.substrate, substrate_txs, &ephemerals.substrate);
		let evm_signed = self.sign_family(&self.evm, evm_txs, &ephemerals.evm);

		let (mut signed, substrate_signed, evm_signed) =
			tokio::try_join!(stellar_signed, substrate_signed, evm_signed)?;
		signed.extend(substrate_signed);
		signed.extend(evm_signed);

		Ok(signed)
	}

	/// Signs one family's transactions sequentially in the given order.
	async fn sign_family(
		&self,
		signer: &dyn ChainSigner,
		txs: Vec<UnsignedTx>,
		key: &EphemeralAccount,
	) -> Result<Vec<SignedTx>, SigningError> {
		let mut signed = Vec::with_capacity(txs.len());
		for tx in &txs {
			if tx.network.family() != signer.family() {
				return Err(SigningError::WrongFamily {
					network: tx.network,
					family: signer.family(),
				});
			}
			tracing::debug!(
				network = %tx.network,
				nonce = tx.nonce,
				phase = %tx.phase,
				"Signing ephemeral transaction"
			);
			signed.push(signer.sign(tx, key).await?);
		}
		Ok(signed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ramp_types::{PhaseTag, TxPayload};
	use substrate_stellar_sdk::types::Preconditions;
	use substrate_stellar_sdk::{
		Asset, Operation, SecretKey, StroopAmount, Transaction, XdrCodec,
	};

	fn unsigned(network: Network, nonce: u64) -> UnsignedTx {
		UnsignedTx {
			network,
			signer: "ephemeral".into(),
			nonce,
			phase: PhaseTag::NablaSwap,
			tx_data: TxPayload::StellarEnvelope("AAAA".into()),
		}
	}

	fn stellar_tx(account: &EphemeralAccount, sequence: i64) -> UnsignedTx {
		let source = SecretKey::from_encoding(account.secret.expose())
			.unwrap()
			.get_public()
			.clone();
		let mut tx = Transaction::new(
			source.clone(),
			sequence,
			Some(100),
			Preconditions::PrecondNone,
			None,
		)
		.unwrap();
		tx.append_operation(
			Operation::new_payment(source, Asset::AssetTypeNative, StroopAmount(100)).unwrap(),
		)
		.unwrap();
		UnsignedTx {
			network: Network::Stellar,
			signer: account.address.clone(),
			nonce: sequence as u64,
			phase: PhaseTag::StellarPayment,
			tx_data: TxPayload::StellarEnvelope(
				String::from_utf8(tx.into_transaction_envelope().to_base64_xdr()).unwrap(),
			),
		}
	}

	#[tokio::test]
	async fn test_payment_ledger_batch_is_signed_in_sequence_order() {
		let service = EphemeralSigningService::new(
			StellarSigner::new("Test SDF Network ; September 2015"),
			SubstrateSigner::new(SubstrateChainContext::default()),
			EvmSigner::new(),
		);
		let ephemerals = ramp_keys::create_ephemeral_set().unwrap();

		// Handed over shuffled; signing must observe ascending order.
		let txs = vec![
			stellar_tx(&ephemerals.stellar, 2),
			stellar_tx(&ephemerals.stellar, 0),
			stellar_tx(&ephemerals.stellar, 1),
		];
		let signed = service.sign_all(&txs, &ephemerals).await.unwrap();
		let nonces: Vec<_> = signed.iter().map(|tx| tx.nonce).collect();
		assert_eq!(nonces, vec![0, 1, 2]);
	}

	#[tokio::test]
	async fn test_wrong_payload_is_batch_fatal() {
		let service = EphemeralSigningService::new(
			StellarSigner::new("Test SDF Network ; September 2015"),
			SubstrateSigner::new(SubstrateChainContext::default()),
			EvmSigner::new(),
		);
		let ephemerals = ramp_keys::create_ephemeral_set().unwrap();

		// A substrate-tagged transaction carrying an envelope payload
		// must fail signing and carry the offending coordinates.
		let tx = unsigned(Network::Pendulum, 3);
		let err = service.sign_all(&[tx], &ephemerals).await.unwrap_err();
		match err {
			SigningError::SigningFailed { network, nonce, .. } => {
				assert_eq!(network, Network::Pendulum);
				assert_eq!(nonce, 3);
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}
}
