//! Connected-wallet capability.
//!
//! The pipeline never holds the user's keys; it asks the embedding
//! application's wallet for signatures. Wallet interactions are
//! user-paced: a call may block on a confirmation dialog, and the user
//! declining is an expected outcome, not a transport failure.

use async_trait::async_trait;
use ramp_types::{TxHash, UnsignedTx};
use thiserror::Error;

/// Errors from wallet interactions.
#[derive(Debug, Error)]
pub enum WalletError {
	/// The user declined the signature request.
	#[error("signature request rejected by user")]
	Rejected,
	/// No wallet is connected.
	#[error("no wallet connected")]
	NotConnected,
	/// The wallet cannot sign this kind of transaction.
	#[error("unsupported transaction: {0}")]
	Unsupported(String),
	/// The wallet or its node connection failed.
	#[error("wallet error: {0}")]
	Other(String),
}

/// Signing capability of the connected user wallet.
///
/// Implemented by the embedding application; the pipeline only requires
/// that submissions return the resulting transaction hash.
#[async_trait]
pub trait WalletCapability: Send + Sync {
	/// The connected address, if any.
	async fn address(&self) -> Option<String>;

	/// Signs and submits an EVM transaction, returning its hash once
	/// confirmed.
	async fn sign_and_submit_evm(&self, tx: &UnsignedTx) -> Result<TxHash, WalletError>;

	/// Signs and submits a substrate extrinsic, returning its hash once
	/// finalized.
	async fn sign_and_submit_substrate(&self, tx: &UnsignedTx) -> Result<TxHash, WalletError>;

	/// Signs an arbitrary payload (login challenges on non-EVM chains).
	async fn sign_raw(&self, payload: &[u8]) -> Result<Vec<u8>, WalletError>;
}
