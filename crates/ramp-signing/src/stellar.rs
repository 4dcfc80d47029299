//! Payment-ledger signer: XDR transaction envelopes.
//!
//! The registration service delivers payment-ledger transactions as
//! base64-encoded XDR envelopes already bound to the ephemeral account's
//! sequence numbers. Signing decodes the envelope, applies the ephemeral
//! keypair signature under the configured network identity and re-encodes
//! to the same envelope format.

use crate::{ChainSigner, SigningError};
use async_trait::async_trait;
use ramp_types::{ChainFamily, EphemeralAccount, SignedTx, TxPayload, UnsignedTx};
use substrate_stellar_sdk::network::Network as NetworkIdentity;
use substrate_stellar_sdk::{SecretKey, TransactionEnvelope, XdrCodec};

/// Signer for the payment-ledger family.
///
/// Must be invoked on one account's transactions strictly in ascending
/// sequence order; the ephemeral signing service enforces that ordering.
pub struct StellarSigner {
	network: NetworkIdentity,
}

impl StellarSigner {
	/// Creates a signer bound to the given network passphrase.
	pub fn new(passphrase: &str) -> Self {
		Self {
			network: NetworkIdentity::new(passphrase.as_bytes()),
		}
	}
}

#[async_trait]
impl ChainSigner for StellarSigner {
	fn family(&self) -> ChainFamily {
		ChainFamily::Stellar
	}

	async fn sign(
		&self,
		tx: &UnsignedTx,
		key: &EphemeralAccount,
	) -> Result<SignedTx, SigningError> {
		let TxPayload::StellarEnvelope(xdr) = &tx.tx_data else {
			return Err(SigningError::failed(
				tx,
				"payload is not a transaction envelope",
			));
		};

		let mut envelope = TransactionEnvelope::from_base64_xdr(xdr.as_bytes())
			.map_err(|e| SigningError::failed(tx, format!("envelope decode: {e:?}")))?;

		let secret = key
			.secret
			.with_exposed(|s| SecretKey::from_encoding(s))
			.map_err(|e| SigningError::failed(tx, format!("secret decode: {e:?}")))?;

		envelope
			.sign(&self.network, vec![&secret])
			.map_err(|e| SigningError::failed(tx, format!("envelope sign: {e:?}")))?;

		let signed = String::from_utf8(envelope.to_base64_xdr())
			.map_err(|e| SigningError::failed(tx, e.to_string()))?;

		Ok(SignedTx::from_unsigned(tx, signed))
	}
}
