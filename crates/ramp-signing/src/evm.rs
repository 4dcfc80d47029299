//! EVM signer: EIP-1559 call descriptors.
//!
//! EVM transactions arrive as call descriptors (to/data/value/gas plus
//! optional fee caps). Signing derives the ephemeral account from its
//! private key, builds an EIP-1559 transaction scoped to the network's
//! chain id and produces the EIP-2718 encoding the execution service can
//! broadcast as-is.

use crate::{ChainSigner, SigningError};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSignerSync;
use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use ramp_types::{ChainFamily, EphemeralAccount, EvmCallData, SignedTx, TxPayload, UnsignedTx};

/// Fee cap applied when the registration service did not pre-compute one.
const FALLBACK_FEE_PER_GAS: u128 = 187_500_000_000;

/// Signer for the EVM family.
pub struct EvmSigner;

impl EvmSigner {
	pub fn new() -> Self {
		Self
	}

	fn build_transaction(
		&self,
		tx: &UnsignedTx,
		call: &EvmCallData,
	) -> Result<TxEip1559, SigningError> {
		let chain_id = tx
			.network
			.evm_chain_id()
			.ok_or_else(|| SigningError::failed(tx, "network has no EVM chain id"))?;

		let to: Address = call
			.to
			.parse()
			.map_err(|e| SigningError::failed(tx, format!("target address: {e}")))?;
		let input: Bytes = call
			.data
			.parse()
			.map_err(|e| SigningError::failed(tx, format!("call data: {e}")))?;
		let value: U256 = call
			.value
			.parse()
			.map_err(|e| SigningError::failed(tx, format!("value: {e}")))?;
		let gas_limit: u64 = call
			.gas
			.parse()
			.map_err(|e| SigningError::failed(tx, format!("gas limit: {e}")))?;

		let parse_fee = |field: &Option<String>| -> Result<u128, SigningError> {
			match field {
				Some(raw) => raw
					.parse()
					.map_err(|e| SigningError::failed(tx, format!("fee cap: {e}"))),
				None => Ok(FALLBACK_FEE_PER_GAS),
			}
		};
		let max_fee_per_gas = parse_fee(&call.max_fee_per_gas)?;
		let max_priority_fee_per_gas = parse_fee(&call.max_priority_fee_per_gas)?;

		Ok(TxEip1559 {
			chain_id,
			nonce: tx.nonce,
			gas_limit,
			max_fee_per_gas,
			max_priority_fee_per_gas,
			to: TxKind::Call(to),
			value,
			access_list: Default::default(),
			input,
		})
	}
}

impl Default for EvmSigner {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ChainSigner for EvmSigner {
	fn family(&self) -> ChainFamily {
		ChainFamily::Evm
	}

	async fn sign(
		&self,
		tx: &UnsignedTx,
		key: &EphemeralAccount,
	) -> Result<SignedTx, SigningError> {
		let TxPayload::Evm(call) = &tx.tx_data else {
			return Err(SigningError::failed(tx, "payload is not a call descriptor"));
		};

		let signer: PrivateKeySigner = key
			.secret
			.with_exposed(|s| s.parse())
			.map_err(|e| SigningError::failed(tx, format!("private key: {e}")))?;

		let mut transaction = self.build_transaction(tx, call)?;
		let signature = signer
			.sign_transaction_sync(&mut transaction)
			.map_err(|e| SigningError::failed(tx, e.to_string()))?;

		let envelope = TxEnvelope::Eip1559(transaction.into_signed(signature));
		let encoded = format!("0x{}", hex::encode(envelope.encoded_2718()));

		Ok(SignedTx::from_unsigned(tx, encoded))
	}
}
