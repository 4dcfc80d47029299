//! Unsigned and signed transaction descriptors.
//!
//! The registration service returns a flat list of unsigned transactions
//! covering the whole cross-chain route. Payloads are network-specific:
//! an XDR envelope for the payment ledger, a SCALE-encoded extrinsic for
//! substrate chains, and a call descriptor for EVM chains. Signing
//! replaces the payload with its signed encoding but keeps the identity
//! fields untouched.

use crate::{Network, PhaseTag};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A transaction hash as returned by a wallet or chain client.
pub type TxHash = String;

/// EVM call descriptor as produced by the registration service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmCallData {
	/// Target contract address.
	pub to: String,
	/// ABI-encoded call data, 0x-prefixed hex.
	pub data: String,
	/// Native value to attach, as a decimal string.
	pub value: String,
	/// Gas limit, as a decimal string.
	pub gas: String,
	/// Max fee per gas in wei, when the service pre-computed one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_fee_per_gas: Option<String>,
	/// Max priority fee per gas in wei.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_priority_fee_per_gas: Option<String>,
}

/// Network-specific transaction payload.
///
/// The wire format carries either a JSON object (EVM call descriptor) or a
/// string: 0x-prefixed hex is a substrate extrinsic, anything else is a
/// base64 XDR envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
	/// Base64-encoded XDR transaction envelope.
	StellarEnvelope(String),
	/// Hex-encoded unsigned extrinsic.
	SubstrateExtrinsic(String),
	/// EVM call descriptor.
	Evm(EvmCallData),
}

impl TxPayload {
	pub fn is_evm(&self) -> bool {
		matches!(self, TxPayload::Evm(_))
	}
}

impl Serialize for TxPayload {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			TxPayload::StellarEnvelope(s) | TxPayload::SubstrateExtrinsic(s) => {
				serializer.serialize_str(s)
			}
			TxPayload::Evm(call) => call.serialize(serializer),
		}
	}
}

impl<'de> Deserialize<'de> for TxPayload {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Evm(EvmCallData),
			Text(String),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Evm(call) => Ok(TxPayload::Evm(call)),
			Raw::Text(s) if s.starts_with("0x") => Ok(TxPayload::SubstrateExtrinsic(s)),
			Raw::Text(s) => Ok(TxPayload::StellarEnvelope(s)),
		}
	}
}

/// An unsigned transaction as returned by the registration service.
///
/// Read-only: the pipeline never fabricates or mutates these, it only
/// classifies and signs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
	/// Network the transaction executes on.
	pub network: Network,
	/// Declared owner address that must produce the signature.
	pub signer: String,
	/// Account nonce (sequence number on the payment ledger).
	pub nonce: u64,
	/// Route step this transaction performs.
	pub phase: PhaseTag,
	/// Network-specific payload.
	pub tx_data: TxPayload,
}

/// A signed transaction ready for submission by the execution service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTx {
	/// Network the transaction executes on.
	pub network: Network,
	/// Address whose key produced the signature.
	pub signer: String,
	/// Account nonce (sequence number on the payment ledger).
	pub nonce: u64,
	/// Route step this transaction performs.
	pub phase: PhaseTag,
	/// Signed encoding of the payload.
	pub tx_data: String,
}

impl SignedTx {
	/// Builds the signed counterpart of an unsigned transaction.
	pub fn from_unsigned(tx: &UnsignedTx, signed_data: String) -> Self {
		Self {
			network: tx.network,
			signer: tx.signer.clone(),
			nonce: tx.nonce,
			phase: tx.phase,
			tx_data: signed_data,
		}
	}
}
